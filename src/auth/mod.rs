pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod tokens;

pub use repository::AuthRepository;
