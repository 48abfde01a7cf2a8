pub mod handlers;
pub mod matcher;
pub mod models;
pub mod repository;

pub use matcher::{find_exact_combination, ExactMatch, FeeCandidate};
pub use repository::CompensationRepository;
