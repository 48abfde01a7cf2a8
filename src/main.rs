mod api;
mod audit;
mod auth;
mod bootstrap;
mod compensation;
mod config;
mod entries;
mod error;
mod middleware;
mod owners;
mod payments;
mod server;
mod summary;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,parkvisit_backend=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting visitor parking backend");

    dotenv::dotenv().ok();
    let config = config::Config::from_env();
    let bind_address = config.bind_address.clone();

    // The sweeper handle must outlive the server so the session sweep task
    // keeps running; it aborts when this binding drops.
    let (state, _session_sweeper) = bootstrap::initialize_app_state(config).await?;

    let app = server::create_app(state).await;
    server::run_server(app, &bind_address).await?;

    Ok(())
}
