use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    api::handler::AppState, audit::AuditRepository, auth::AuthRepository,
    compensation::CompensationRepository, config::Config, entries::EntryRepository,
    error::AppResult, owners::OwnerRepository, payments::PaymentRepository,
    summary::SummaryCache,
};

/// Pending-summary cache TTL; short because guards act on fresh numbers.
const SUMMARY_CACHE_TTL_MS: i64 = 5_000;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Owns the background task that deletes expired sessions. The task runs for
/// as long as this handle lives; dropping it aborts the loop.
pub struct SessionSweeper {
    handle: JoinHandle<()>,
}

impl SessionSweeper {
    pub fn spawn(auth: Arc<AuthRepository>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                match auth.delete_expired_sessions().await {
                    Ok(count) => {
                        if count > 0 {
                            info!("Swept {} expired sessions", count);
                        }
                    }
                    Err(e) => error!("Failed to sweep expired sessions: {:?}", e),
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for SessionSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn initialize_app_state(config: Config) -> AppResult<(AppState, SessionSweeper)> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    let audit = Arc::new(AuditRepository::new(pool.clone()));
    let owners = Arc::new(OwnerRepository::new(pool.clone(), audit.clone()));
    let entries = Arc::new(EntryRepository::new(pool.clone(), audit.clone()));
    let payments = Arc::new(PaymentRepository::new(pool.clone(), audit.clone()));
    let compensations = Arc::new(CompensationRepository::new(pool.clone(), audit.clone()));
    let auth = Arc::new(AuthRepository::new(pool.clone(), audit.clone()));

    let summary_cache = Arc::new(SummaryCache::new(SUMMARY_CACHE_TTL_MS));
    info!("Pending-summary cache initialized ({}ms TTL)", SUMMARY_CACHE_TTL_MS);

    let state = AppState {
        owners,
        entries,
        payments,
        compensations,
        auth: auth.clone(),
        audit,
        summary_cache,
        config,
    };

    // Expired sessions are swept by a task owned here, not by module-level
    // timer state: the caller holds the sweeper for the server's lifetime.
    let sweeper = SessionSweeper::spawn(auth, SESSION_SWEEP_INTERVAL);
    info!("Session sweeper task started (hourly)");

    Ok((state, sweeper))
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(50)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_repositories() -> Arc<AuthRepository> {
        // connect_lazy defers the connection, so no database is needed here.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();
        let audit = Arc::new(AuditRepository::new(pool.clone()));
        Arc::new(AuthRepository::new(pool, audit))
    }

    #[tokio::test]
    async fn sweeper_survives_sweep_failures() {
        let sweeper = SessionSweeper::spawn(lazy_repositories(), Duration::from_millis(10));

        // Several sweep attempts fail against the unreachable database; the
        // loop must log and keep running rather than exit.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!sweeper.is_finished());

        sweeper.shutdown();
    }

    #[tokio::test]
    async fn dropping_sweeper_aborts_task() {
        let sweeper = SessionSweeper::spawn(lazy_repositories(), Duration::from_secs(3600));
        assert!(!sweeper.is_finished());
        drop(sweeper);
    }
}
