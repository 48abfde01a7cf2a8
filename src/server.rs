use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{get_owner_report, health_check, AppState},
    audit::handlers::list_audit_events,
    auth::handlers::{create_user, deactivate_user, list_users, login, logout},
    auth::middleware::require_auth,
    compensation::handlers::{apply_compensation, get_compensation, list_owner_compensations},
    entries::handlers::{
        get_entry, get_pending_summary, list_owner_entries, mark_entry_exit, register_entry,
    },
    middleware::{create_cors_layer, rate_limit::login_rate_limit_middleware, LoginRateLimit},
    owners::handlers::{create_owner, deactivate_owner, get_owner, list_owners, update_owner},
    payments::handlers::{collect_payment, get_payment, list_owner_payments},
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let login_limit = Arc::new(LoginRateLimit::new(state.config.login_rate_limit_per_minute));

    // Everything under /api/v1 except login requires a valid session
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        // User management (admin)
        .route("/users", post(create_user).get(list_users))
        .route("/users/:user_id/deactivate", post(deactivate_user))
        // Co-owner endpoints
        .route("/owners", post(create_owner).get(list_owners))
        .route(
            "/owners/:owner_id",
            get(get_owner).put(update_owner).delete(deactivate_owner),
        )
        // Vehicle entry / fee record endpoints
        .route("/entries", post(register_entry))
        .route("/entries/:entry_id", get(get_entry))
        .route("/entries/:entry_id/exit", post(mark_entry_exit))
        .route("/entries/owner/:owner_id", get(list_owner_entries))
        .route("/entries/owner/:owner_id/summary", get(get_pending_summary))
        // Payment collection endpoints
        .route("/payments", post(collect_payment))
        .route("/payments/:payment_id", get(get_payment))
        .route("/payments/owner/:owner_id", get(list_owner_payments))
        // Compensation endpoints (exact subset matching)
        .route("/compensations", post(apply_compensation))
        .route("/compensations/:compensation_id", get(get_compensation))
        .route("/compensations/owner/:owner_id", get(list_owner_compensations))
        // Reports
        .route("/reports/owner/:owner_id", get(get_owner_report))
        // Audit trail (admin)
        .route("/audit", get(list_audit_events))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let login_routes = Router::new()
        .route("/auth/login", post(login))
        .route_layer(from_fn_with_state(login_limit, login_rate_limit_middleware));

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", protected.merge(login_routes))
        .layer(CompressionLayer::new())
        .layer(create_cors_layer())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
