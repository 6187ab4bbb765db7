//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use iopanel_app::ports::OutputDriver;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the sync socket at `/ws`, the read-only API under `/api`, the
/// rendered panel page at `/`, and serves every other path from the assets
/// directory. Includes a [`TraceLayer`] that logs each HTTP request/response
/// at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<D: OutputDriver + 'static>(state: AppState<D>) -> Router {
    let assets = ServeDir::new(state.assets());
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(crate::ws::upgrade::<D>))
        .route("/", get(crate::page::index::<D>))
        .nest("/api", crate::api::routes::<D>())
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
