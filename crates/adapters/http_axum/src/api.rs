//! Read-only JSON and SSE handlers mounted under `/api`.

#[allow(clippy::missing_errors_doc)]
pub mod entities;
pub mod sse;

use axum::Router;
use axum::routing::get;

use iopanel_app::ports::OutputDriver;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<D: OutputDriver + 'static>() -> Router<AppState<D>> {
    Router::new()
        .route("/entities", get(entities::list::<D>))
        .route("/entities/{kind}/{id}", get(entities::get::<D>))
        .route("/feedback/stream", get(sse::stream::<D>))
}
