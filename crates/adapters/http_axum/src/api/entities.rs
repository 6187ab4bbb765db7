//! JSON snapshot of the output registry.

use axum::Json;
use axum::extract::{Path, State};

use iopanel_app::ports::OutputDriver;
use iopanel_domain::entity::{ControllableEntity, EntityKey, EntityKind};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/entities`: every entity in full-sync order.
pub async fn list<D: OutputDriver + 'static>(
    State(state): State<AppState<D>>,
) -> Json<Vec<ControllableEntity>> {
    Json(state.registry().snapshot())
}

/// `GET /api/entities/{kind}/{id}`
pub async fn get<D: OutputDriver + 'static>(
    State(state): State<AppState<D>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ControllableEntity>, ApiError> {
    let kind: EntityKind = kind
        .parse()
        .map_err(|()| ApiError::NotFound(format!("unknown entity kind `{kind}`")))?;
    let key = EntityKey::parse(kind, &id)
        .ok_or_else(|| ApiError::NotFound(format!("`{id}` is not a valid {kind} id")))?;
    let entity = state.registry().get(&key)?;
    Ok(Json(entity))
}
