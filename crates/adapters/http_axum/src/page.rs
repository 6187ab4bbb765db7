//! Panel page rendering.
//!
//! `index.html` may carry `%TOKEN%` placeholders, one per binary mode, which
//! are replaced with the mode's current label (`%STATE%` becomes `ON` or
//! `OFF`). Placeholders that name no declared mode are left as they are.

use axum::extract::State;
use axum::response::Html;

use iopanel_app::ports::OutputDriver;
use iopanel_domain::entity::ControllableEntity;

use crate::error::ApiError;
use crate::state::AppState;

const INDEX: &str = "index.html";

/// `GET /`: the panel page with current mode labels filled in.
pub async fn index<D: OutputDriver + 'static>(
    State(state): State<AppState<D>>,
) -> Result<Html<String>, ApiError> {
    let template = tokio::fs::read_to_string(state.assets().join(INDEX)).await?;
    let entities = state.registry().snapshot();
    Ok(Html(render(&template, &entities)))
}

/// Replace every `%TOKEN%` naming a binary mode with that mode's label.
#[must_use]
pub fn render(template: &str, entities: &[ControllableEntity]) -> String {
    entities
        .iter()
        .filter_map(|entity| match entity {
            ControllableEntity::Mode(mode) => Some(mode),
            _ => None,
        })
        .fold(template.to_string(), |page, mode| {
            page.replace(&format!("%{}%", mode.token), mode.label())
        })
}
