//! Handlers for the `/entries` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use newsreel_core::error::CoreError;
use newsreel_core::types::DbId;
use newsreel_db::models::entry::EntryRecord;
use newsreel_db::repositories::EntryRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /entries
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<EntryRecord>>> {
    let entries = EntryRepo::list(&state.pool).await?;
    Ok(Json(entries))
}

/// GET /entries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<EntryRecord>> {
    let entry = EntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Entry",
            id,
        }))?;
    Ok(Json(entry))
}

/// DELETE /entries/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let deleted = EntryRepo::delete(&state.pool, id).await?;
    if deleted {
        tracing::info!(id, "Entry deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Entry",
            id,
        }))
    }
}
