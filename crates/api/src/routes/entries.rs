//! Route definitions for the `/entries` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::entries;
use crate::state::AppState;

/// Routes mounted at `/entries`.
///
/// ```text
/// GET    /        -> list
/// GET    /{id}    -> get_by_id
/// DELETE /{id}    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entries::list))
        .route("/{id}", get(entries::get_by_id).delete(entries::delete))
}
