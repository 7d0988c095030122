//! Public session discovery.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::sessions::session::PublicSession;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sessions/public", get(list_public_sessions))
}

#[utoipa::path(
    get,
    path = "/api/sessions/public",
    tag = "Sessions",
    responses(
        (status = 200, description = "Currently discoverable sessions", body = [PublicSession]),
    ),
)]
pub async fn list_public_sessions(State(state): State<AppState>) -> Json<Vec<PublicSession>> {
    Json(state.registry.list_public())
}
