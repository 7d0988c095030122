pub mod health;
pub mod sessions;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::signaling::server::router())
        .nest("/api", sessions::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, sessions::list_public_sessions),
    components(schemas(
        health::HealthResponse,
        crate::sessions::session::PublicSession,
    )),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Sessions", description = "Public session discovery"),
    )
)]
pub struct ApiDoc;
