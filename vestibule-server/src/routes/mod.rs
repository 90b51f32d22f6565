use crate::{
    handlers::{queue, waiting_room},
    infra::app_state::AppState,
};
use axum::{Router, routing::get};

/// Assemble the full application router: the waiting-room page, the queue
/// API, and liveness.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/waiting-room", get(waiting_room::waiting_room))
        .route("/healthz", get(healthz))
        .nest("/api/v1/queue", create_queue_router())
        .with_state(state)
}

fn create_queue_router() -> Router<AppState> {
    Router::new()
        .route("/register", get(queue::register))
        .route("/rank", get(queue::rank))
        .route("/allowed", get(queue::allowed))
        .route("/touch", get(queue::touch))
        .route("/allow", get(queue::allow))
}

async fn healthz() -> &'static str {
    "ok"
}
