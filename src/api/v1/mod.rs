//! Deployment API v1

pub mod events;
pub mod executions;
pub mod steps;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::handle_event))
        .route("/steps", post(steps::handle_step))
        .route("/executions", get(executions::list_executions))
        .route("/executions/{execution_id}", get(executions::get_execution))
        .route(
            "/executions/{execution_id}/advance",
            post(executions::advance_execution),
        )
}
