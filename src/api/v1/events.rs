//! Approval event entry point

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::types::Json;

pub const EXECUTION_ID_HEADER: HeaderName = HeaderName::from_static("x-execution-id");

/// POST /v1/events
///
/// Always answers 200 with the step payload; the outcome is in `statusCode`.
pub async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> Response {
    let outcome = state.deployment_service.handle_event(&event).await;
    let mut response = Json(outcome.payload).into_response();

    if let Some(id) = outcome.execution_id {
        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            response.headers_mut().insert(EXECUTION_ID_HEADER, value);
        }
    }

    response
}
