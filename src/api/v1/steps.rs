//! Stateless step entry point

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::domain::execution::{StepInput, StepPayload};

/// POST /v1/steps
pub async fn handle_step(
    State(state): State<AppState>,
    Json(input): Json<StepInput>,
) -> Json<StepPayload> {
    Json(state.deployment_service.handle_step(input).await)
}
