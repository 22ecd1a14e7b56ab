//! Execution inspection endpoints

use axum::extract::{Path, State};

use crate::api::state::AppState;
use crate::api::types::{ApiError, ExecutionResponse, ExecutionsListResponse, Json};
use crate::domain::execution::ExecutionId;

fn parse_id(id: &str) -> Result<ExecutionId, ApiError> {
    ExecutionId::new(id).map_err(ApiError::from)
}

/// GET /v1/executions
pub async fn list_executions(
    State(state): State<AppState>,
) -> Result<Json<ExecutionsListResponse>, ApiError> {
    let executions = state.deployment_service.list().await?;
    Ok(Json(ExecutionsListResponse::new(&executions)))
}

/// GET /v1/executions/{execution_id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> Result<Json<ExecutionResponse>, ApiError> {
    let id = parse_id(&execution_id)?;
    let execution = state.deployment_service.get(&id).await?;
    Ok(Json(ExecutionResponse::from(&execution)))
}

/// POST /v1/executions/{execution_id}/advance
pub async fn advance_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> Result<Json<ExecutionResponse>, ApiError> {
    let id = parse_id(&execution_id)?;
    let execution = state.deployment_service.advance(&id).await?;
    Ok(Json(ExecutionResponse::from(&execution)))
}
