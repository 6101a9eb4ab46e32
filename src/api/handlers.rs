//! API request handlers.

use axum::{extract::State, Json};

use crate::pool::{ExecutionPool, TaskSummary};

use super::responses::HealthResponse;

/// Shared application state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub pool: ExecutionPool,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// List currently running tasks.
pub async fn list_running(State(state): State<ApiState>) -> Json<Vec<TaskSummary>> {
    Json(state.pool.running_tasks())
}

/// List tasks waiting for a slot, in admission order.
pub async fn list_waiting(State(state): State<ApiState>) -> Json<Vec<TaskSummary>> {
    Json(state.pool.waiting_tasks())
}
