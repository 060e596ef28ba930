//! REST API handlers.
//!
//! Each handler runs one orchestrator operation and wraps the outcome in an
//! [`ApiResponse`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use spawnhub_core::Service;
use spawnhub_orchestrator::{OrchestratorError, OrchestratorResult};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// HTTP status for an orchestrator failure.
pub fn status_for(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::InvalidState(_) => StatusCode::CONFLICT,
        OrchestratorError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OrchestratorError::Cluster(_) | OrchestratorError::Route(_) => StatusCode::BAD_GATEWAY,
        OrchestratorError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T: Serialize>(result: OrchestratorResult<T>) -> Response {
    match result {
        Ok(data) => Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        })
        .into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(%status, error = %e, "control request failed");
            }
            (
                status,
                Json(ApiResponse::<()> {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> Response {
    reply(state.orchestrator.list())
}

/// POST /api/v1/services
pub async fn register_service(
    State(state): State<ApiState>,
    Json(service): Json<Service>,
) -> Response {
    reply(state.orchestrator.register(service).await)
}

/// GET /api/v1/services/{label}
pub async fn get_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    reply(state.orchestrator.get(&label))
}

/// DELETE /api/v1/services/{label}
pub async fn reap_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    let result = state.orchestrator.reap(&label).await;
    reply(result.map(|()| label))
}

/// POST /api/v1/services/{label}/start
pub async fn start_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    reply(state.orchestrator.start(&label).await)
}

/// POST /api/v1/services/{label}/stop
pub async fn stop_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    reply(state.orchestrator.stop(&label).await)
}

/// POST /api/v1/services/{label}/check
pub async fn check_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    reply(state.orchestrator.check(&label).await)
}

/// POST /api/v1/services/{label}/restart
pub async fn restart_service(
    State(state): State<ApiState>,
    Path(label): Path<String>,
) -> Response {
    reply(state.orchestrator.restart(&label).await)
}

/// POST /api/v1/services/{label}/need-restart
pub async fn mark_need_restart(
    State(state): State<ApiState>,
    Path(label): Path<String>,
) -> Response {
    reply(state.orchestrator.mark_need_restart(&label).await)
}

/// GET /api/v1/services/{label}/render
pub async fn render_service(State(state): State<ApiState>, Path(label): Path<String>) -> Response {
    reply(state.orchestrator.render(&label).map(|specs| {
        serde_json::json!({
            "workload": specs.workload,
            "exposure": specs.exposure,
        })
    }))
}
