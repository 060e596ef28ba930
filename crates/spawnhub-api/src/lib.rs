//! spawnhub-api: control API of a running spawnhub daemon.
//!
//! `spawnhubd watch` owns the state store and the [`Orchestrator`] and serves
//! this API; every other `spawnhubd` command is a call through [`ApiClient`].
//! Per-label exclusion therefore covers CLI calls and monitor sweeps alike.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/services` | List services |
//! | POST | `/api/v1/services` | Register a service description |
//! | GET | `/api/v1/services/{label}` | Get one service |
//! | DELETE | `/api/v1/services/{label}` | Stop and forget a service |
//! | POST | `/api/v1/services/{label}/start` | Start |
//! | POST | `/api/v1/services/{label}/stop` | Stop |
//! | POST | `/api/v1/services/{label}/check` | Health check |
//! | POST | `/api/v1/services/{label}/restart` | Stop, then start |
//! | POST | `/api/v1/services/{label}/need-restart` | Flag for restart |
//! | GET | `/api/v1/services/{label}/render` | Manifests `start` would submit |

pub mod client;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use spawnhub_orchestrator::Orchestrator;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use handlers::ApiResponse;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the control API router.
pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    let services = Router::new()
        .route(
            "/services",
            get(handlers::list_services).post(handlers::register_service),
        )
        .route(
            "/services/{label}",
            get(handlers::get_service).delete(handlers::reap_service),
        )
        .route("/services/{label}/start", post(handlers::start_service))
        .route("/services/{label}/stop", post(handlers::stop_service))
        .route("/services/{label}/check", post(handlers::check_service))
        .route("/services/{label}/restart", post(handlers::restart_service))
        .route("/services/{label}/need-restart", post(handlers::mark_need_restart))
        .route("/services/{label}/render", get(handlers::render_service))
        .with_state(ApiState { orchestrator });

    Router::new().nest("/api/v1", services)
}
