//! HTTP client for the daemon's control API.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use tracing::debug;

use spawnhub_core::{DaemonConfig, Service};

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;

/// Client for a running `spawnhubd watch`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &DaemonConfig) -> ApiResult<Self> {
        let addr = config
            .listen_addr()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        let timeout = config
            .request_timeout()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        Ok(Self::with_base_url(&format!("http://{addr}"), timeout))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self) -> ApiResult<Vec<Service>> {
        self.call(Method::GET, "/services", None).await
    }

    pub async fn register(&self, service: &Service) -> ApiResult<Service> {
        let body = serde_json::to_vec(service).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.call(Method::POST, "/services", Some(body)).await
    }

    pub async fn get(&self, label: &str) -> ApiResult<Service> {
        self.call(Method::GET, &format!("/services/{label}"), None).await
    }

    pub async fn start(&self, label: &str) -> ApiResult<Service> {
        self.action(label, "start").await
    }

    pub async fn stop(&self, label: &str) -> ApiResult<Service> {
        self.action(label, "stop").await
    }

    pub async fn check(&self, label: &str) -> ApiResult<Service> {
        self.action(label, "check").await
    }

    pub async fn restart(&self, label: &str) -> ApiResult<Service> {
        self.action(label, "restart").await
    }

    pub async fn mark_need_restart(&self, label: &str) -> ApiResult<Service> {
        self.action(label, "need-restart").await
    }

    pub async fn reap(&self, label: &str) -> ApiResult<()> {
        let _: String = self
            .call(Method::DELETE, &format!("/services/{label}"), None)
            .await?;
        Ok(())
    }

    /// Workload and exposure manifests, as `{"workload": .., "exposure": ..}`.
    pub async fn render(&self, label: &str) -> ApiResult<serde_json::Value> {
        self.call(Method::GET, &format!("/services/{label}/render"), None)
            .await
    }

    async fn action(&self, label: &str, action: &str) -> ApiResult<Service> {
        self.call(Method::POST, &format!("/services/{label}/{action}"), None)
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ApiResult<T> {
        let uri = format!("{}/api/v1{path}", self.base_url);
        let mut builder = Request::builder()
            .method(method)
            .uri(&uri)
            .header("user-agent", "spawnhubd/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

        let call = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| ApiError::Unreachable {
                    url: self.base_url.clone(),
                    reason: e.to_string(),
                })?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?
                .to_bytes();
            Ok::<_, ApiError>((status, bytes))
        };

        let (status, bytes) = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(ApiError::Timeout(self.timeout)),
        };
        debug!(%uri, %status, "control call");
        decode(status, &bytes)
    }
}

/// Unwrap an [`ApiResponse`] envelope.
fn decode<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ApiResult<T> {
    let envelope: ApiResponse<T> = match serde_json::from_slice(bytes) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: String::from_utf8_lossy(bytes).trim().to_string(),
            });
        }
        Err(e) => return Err(ApiError::Decode(e.to_string())),
    };
    match envelope.data {
        Some(data) if status.is_success() && envelope.success => Ok(data),
        _ if status.is_success() && envelope.success => {
            Err(ApiError::Decode("response carries no data".to_string()))
        }
        _ => Err(ApiError::Remote {
            status: status.as_u16(),
            message: envelope
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        }),
    }
}
