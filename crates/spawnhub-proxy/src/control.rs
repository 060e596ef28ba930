//! HTTP client for the reverse-proxy control API.
//!
//! Speaks the configurable-http-proxy protocol:
//!
//! ```text
//! POST   {api_url}/api/routes/{path}   {"target": "http://host:port"}  → 201
//! DELETE {api_url}/api/routes/{path}                                   → 204
//! ```
//!
//! An `Authorization: token …` header is sent when a token is configured.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, info};

use spawnhub_core::ProxyConfig;

use crate::error::{RouteError, RouteResult};
use crate::registrar::{RouteRegistrar, RouteTarget};

/// Route registrar backed by the proxy's REST control plane.
#[derive(Clone)]
pub struct HttpRouteRegistrar {
    client: Client<HttpConnector, Full<Bytes>>,
    api_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpRouteRegistrar {
    pub fn new(config: &ProxyConfig) -> RouteResult<Self> {
        let timeout = config
            .request_timeout()
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;
        if !config.api_url.starts_with("http://") {
            return Err(RouteError::InvalidConfig(format!(
                "proxy api_url must be an http:// URL, got {:?}",
                config.api_url
            )));
        }
        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            timeout,
        })
    }

    fn route_uri(&self, path: &str) -> String {
        format!("{}/api/routes/{}", self.api_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> RouteResult<StatusCode> {
        let uri = self.route_uri(path);
        let mut builder = Request::builder()
            .method(method)
            .uri(&uri)
            .header("user-agent", "spawnhub-proxy/0.1");
        if let Some(token) = &self.auth_token {
            builder = builder.header("authorization", format!("token {token}"));
        }
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;

        let call = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| RouteError::Transport(e.to_string()))?;
            let status = resp.status();
            // Drain so the connection can be reused.
            let _ = resp.into_body().collect().await;
            Ok(status)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => {
                if let Ok(status) = &result {
                    debug!(%uri, %status, "proxy control call");
                }
                result
            }
            Err(_) => Err(RouteError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl RouteRegistrar for HttpRouteRegistrar {
    async fn add_route(&self, path: &str, target: &RouteTarget) -> RouteResult<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "target": target.url() }))
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;
        let status = self.send(Method::POST, path, Some(body)).await?;
        if !status.is_success() {
            return Err(RouteError::Rejected {
                method: "POST",
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        info!(%path, %target, "route added");
        Ok(())
    }

    async fn remove_route(&self, path: &str) -> RouteResult<()> {
        let status = self.send(Method::DELETE, path, None).await?;
        if status == StatusCode::NOT_FOUND {
            debug!(%path, "route already absent");
            return Ok(());
        }
        if !status.is_success() {
            return Err(RouteError::Rejected {
                method: "DELETE",
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        info!(%path, "route removed");
        Ok(())
    }
}
