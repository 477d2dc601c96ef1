//! HTTP client for the operator bridge API.
//!
//! One [`BridgeClient`] (cheap to clone; `reqwest::Client` is reference
//! counted) is shared by the health prober, inventory loader and spawn
//! coordinator. Each call carries its own timeout, except the spawn request,
//! which is bounded only by the caller's abort token.

pub mod wire;

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::spawn::SpawnRequest;
use wire::{AgentsResponse, HealthResponse, RawResponse, StopPayload};

#[derive(Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BridgeClient {
    /// Build a client for the API rooted at `base_url` (e.g. `http://host:8080/api`).
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("opbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}/{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `GET /health`. Non-2xx and undecodable bodies are errors.
    pub async fn health(&self, timeout: Duration) -> Result<HealthResponse, BridgeError> {
        let resp = self
            .request(Method::GET, "health")
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status { status: status.as_u16() });
        }

        resp.json::<HealthResponse>()
            .await
            .map_err(|e| BridgeError::Decode(e.to_string()))
    }

    /// `GET /agents`.
    pub async fn agents(&self, timeout: Duration) -> Result<AgentsResponse, BridgeError> {
        let resp = self
            .request(Method::GET, "agents")
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BridgeError::Status { status: status.as_u16() });
        }

        resp.json::<AgentsResponse>()
            .await
            .map_err(|e| BridgeError::Decode(e.to_string()))
    }

    /// `POST /spawn-agent`, raced against `abort`.
    ///
    /// Returns whatever response arrived, success or not. If `abort` fires
    /// first, before the headers or while the body is still streaming, the
    /// request is dropped and [`BridgeError::Aborted`] is returned.
    pub async fn spawn_agent(
        &self,
        request: &SpawnRequest,
        abort: &CancellationToken,
    ) -> Result<RawResponse, BridgeError> {
        let exchange = async {
            let resp = self
                .request(Method::POST, "spawn-agent")
                .json(request)
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok::<_, BridgeError>(RawResponse { status, body })
        };

        tokio::select! {
            biased;
            _ = abort.cancelled() => Err(BridgeError::Aborted),
            result = exchange => result,
        }
    }

    /// `POST /stop-agent`.
    pub async fn stop_agent(
        &self,
        agent_id: &str,
        timeout: Duration,
    ) -> Result<RawResponse, BridgeError> {
        let resp = self
            .request(Method::POST, "stop-agent")
            .json(&StopPayload { agent_id })
            .timeout(timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}
