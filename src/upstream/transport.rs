//! Agent Transport
//!
//! Defines the AgentTransport trait for posting JSON to an upstream agent.
//! Implementations never fail on HTTP status: 4xx/5xx come back as an
//! [`UpstreamReply`] and only connection-level failures become errors.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::types::{AgentKind, Result, ReviewError};

/// Status code and decoded body of an upstream response
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    /// JSON body; non-JSON text is kept as a string, an empty body is `null`
    pub body: Value,
}

impl UpstreamReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a raw body the way every transport should
    pub fn decode_body(bytes: &[u8]) -> Value {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Posts a JSON payload to an agent and returns its reply.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn post_json(
        &self,
        agent: AgentKind,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<UpstreamReply>;
}

pub type SharedTransport = Arc<dyn AgentTransport>;

/// reqwest-backed transport.
///
/// The client keeps no idle connections, so every call opens a fresh one.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ReviewError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn post_json(
        &self,
        agent: AgentKind,
        url: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<UpstreamReply> {
        let start = Instant::now();
        debug!("POST {} ({}, timeout {:?})", url, agent, timeout);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("{} request to {} failed: {}", agent, url, e);
                ReviewError::unreachable(agent, e.to_string(), e.is_timeout())
            })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| {
            warn!("{} response from {} could not be read: {}", agent, url, e);
            ReviewError::unreachable(agent, e.to_string(), e.is_timeout())
        })?;

        debug!(
            "{} answered {} in {}ms",
            agent,
            status,
            start.elapsed().as_millis()
        );

        Ok(UpstreamReply::new(status, UpstreamReply::decode_body(&bytes)))
    }
}
