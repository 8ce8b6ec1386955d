//! Upstream Agents
//!
//! HTTP plumbing for the law finder (agent 1) and risk evaluator (agent 2).
//!
//! ## Modules
//!
//! - `transport`: AgentTransport trait and the reqwest implementation
//! - `payload`: typed request bodies for both agents

mod payload;
mod transport;

pub use payload::{
    LawAgentInput, LawFinderRequest, RiskEvaluatorRequest, UserPolicy, summarize_sources,
};
pub use transport::{AgentTransport, HttpTransport, SharedTransport, UpstreamReply};

use serde_json::Value;
use std::time::Duration;

use crate::config::{AgentConfig, UpstreamConfig};
use crate::types::{AgentKind, Result};

/// One configured agent: where it lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub kind: AgentKind,
    pub url: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

impl AgentEndpoint {
    pub fn from_config(kind: AgentKind, config: &AgentConfig) -> Self {
        Self {
            kind,
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }
}

/// Calls both agents through a shared transport.
///
/// Holds no per-request state; one instance serves every concurrent review.
#[derive(Clone)]
pub struct UpstreamClient {
    transport: SharedTransport,
    law_finder: AgentEndpoint,
    risk_evaluator: AgentEndpoint,
}

impl UpstreamClient {
    pub fn new(transport: SharedTransport, config: &UpstreamConfig) -> Self {
        Self {
            transport,
            law_finder: AgentEndpoint::from_config(AgentKind::LawFinder, &config.law_finder),
            risk_evaluator: AgentEndpoint::from_config(
                AgentKind::RiskEvaluator,
                &config.risk_evaluator,
            ),
        }
    }

    pub fn endpoint(&self, agent: AgentKind) -> &AgentEndpoint {
        match agent {
            AgentKind::LawFinder => &self.law_finder,
            AgentKind::RiskEvaluator => &self.risk_evaluator,
        }
    }

    /// Pipeline call, bounded by the agent's pipeline timeout
    pub async fn call(&self, agent: AgentKind, payload: &Value) -> Result<UpstreamReply> {
        let endpoint = self.endpoint(agent);
        self.transport
            .post_json(agent, &endpoint.url, payload, endpoint.timeout)
            .await
    }

    /// Diagnostic call, bounded by the agent's probe timeout
    pub async fn probe(&self, agent: AgentKind, payload: &Value) -> Result<UpstreamReply> {
        let endpoint = self.endpoint(agent);
        self.transport
            .post_json(agent, &endpoint.url, payload, endpoint.probe_timeout)
            .await
    }
}
