pub mod error;
pub mod utils;

pub use error::{ResultExt, Result, ReviewError, ValidationError, ValidationErrorKind};
pub use utils::{
    as_list, coerce_number, coerce_string, dedup_strings, format_number, is_truthy,
    log_filter_error, stringify_list, truthy_strings,
};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two upstream analysis services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Agent 1: finds the laws and sources relevant to a feature
    LawFinder,
    /// Agent 2: scores the feature against the sources agent 1 found
    RiskEvaluator,
}

impl AgentKind {
    /// Short identifier used in API payloads and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::LawFinder => "agent1",
            AgentKind::RiskEvaluator => "agent2",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::LawFinder => write!(f, "Agent1"),
            AgentKind::RiskEvaluator => write!(f, "Agent2"),
        }
    }
}

/// Type-safe wrapper for analysis run IDs
///
/// Prevents accidental mixing of run IDs with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh ID: `run-<unix millis>-<8 hex chars>`
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("run-{}-{}", millis, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_agent_kind_names() {
        assert_eq!(AgentKind::LawFinder.as_str(), "agent1");
        assert_eq!(AgentKind::RiskEvaluator.to_string(), "Agent2");
    }

    #[test]
    fn test_run_id_generate_format() {
        let id = RunId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "run");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert_ne!(RunId::generate(), id);
    }

    #[test]
    fn test_run_id_serializes_transparently() {
        let id = RunId::new("run-1-abcdef01");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"run-1-abcdef01\""
        );
    }
}
