//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/complyflow/) and project (.complyflow/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{server, storage, upstream};
use crate::types::{Result, ReviewError};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// HTTP service settings
    pub server: ServerConfig,

    /// Upstream agent settings
    pub upstream: UpstreamConfig,

    /// Run history storage
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ReviewError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ReviewError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.server.body_limit_bytes == 0 {
            return Err(ReviewError::Config(
                "server.body_limit_bytes must be greater than 0".to_string(),
            ));
        }

        for (name, agent) in [
            ("law_finder", &self.upstream.law_finder),
            ("risk_evaluator", &self.upstream.risk_evaluator),
        ] {
            agent.validate(name)?;
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            cors_origins: server::DEFAULT_CORS_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            body_limit_bytes: server::DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Upstream Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Agent 1
    pub law_finder: AgentConfig,

    /// Agent 2
    pub risk_evaluator: AgentConfig,

    /// Oldest legislation year agent 1 should consider
    pub min_year: i32,

    /// Ask agent 2 to use its LLM path instead of heuristics
    pub use_gemini: bool,

    /// Index ID sent to agent 2 when agent 1 reports none
    pub default_index_id: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            law_finder: AgentConfig {
                url: upstream::LAW_FINDER_URL.to_string(),
                timeout_secs: upstream::LAW_FINDER_TIMEOUT_SECS,
                probe_timeout_secs: upstream::LAW_FINDER_PROBE_TIMEOUT_SECS,
            },
            risk_evaluator: AgentConfig {
                url: upstream::RISK_EVALUATOR_URL.to_string(),
                timeout_secs: upstream::RISK_EVALUATOR_TIMEOUT_SECS,
                probe_timeout_secs: upstream::RISK_EVALUATOR_PROBE_TIMEOUT_SECS,
            },
            min_year: upstream::MIN_YEAR,
            use_gemini: false,
            default_index_id: upstream::DEFAULT_INDEX_ID.to_string(),
        }
    }
}

/// Endpoint and timeouts for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Full URL the JSON payload is POSTed to
    pub url: String,

    /// Timeout inside the analysis pipeline (seconds)
    pub timeout_secs: u64,

    /// Timeout for the diagnostic probe route (seconds)
    pub probe_timeout_secs: u64,
}

impl AgentConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if self.timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(ReviewError::Config(format!(
                "upstream.{} timeouts must be greater than 0",
                name
            )));
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| {
            ReviewError::Config(format!(
                "upstream.{}.url '{}' is not a valid URL: {}",
                name, self.url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ReviewError::Config(format!(
                "upstream.{}.url must use http or https, got '{}'",
                name,
                parsed.scheme()
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(storage::DEFAULT_DATABASE_PATH),
        }
    }
}
