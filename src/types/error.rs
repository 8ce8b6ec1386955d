//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Kinds
//!
//! - **UpstreamUnreachable**: network failure or timeout talking to an agent
//! - **UpstreamRejected**: an agent answered with a non-2xx status
//! - **Validation**: the caller sent an incomplete request
//! - **Storage / Database**: persistence failures (never fatal to a review)
//! - **Config**: configuration could not be loaded or is out of range
//!
//! A response that matches none of the known agent shapes is not an error:
//! normalization degrades to empty collections and default values instead.

use serde_json::Value;
use thiserror::Error;

use super::AgentKind;

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Fields that failed validation
    pub fields: Vec<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            message: message.into(),
        }
    }

    /// Error for one or more required fields that were missing or blank
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self {
            kind: ValidationErrorKind::MissingField,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            message: format!("Missing required fields: {}", fields.join(", ")),
        }
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing
    MissingField,
    /// Request body could not be parsed
    Format,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ReviewError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Upstream Errors
    // -------------------------------------------------------------------------
    /// Connection, DNS or timeout failure before any response arrived
    #[error("{agent} unreachable: {message}")]
    UpstreamUnreachable {
        agent: AgentKind,
        message: String,
        timed_out: bool,
    },

    /// Agent answered, but not with a 2xx status
    #[error("{agent} returned non-2xx ({status})")]
    UpstreamRejected {
        agent: AgentKind,
        status: u16,
        body: Value,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'complyflow init' first")]
    NotInitialized,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ValidationError> for ReviewError {
    fn from(err: ValidationError) -> Self {
        ReviewError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl ReviewError {
    /// Create an unreachable-upstream error
    pub fn unreachable(agent: AgentKind, message: impl Into<String>, timed_out: bool) -> Self {
        Self::UpstreamUnreachable {
            agent,
            message: message.into(),
            timed_out,
        }
    }

    /// The agent involved, for upstream failures
    pub fn agent(&self) -> Option<AgentKind> {
        match self {
            Self::UpstreamUnreachable { agent, .. } | Self::UpstreamRejected { agent, .. } => {
                Some(*agent)
            }
            _ => None,
        }
    }

    /// Whether the failure originates from an upstream agent
    pub fn is_upstream(&self) -> bool {
        self.agent().is_some()
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ReviewError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ReviewError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
