//! complyflow - Compliance Review Orchestrator
//!
//! Given a feature title and description, calls a law-finder agent and a
//! risk-evaluator agent, normalizes their loosely-typed JSON into one
//! findings/score record, persists the run and serves it over HTTP.
//!
//! ## Core Features
//!
//! - **Fallback chains**: field extraction that tolerates renamed and nested
//!   keys across agent versions
//! - **Deterministic merge**: deduplicated unions with agent 1 entries first
//! - **Run history**: SQLite persistence with connection pooling
//! - **HTTP API**: `/analyze` plus history and diagnostic routes
//!
//! ## Quick Start
//!
//! ```ignore
//! use complyflow::{AnalyzeRequest, Config, HttpTransport, ReviewPipeline, UpstreamClient};
//!
//! let config = Config::default();
//! let transport = Arc::new(HttpTransport::new()?);
//! let pipeline = ReviewPipeline::new(
//!     UpstreamClient::new(transport, &config.upstream),
//!     config.upstream.clone(),
//! );
//! let outcome = pipeline
//!     .analyze(&AnalyzeRequest::new("Curfew blocker", "Blocks logins", vec![]))
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`upstream`]: agent transport and request payloads
//! - [`normalize`]: fallback chains, per-agent normalizers and merge
//! - [`pipeline`]: the sequential review run
//! - [`storage`]: SQLite run history with connection pooling
//! - [`server`]: axum HTTP service
//! - [`config`]: layered configuration

pub mod cli;
pub mod config;
pub mod constants;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod types;
pub mod upstream;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{Result, ResultExt, ReviewError};
pub use types::{AgentKind, RunId};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, RunStore, SharedDatabase};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use normalize::{MergedResult, NormalizedFindings, NormalizedScore, RawAgentResponse};
pub use pipeline::{AnalyzeRequest, ReviewOutcome, ReviewPipeline};
pub use upstream::{AgentTransport, HttpTransport, UpstreamClient};
