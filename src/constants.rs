//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Upstream agent constants
pub mod upstream {
    /// Default law-finder endpoint (agent 1)
    pub const LAW_FINDER_URL: &str = "http://localhost:8000/v1/run";

    /// Default risk-evaluator endpoint (agent 2)
    pub const RISK_EVALUATOR_URL: &str = "http://localhost:18002/agent3/assess-demo";

    /// Agent 1 timeout inside the analysis pipeline (seconds)
    pub const LAW_FINDER_TIMEOUT_SECS: u64 = 20;

    /// Agent 2 timeout inside the analysis pipeline (seconds)
    pub const RISK_EVALUATOR_TIMEOUT_SECS: u64 = 25;

    /// Agent 1 timeout for the diagnostic probe route (seconds)
    pub const LAW_FINDER_PROBE_TIMEOUT_SECS: u64 = 15;

    /// Agent 2 timeout for the diagnostic probe route (seconds)
    pub const RISK_EVALUATOR_PROBE_TIMEOUT_SECS: u64 = 20;

    /// Oldest legislation year the law finder should consider
    pub const MIN_YEAR: i32 = 2023;

    /// Index ID sent to agent 2 when agent 1 reports none
    pub const DEFAULT_INDEX_ID: &str = "dynamic-index";

    /// Region sent to agent 1 when the request names none
    pub const DEFAULT_REGION: &str = "global";
}

/// Normalization constants
pub mod normalize {
    /// Number of `why` entries rendered into the rationale
    pub const MAX_WHY_ENTRIES: usize = 3;

    /// Rationale used when the risk evaluator gives none
    pub const NO_RATIONALE: &str = "No rationale provided";

    /// Issue label for `why` entries without one
    pub const DEFAULT_ISSUE: &str = "Issue";

    /// Title for obligations without a title or ID
    pub const DEFAULT_OBLIGATION: &str = "Obligation";

    /// Label for audit citations without one
    pub const DEFAULT_CITATION_LABEL: &str = "Source";
}

/// HTTP server constants
pub mod server {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Default listen port
    pub const DEFAULT_PORT: u16 = 5050;

    /// Default maximum request body size (1 MiB)
    pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

    /// Frontend origins allowed by default
    pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];
}

/// Storage constants
pub mod storage {
    /// Default database location, relative to the working directory
    pub const DEFAULT_DATABASE_PATH: &str = ".complyflow/runs.db";

    /// Number of runs returned by the run history listing
    pub const RECENT_RUNS_LIMIT: usize = 50;
}
