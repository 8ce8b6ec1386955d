//! Response Normalization
//!
//! Turns the two loosely-typed agent payloads into one canonical record:
//!
//! - `probe`: ordered fallback chains over an unknown-shape payload
//! - `law`: agent 1 (law finder) → [`NormalizedFindings`]
//! - `risk`: agent 2 (risk evaluator) → [`NormalizedScore`]
//! - `merge`: both → [`MergedResult`]
//!
//! Normalization is pure and infallible. Unknown shapes degrade to empty
//! collections and default values rather than errors.

pub mod law;
pub mod merge;
pub mod probe;
pub mod risk;

pub use law::{NormalizedFindings, normalize_findings};
pub use merge::{MergedFindings, MergedResult, RawPayloads, merge};
pub use probe::{FallbackChain, JsonPath, Presence, RawAgentResponse};
pub use risk::{NormalizedScore, RiskScore, ScoreExtras, normalize_score};
