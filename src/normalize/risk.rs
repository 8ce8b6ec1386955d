//! Risk-evaluator (agent 2) normalization.
//!
//! Reduces the evaluator's payload to a numeric score with a human-readable
//! rationale, plus the obligations, citations, evidence URLs, regions and
//! regulations it reports. Rendering rules:
//!
//! - `why` entry: `• {issue}[ [severity]][ (coverage)]: {rationale}`
//! - obligation: `{title}[ — coverage][ (severity)][: reason]`
//! - audit citation: `{label} — {url}`, or just the label without a URL

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::probe::{FallbackChain, JsonPath, Presence, RawAgentResponse};
use crate::constants::normalize::{
    DEFAULT_CITATION_LABEL, DEFAULT_ISSUE, DEFAULT_OBLIGATION, MAX_WHY_ENTRIES, NO_RATIONALE,
};
use crate::types::{coerce_number, coerce_string, dedup_strings, is_truthy, stringify_list};

pub const SCORE: FallbackChain = FallbackChain {
    field: "risk_score",
    candidates: &[
        JsonPath(&["risk_score"]),
        JsonPath(&["riskScore"]),
        JsonPath(&["score"]),
        JsonPath(&["assessment", "risk_score"]),
        JsonPath(&["assessment", "score"]),
    ],
    presence: Presence::NonNull,
};

pub const RATIONALE: FallbackChain = FallbackChain {
    field: "rationale",
    candidates: &[
        JsonPath(&["rationale"]),
        JsonPath(&["reason"]),
        JsonPath(&["assessment", "rationale"]),
        JsonPath(&["assessment", "reason"]),
    ],
    presence: Presence::Truthy,
};

/// Risk score with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub value: f64,
    pub rationale: String,
}

/// Findings reported on the evaluator side, merged with agent 1's later
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreExtras {
    pub key_obligations: Vec<String>,
    pub citations: Vec<String>,
    pub evidence_urls: Vec<String>,
    pub regions_hit: Vec<String>,
    pub regulations_hit: Vec<String>,
}

/// Canonical output of the risk evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub score: RiskScore,
    pub extras: ScoreExtras,
}

/// Extract the score, rationale and extras from an agent 2 response.
///
/// Never fails: an unrecognized payload scores 0 with the placeholder
/// rationale and empty extras.
pub fn normalize_score(raw: &RawAgentResponse) -> NormalizedScore {
    let score = RiskScore {
        value: score_value(raw),
        rationale: rationale(raw),
    };

    let audit_citations = raw.array("audit_citations");

    let citations = dedup_strings(
        audit_citations
            .iter()
            .map(render_audit_citation)
            .chain(raw.array("citations").iter().map(coerce_string)),
    );

    let evidence_urls = dedup_strings(
        audit_citations
            .iter()
            .filter_map(|c| c.get("url"))
            .chain(raw.array("evidence_urls"))
            .filter(|url| is_truthy(url))
            .map(coerce_string),
    );

    let extras = ScoreExtras {
        key_obligations: raw.array("obligations").iter().map(render_obligation).collect(),
        citations,
        evidence_urls,
        regions_hit: raw.field("regions").map(stringify_list).unwrap_or_default(),
        regulations_hit: raw
            .field("regulations_hit")
            .map(stringify_list)
            .unwrap_or_default(),
    };

    NormalizedScore { score, extras }
}

fn score_value(raw: &RawAgentResponse) -> f64 {
    match raw.probe(&SCORE) {
        Some(Value::Object(map)) => map.get("value").map(coerce_number).unwrap_or(0.0),
        Some(other) => coerce_number(other),
        None => 0.0,
    }
}

fn rationale(raw: &RawAgentResponse) -> String {
    let why: Vec<String> = raw
        .array("why")
        .iter()
        .take(MAX_WHY_ENTRIES)
        .map(render_why)
        .collect();

    if !why.is_empty() {
        return why.join("\n");
    }

    raw.probe(&RATIONALE)
        .map(coerce_string)
        .unwrap_or_else(|| NO_RATIONALE.to_string())
}

/// Text of `entry[key]` when truthy
fn text(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).filter(|v| is_truthy(v)).map(coerce_string)
}

fn render_why(entry: &Value) -> String {
    let issue = text(entry, "issue").unwrap_or_else(|| DEFAULT_ISSUE.to_string());
    let detail = text(entry, "rationale")
        .or_else(|| text(entry, "reason"))
        .unwrap_or_default();
    let severity = text(entry, "severity")
        .map(|s| format!(" [{}]", s))
        .unwrap_or_default();
    let coverage = text(entry, "coverage")
        .map(|c| format!(" ({})", c))
        .unwrap_or_default();

    format!("• {}{}{}: {}", issue, severity, coverage, detail)
        .trim()
        .to_string()
}

fn render_obligation(entry: &Value) -> String {
    let title = text(entry, "title")
        .or_else(|| text(entry, "obligation_id"))
        .unwrap_or_else(|| DEFAULT_OBLIGATION.to_string());
    let coverage = text(entry, "coverage")
        .map(|c| format!(" — {}", c))
        .unwrap_or_default();
    let severity = text(entry, "severity")
        .map(|s| format!(" ({})", s))
        .unwrap_or_default();
    let reason = text(entry, "reason")
        .map(|r| format!(": {}", r))
        .unwrap_or_default();

    format!("{}{}{}{}", title, coverage, severity, reason)
        .trim()
        .to_string()
}

fn render_audit_citation(entry: &Value) -> String {
    let label = text(entry, "label").unwrap_or_else(|| DEFAULT_CITATION_LABEL.to_string());
    match text(entry, "url") {
        Some(url) => format!("{} — {}", label, url),
        None => label,
    }
}
