//! Law-finder (agent 1) normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::probe::{FallbackChain, JsonPath, Presence, RawAgentResponse};
use crate::types::{
    as_list, coerce_string, dedup_strings, is_truthy, stringify_list, truthy_strings,
};

pub const SOURCES: FallbackChain = FallbackChain {
    field: "sources",
    candidates: &[
        JsonPath(&["sources"]),
        JsonPath(&["law_sources"]),
        JsonPath(&["data", "sources"]),
        JsonPath(&["data", "law_sources"]),
    ],
    presence: Presence::NonNull,
};

pub const REGULATIONS: FallbackChain = FallbackChain {
    field: "regulations_hit",
    candidates: &[
        JsonPath(&["regulations_hit"]),
        JsonPath(&["regulations"]),
        JsonPath(&["data", "regulations_hit"]),
    ],
    presence: Presence::NonNull,
};

pub const REGIONS: FallbackChain = FallbackChain {
    field: "regions_hit",
    candidates: &[
        JsonPath(&["regions_hit"]),
        JsonPath(&["regions"]),
        JsonPath(&["data", "regions_hit"]),
    ],
    presence: Presence::NonNull,
};

pub const OBLIGATIONS: FallbackChain = FallbackChain {
    field: "key_obligations",
    candidates: &[
        JsonPath(&["obligations"]),
        JsonPath(&["key_obligations"]),
        JsonPath(&["data", "key_obligations"]),
    ],
    presence: Presence::NonNull,
};

pub const CITATIONS: FallbackChain = FallbackChain {
    field: "citations",
    candidates: &[JsonPath(&["citations"]), JsonPath(&["data", "citations"])],
    presence: Presence::NonNull,
};

/// Canonical law findings extracted from an agent 1 response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFindings {
    pub regions_hit: Vec<String>,
    pub regulations_hit: Vec<String>,
    pub key_obligations: Vec<String>,
    pub citations: Vec<String>,
    pub evidence_urls: Vec<String>,
    /// Source objects exactly as agent 1 returned them; forwarded to agent 2
    pub raw_sources: Vec<Value>,
}

/// Extract law findings from an arbitrarily shaped agent 1 response.
///
/// Never fails: fields that match no known shape come back empty.
pub fn normalize_findings(raw: &RawAgentResponse) -> NormalizedFindings {
    // Regions and regulations drop falsy entries; obligations and citations
    // are stringified first, so only empty text is dropped.
    let list = |chain: &FallbackChain, to_strings: fn(&Value) -> Vec<String>| {
        raw.probe(chain)
            .map(|v| dedup_strings(to_strings(v)))
            .unwrap_or_default()
    };

    let raw_sources: Vec<Value> = raw
        .probe(&SOURCES)
        .map(|v| as_list(v).into_iter().cloned().collect())
        .unwrap_or_default();

    let evidence_urls = dedup_strings(
        raw_sources
            .iter()
            .filter_map(|source| source.get("url"))
            .filter(|url| is_truthy(url))
            .map(coerce_string),
    );

    NormalizedFindings {
        regions_hit: list(&REGIONS, truthy_strings),
        regulations_hit: list(&REGULATIONS, truthy_strings),
        key_obligations: list(&OBLIGATIONS, stringify_list),
        citations: list(&CITATIONS, stringify_list),
        evidence_urls,
        raw_sources,
    }
}
