//! Merge of agent 1 findings with agent 2 extras into the final contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::law::NormalizedFindings;
use super::risk::{NormalizedScore, RiskScore};
use crate::types::dedup_strings;

/// Findings section of the final contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedFindings {
    pub regions_hit: Vec<String>,
    pub regulations_hit: Vec<String>,
    pub key_obligations: Vec<String>,
    pub citations: Vec<String>,
    pub evidence_urls: Vec<String>,
}

/// The untouched upstream payloads, kept for audit and debugging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayloads {
    pub agent1: Value,
    pub agent2: Value,
}

/// Final result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub findings: MergedFindings,
    pub score: RiskScore,
    pub raw: RawPayloads,
}

/// Union two lists, agent 1 entries first, dropping empties and duplicates.
fn union(first: &[String], second: &[String]) -> Vec<String> {
    dedup_strings(first.iter().chain(second).cloned())
}

/// Combine normalized agent outputs; the score passes through unchanged.
pub fn merge(
    findings: &NormalizedFindings,
    assessment: NormalizedScore,
    raw: RawPayloads,
) -> MergedResult {
    let extras = &assessment.extras;

    let merged = MergedFindings {
        regions_hit: union(&findings.regions_hit, &extras.regions_hit),
        regulations_hit: union(&findings.regulations_hit, &extras.regulations_hit),
        key_obligations: union(&findings.key_obligations, &extras.key_obligations),
        citations: union(&findings.citations, &extras.citations),
        evidence_urls: union(&findings.evidence_urls, &extras.evidence_urls),
    };

    MergedResult {
        findings: merged,
        score: assessment.score,
        raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::law::normalize_findings;
    use crate::normalize::probe::RawAgentResponse;
    use crate::normalize::risk::normalize_score;
    use proptest::prelude::*;
    use serde_json::json;

    fn run(agent1: Value, agent2: Value) -> MergedResult {
        let a1 = RawAgentResponse::new(agent1.clone());
        let a2 = RawAgentResponse::new(agent2.clone());
        merge(
            &normalize_findings(&a1),
            normalize_score(&a2),
            RawPayloads { agent1, agent2 },
        )
    }

    #[test]
    fn test_regions_keep_agent1_order() {
        let result = run(
            json!({"regions_hit": ["EU", "US"]}),
            json!({"regions": ["US", "KR"]}),
        );
        assert_eq!(result.findings.regions_hit, vec!["EU", "US", "KR"]);
    }

    #[test]
    fn test_regulations_union() {
        let result = run(
            json!({"regulations_hit": ["DSA"]}),
            json!({"regulations_hit": ["DSA", "CCPA"]}),
        );
        assert_eq!(result.findings.regulations_hit, vec!["DSA", "CCPA"]);
    }

    #[test]
    fn test_score_and_raw_pass_through() {
        let agent2 = json!({"score": {"value": 17}, "rationale": "Minor risk"});
        let result = run(json!(null), agent2.clone());
        assert_eq!(result.score.value, 17.0);
        assert_eq!(result.score.rationale, "Minor risk");
        assert_eq!(result.raw.agent1, Value::Null);
        assert_eq!(result.raw.agent2, agent2);
    }

    #[test]
    fn test_empty_inputs_serialize_to_empty_lists() {
        let result = run(json!(null), json!(null));
        let serialized = serde_json::to_value(&result).unwrap();
        for key in [
            "regions_hit",
            "regulations_hit",
            "key_obligations",
            "citations",
            "evidence_urls",
        ] {
            assert_eq!(serialized["findings"][key], json!([]), "field {}", key);
        }
        assert_eq!(serialized["score"]["value"], json!(0.0));
    }

    #[test]
    fn test_evidence_urls_from_both_agents() {
        let result = run(
            json!({"sources": [{"url": "https://a.example/law"}]}),
            json!({
                "audit_citations": [{"label": "Law", "url": "https://a.example/law"}],
                "evidence_urls": ["https://b.example/guide"]
            }),
        );
        assert_eq!(
            result.findings.evidence_urls,
            vec!["https://a.example/law", "https://b.example/guide"]
        );
        assert_eq!(
            result.findings.citations,
            vec!["Law — https://a.example/law"]
        );
    }

    fn entries() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(vec!["EU", "US", "KR", "UT", ""]), 0..12)
            .prop_map(|v| v.into_iter().map(String::from).collect())
    }

    proptest! {
        #[test]
        fn prop_union_with_self_is_idempotent(items in entries()) {
            let once = union(&items, &items);
            prop_assert_eq!(union(&once, &once), once.clone());
            prop_assert_eq!(once, dedup_strings(items));
        }

        #[test]
        fn prop_union_has_no_duplicates_or_empties(a in entries(), b in entries()) {
            let merged = union(&a, &b);
            let unique: std::collections::HashSet<_> = merged.iter().collect();
            prop_assert_eq!(unique.len(), merged.len());
            prop_assert!(merged.iter().all(|s| !s.is_empty()));
        }

        #[test]
        fn prop_union_keeps_agent1_entries_first(a in entries(), b in entries()) {
            let merged = union(&a, &b);
            let first = dedup_strings(a);
            prop_assert_eq!(&merged[..first.len()], first.as_slice());
        }
    }
}
