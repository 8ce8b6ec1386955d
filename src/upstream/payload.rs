//! Request bodies sent to the two agents.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::upstream::{DEFAULT_REGION, MIN_YEAR};

/// Agent 1 request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawFinderRequest {
    pub feature_summary: String,
    pub regions: Vec<String>,
    pub min_year: i32,
}

impl LawFinderRequest {
    /// Build from a review request; an empty region list becomes `["global"]`.
    pub fn new(title: &str, description: &str, regions: &[String], min_year: i32) -> Self {
        let regions = if regions.is_empty() {
            vec![DEFAULT_REGION.to_string()]
        } else {
            regions.to_vec()
        };

        Self {
            feature_summary: format!("{}\n\n{}", title.trim(), description.trim()),
            regions,
            min_year,
        }
    }

    /// Body used by the agent 1 probe route when the caller sends none
    pub fn sample() -> Self {
        Self {
            feature_summary: "Ping from complyflow".to_string(),
            regions: vec!["Utah".to_string()],
            min_year: MIN_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawAgentInput {
    pub index_id: String,
    pub sources: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPolicy {
    pub topic: String,
    pub description: String,
    pub document_points: Vec<Value>,
}

/// Agent 2 request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvaluatorRequest {
    pub law_agent_input: LawAgentInput,
    pub user_policy: UserPolicy,
    pub use_gemini: bool,
}

impl RiskEvaluatorRequest {
    pub fn new(
        index_id: impl Into<String>,
        sources: Vec<Value>,
        title: &str,
        description: &str,
        use_gemini: bool,
    ) -> Self {
        Self {
            law_agent_input: LawAgentInput {
                index_id: index_id.into(),
                sources,
            },
            user_policy: UserPolicy {
                topic: title.trim().to_string(),
                description: description.trim().to_string(),
                document_points: Vec::new(),
            },
            use_gemini,
        }
    }

    /// Body used by the agent 2 probe route when the caller sends none
    pub fn sample() -> Self {
        Self::new(
            "fc53f13c56d4",
            vec![json!({
                "url": "https://dcp.utah.gov/wp-content/uploads/2023/12/Social-Media-Regulation-PDF.pdf",
                "title": "Utah Social Media Regulation Act (PDF)",
                "jurisdiction": "Utah",
                "snippet": "Primary statute source."
            })],
            "Curfew login blocker with ASL/GH for Utah minors",
            "complyflow /a2-test default payload.",
            false,
        )
    }
}

/// Replace `law_agent_input.sources` with a `( N items )` summary for echoing.
pub fn summarize_sources(payload: &Value) -> Value {
    let mut summary = payload.clone();
    let count = payload
        .pointer("/law_agent_input/sources")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);

    if let Some(input) = summary
        .get_mut("law_agent_input")
        .and_then(Value::as_object_mut)
    {
        input.insert(
            "sources".to_string(),
            Value::String(format!("( {} items )", count)),
        );
    }
    summary
}
