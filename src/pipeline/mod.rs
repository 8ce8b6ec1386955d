//! Review Pipeline
//!
//! One review is a strictly sequential run:
//!
//! ```text
//! request → agent 1 → normalize findings → agent 2 → normalize score
//!                                                        ↓
//!                               caller ← merge → persist (best effort)
//! ```
//!
//! Agent 2's payload is built from agent 1's sources, so the two calls never
//! overlap. Any upstream failure ends the run before persistence. A failed
//! write is logged and the merged result is still returned.

mod request;

pub use request::{AnalyzeRequest, ValidatedRequest};

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::config::UpstreamConfig;
use crate::normalize::{
    MergedResult, RawAgentResponse, RawPayloads, merge, normalize_findings, normalize_score,
};
use crate::storage::{RunStore, SharedDatabase};
use crate::types::{AgentKind, Result, ReviewError, RunId, coerce_string, is_truthy};
use crate::upstream::{LawFinderRequest, RiskEvaluatorRequest, UpstreamClient, UpstreamReply};

/// Result of one review
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub result: MergedResult,
    /// `None` when persistence is disabled or the write failed
    pub run_id: Option<RunId>,
}

/// Review pipeline orchestrator
///
/// Shares only immutable configuration, the upstream client and the
/// connection pool, so one instance serves every concurrent request.
#[derive(Clone)]
pub struct ReviewPipeline {
    upstream: UpstreamClient,
    config: UpstreamConfig,
    database: Option<SharedDatabase>,
}

impl ReviewPipeline {
    pub fn new(upstream: UpstreamClient, config: UpstreamConfig) -> Self {
        Self {
            upstream,
            config,
            database: None,
        }
    }

    /// Persist every successful review into `database`
    pub fn with_database(mut self, database: SharedDatabase) -> Self {
        self.database = Some(database);
        self
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Run a full review.
    #[instrument(skip_all)]
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<ReviewOutcome> {
        let request = request.validate()?;
        info!(
            "Analyzing '{}' for regions {:?}",
            request.title, request.regions
        );

        // 1) Law finder
        let law_payload = LawFinderRequest::new(
            &request.title,
            &request.description,
            &request.regions,
            self.config.min_year,
        );
        let agent1 = self
            .call(AgentKind::LawFinder, serde_json::to_value(&law_payload)?)
            .await?;
        let agent1 = RawAgentResponse::new(agent1);
        let findings = normalize_findings(&agent1);
        debug!(
            "Agent1: {} sources, {} regulations",
            findings.raw_sources.len(),
            findings.regulations_hit.len()
        );

        // 2) Risk evaluator, fed with agent 1's sources
        let risk_payload = RiskEvaluatorRequest::new(
            self.index_id(&agent1),
            findings.raw_sources.clone(),
            &request.title,
            &request.description,
            self.config.use_gemini,
        );
        let agent2 = self
            .call(AgentKind::RiskEvaluator, serde_json::to_value(&risk_payload)?)
            .await?;
        let agent2 = RawAgentResponse::new(agent2);
        let assessment = normalize_score(&agent2);

        // 3) Merge
        let result = merge(
            &findings,
            assessment,
            RawPayloads {
                agent1: agent1.into_inner(),
                agent2: agent2.into_inner(),
            },
        );

        // 4) Persist
        let run_id = self.persist(&request.title, &result).await;

        Ok(ReviewOutcome { result, run_id })
    }

    /// POST to an agent; a non-2xx reply ends the review.
    async fn call(&self, agent: AgentKind, payload: Value) -> Result<Value> {
        let UpstreamReply { status, body } = self.upstream.call(agent, &payload).await?;

        if !(200..300).contains(&status) {
            error!("{} returned non-2xx: {}", agent, status);
            return Err(ReviewError::UpstreamRejected {
                agent,
                status,
                body,
            });
        }
        Ok(body)
    }

    fn index_id(&self, agent1: &RawAgentResponse) -> String {
        agent1
            .field("index_id")
            .filter(|v| is_truthy(v))
            .map(coerce_string)
            .unwrap_or_else(|| self.config.default_index_id.clone())
    }

    async fn persist(&self, title: &str, result: &MergedResult) -> Option<RunId> {
        let database = self.database.clone()?;
        let title = title.to_string();
        let result = result.clone();

        let written = tokio::task::spawn_blocking(move || {
            RunStore::new(&database).record_run(&title, &result)
        })
        .await;

        match written {
            Ok(Ok(run_id)) => Some(run_id),
            Ok(Err(e)) => {
                error!("Failed to persist analysis run: {}", e);
                None
            }
            Err(e) => {
                error!("Persistence task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::upstream::{AgentTransport, SharedTransport};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replies per agent, recording every payload it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: HashMap<AgentKind, Result<UpstreamReply>>,
        calls: Mutex<Vec<(AgentKind, Value)>>,
    }

    impl ScriptedTransport {
        fn reply(mut self, agent: AgentKind, status: u16, body: Value) -> Self {
            self.replies
                .insert(agent, Ok(UpstreamReply::new(status, body)));
            self
        }

        fn unreachable(mut self, agent: AgentKind) -> Self {
            self.replies.insert(
                agent,
                Err(ReviewError::unreachable(agent, "connection refused", false)),
            );
            self
        }

        fn calls(&self) -> Vec<(AgentKind, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentTransport for ScriptedTransport {
        async fn post_json(
            &self,
            agent: AgentKind,
            _url: &str,
            payload: &Value,
            _timeout: Duration,
        ) -> Result<UpstreamReply> {
            self.calls.lock().unwrap().push((agent, payload.clone()));
            match self.replies.get(&agent) {
                Some(Ok(reply)) => Ok(reply.clone()),
                Some(Err(_)) => Err(ReviewError::unreachable(agent, "connection refused", false)),
                None => Ok(UpstreamReply::new(200, Value::Null)),
            }
        }
    }

    fn pipeline(transport: Arc<ScriptedTransport>) -> ReviewPipeline {
        let config = UpstreamConfig::default();
        let shared: SharedTransport = transport;
        ReviewPipeline::new(UpstreamClient::new(shared, &config), config)
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest::new(
            "Curfew blocker",
            "Blocks logins for minors",
            vec!["Utah".to_string()],
        )
    }

    fn agent1_body() -> Value {
        json!({
            "index_id": "idx-42",
            "sources": [{"url": "https://le.utah.gov/sb152", "title": "SB 152"}],
            "regions_hit": ["Utah"],
            "regulations_hit": ["Utah Social Media Regulation Act"]
        })
    }

    fn agent2_body() -> Value {
        json!({
            "risk_score": 72,
            "why": [{"issue": "Curfew", "severity": "high", "rationale": "Login curfew required"}],
            "regulations_hit": ["COPPA"],
            "audit_citations": [{"label": "SB 152", "url": "https://le.utah.gov/sb152"}]
        })
    }

    #[tokio::test]
    async fn test_full_review() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(AgentKind::LawFinder, 200, agent1_body())
                .reply(AgentKind::RiskEvaluator, 200, agent2_body()),
        );
        let outcome = pipeline(transport.clone()).analyze(&request()).await.unwrap();

        let result = outcome.result;
        assert_eq!(result.score.value, 72.0);
        assert_eq!(result.score.rationale, "• Curfew [high]: Login curfew required");
        assert_eq!(
            result.findings.regulations_hit,
            vec!["Utah Social Media Regulation Act", "COPPA"]
        );
        assert_eq!(result.findings.evidence_urls, vec!["https://le.utah.gov/sb152"]);
        assert_eq!(result.raw.agent1, agent1_body());
        assert!(outcome.run_id.is_none());

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].1,
            json!({
                "feature_summary": "Curfew blocker\n\nBlocks logins for minors",
                "regions": ["Utah"],
                "min_year": 2023
            })
        );
        assert_eq!(calls[1].1["law_agent_input"]["index_id"], json!("idx-42"));
        assert_eq!(
            calls[1].1["law_agent_input"]["sources"],
            agent1_body()["sources"]
        );
        assert_eq!(calls[1].1["user_policy"]["topic"], json!("Curfew blocker"));
        assert_eq!(calls[1].1["use_gemini"], json!(false));
    }

    #[tokio::test]
    async fn test_default_index_id_and_region() {
        let transport = Arc::new(ScriptedTransport::default());
        let request = AnalyzeRequest::new("t", "d", Vec::new());
        let outcome = pipeline(transport.clone()).analyze(&request).await.unwrap();

        assert_eq!(outcome.result.score.value, 0.0);
        assert_eq!(outcome.result.score.rationale, "No rationale provided");

        let calls = transport.calls();
        assert_eq!(calls[0].1["regions"], json!(["global"]));
        assert_eq!(
            calls[1].1["law_agent_input"],
            json!({"index_id": "dynamic-index", "sources": []})
        );
    }

    #[tokio::test]
    async fn test_agent1_rejection_skips_agent2() {
        let transport = Arc::new(ScriptedTransport::default().reply(
            AgentKind::LawFinder,
            500,
            json!({"detail": "index offline"}),
        ));
        let err = pipeline(transport.clone())
            .analyze(&request())
            .await
            .unwrap_err();

        match err {
            ReviewError::UpstreamRejected {
                agent,
                status,
                body,
            } => {
                assert_eq!(agent, AgentKind::LawFinder);
                assert_eq!(status, 500);
                assert_eq!(body, json!({"detail": "index offline"}));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_agent2_unreachable() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(AgentKind::LawFinder, 200, agent1_body())
                .unreachable(AgentKind::RiskEvaluator),
        );
        let err = pipeline(transport).analyze(&request()).await.unwrap_err();
        assert_eq!(err.agent(), Some(AgentKind::RiskEvaluator));
        assert!(matches!(err, ReviewError::UpstreamUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_call() {
        let transport = Arc::new(ScriptedTransport::default());
        let err = pipeline(transport.clone())
            .analyze(&AnalyzeRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_review_is_persisted() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.initialize().unwrap();

        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(AgentKind::LawFinder, 200, agent1_body())
                .reply(AgentKind::RiskEvaluator, 200, agent2_body()),
        );
        let outcome = pipeline(transport)
            .with_database(db.clone())
            .analyze(&request())
            .await
            .unwrap();

        let run_id = outcome.run_id.unwrap();
        let runs = RunStore::new(&db).list_recent_runs(10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, run_id);
        assert_eq!(runs[0].risk_score.as_deref(), Some("72"));
        assert_eq!(
            runs[0].regulations,
            vec!["Utah Social Media Regulation Act", "COPPA"]
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_still_returns_result() {
        // Schema never initialized, so the insert fails
        let db = Arc::new(Database::open_in_memory().unwrap());

        let transport = Arc::new(
            ScriptedTransport::default()
                .reply(AgentKind::LawFinder, 200, agent1_body())
                .reply(AgentKind::RiskEvaluator, 200, agent2_body()),
        );
        let outcome = pipeline(transport)
            .with_database(db)
            .analyze(&request())
            .await
            .unwrap();

        assert!(outcome.run_id.is_none());
        assert_eq!(outcome.result.score.value, 72.0);
    }
}
