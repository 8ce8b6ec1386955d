//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::error;

use super::AppState;
use super::error::ApiError;
use crate::constants::storage::RECENT_RUNS_LIMIT;
use crate::normalize::MergedResult;
use crate::pipeline::AnalyzeRequest;
use crate::storage::RunStore;
use crate::types::{AgentKind, ReviewError, ValidationError, ValidationErrorKind};
use crate::upstream::{LawFinderRequest, RiskEvaluatorRequest, summarize_sources};

pub async fn routes() -> Json<Value> {
    let routes: Vec<Value> = super::ROUTES
        .iter()
        .map(|(method, path)| json!({ "path": path, "methods": [method] }))
        .collect();
    Json(json!({ "routes": routes }))
}

pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let upstream = &state.config.upstream;
    Json(json!({
        "ok": true,
        "port": state.config.server.port,
        "agent1": upstream.law_finder.url,
        "agent2": upstream.risk_evaluator.url,
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    req: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<MergedResult>, ApiError> {
    let Json(req) = req.map_err(|e| {
        ReviewError::from(ValidationError::new(
            ValidationErrorKind::Format,
            format!("Invalid JSON body: {}", e),
        ))
    })?;

    let outcome = state.pipeline.analyze(&req).await?;
    Ok(Json(outcome.result))
}

pub async fn feature_runs(State(state): State<AppState>) -> Response {
    let Some(database) = state.database.clone() else {
        error!("[/feature-runs] no database configured");
        return runs_failure();
    };

    let listed = tokio::task::spawn_blocking(move || {
        RunStore::new(&database).list_recent_runs(RECENT_RUNS_LIMIT)
    })
    .await;

    match listed {
        Ok(Ok(runs)) => Json(json!({ "ok": true, "runs": runs })).into_response(),
        Ok(Err(e)) => {
            error!("[/feature-runs] DB error: {}", e);
            runs_failure()
        }
        Err(e) => {
            error!("[/feature-runs] task failed: {}", e);
            runs_failure()
        }
    }
}

fn runs_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": "Failed to fetch feature runs" })),
    )
        .into_response()
}

pub async fn echo(body: Bytes) -> Response {
    match parse_body(&body) {
        Ok(received) => Json(json!({
            "ok": true,
            "received": received.unwrap_or_else(|| json!({})),
        }))
        .into_response(),
        Err(response) => response,
    }
}

pub async fn law_finder_probe(State(state): State<AppState>, body: Bytes) -> Response {
    probe(&state, AgentKind::LawFinder, &body).await
}

pub async fn risk_evaluator_probe(State(state): State<AppState>, body: Bytes) -> Response {
    probe(&state, AgentKind::RiskEvaluator, &body).await
}

/// Forward a caller-supplied (or sample) payload to one agent and report
/// exactly what came back.
async fn probe(state: &AppState, agent: AgentKind, body: &[u8]) -> Response {
    let sent = match parse_body(body) {
        Ok(Some(payload)) => payload,
        Ok(None) => sample_payload(agent),
        Err(response) => return response,
    };

    let upstream = state.pipeline.upstream();
    let url = upstream.endpoint(agent).url.clone();

    match upstream.probe(agent, &sent).await {
        Ok(reply) => {
            let sent = match agent {
                AgentKind::LawFinder => sent,
                AgentKind::RiskEvaluator => summarize_sources(&sent),
            };
            Json(json!({
                "ok": reply.is_success(),
                "status": reply.status,
                "url": url,
                "sent": sent,
                "data": reply.body,
            }))
            .into_response()
        }
        Err(e) => {
            error!("[{} probe] upstream error: {}", agent.as_str(), e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "ok": false, "url": url, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

fn sample_payload(agent: AgentKind) -> Value {
    let sample = match agent {
        AgentKind::LawFinder => serde_json::to_value(LawFinderRequest::sample()),
        AgentKind::RiskEvaluator => serde_json::to_value(RiskEvaluatorRequest::sample()),
    };
    sample.unwrap_or(Value::Null)
}

/// `None` for an empty body, `null` or `{}`; 400 for anything unparseable.
fn parse_body(body: &[u8]) -> Result<Option<Value>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Invalid JSON body: {}", e) })),
        )
            .into_response()
    })?;

    match &value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        _ => Ok(Some(value)),
    }
}
