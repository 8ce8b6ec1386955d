//! HTTP Service
//!
//! axum router exposing the review pipeline:
//!
//! | route | purpose |
//! |---|---|
//! | `GET /__routes` | list of these routes |
//! | `GET /healthz` | liveness plus configured agent URLs |
//! | `POST /analyze` | run a review |
//! | `GET /feature-runs` | latest persisted runs |
//! | `POST /echo` | echo the parsed body |
//! | `POST /a1-test`, `POST /a2-test` | probe one agent directly |

mod error;
mod handlers;

pub use error::ApiError;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::{Config, ServerConfig};
use crate::pipeline::ReviewPipeline;
use crate::storage::SharedDatabase;
use crate::types::{Result, ReviewError};

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: ReviewPipeline,
    pub database: Option<SharedDatabase>,
}

impl AppState {
    pub fn new(config: Config, pipeline: ReviewPipeline, database: Option<SharedDatabase>) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            database,
        }
    }
}

/// Method and path of every route, listed by `GET /__routes`
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/__routes"),
    ("GET", "/healthz"),
    ("POST", "/analyze"),
    ("GET", "/feature-runs"),
    ("POST", "/echo"),
    ("POST", "/a1-test"),
    ("POST", "/a2-test"),
];

/// Build the application router
pub fn router(state: AppState) -> Router {
    let server = &state.config.server;
    let body_limit = server.body_limit_bytes;
    let cors = cors_layer(server);

    Router::new()
        .route("/__routes", get(handlers::routes))
        .route("/healthz", get(handlers::healthz))
        .route("/analyze", post(handlers::analyze))
        .route("/feature-runs", get(handlers::feature_runs))
        .route("/echo", post(handlers::echo))
        .route("/a1-test", post(handlers::law_finder_probe))
        .route("/a2-test", post(handlers::risk_evaluator_probe))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn log_request(req: Request, next: Next) -> Response {
    info!(method = %req.method(), path = %req.uri().path(), "request");
    next.run(req).await
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.server.bind_address();
    let upstream = &state.config.upstream;
    info!(
        "complyflow listening on http://{} (agent1: {}, agent2: {})",
        address, upstream.law_finder.url, upstream.risk_evaluator.url
    );

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ReviewError::Io)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::storage::{Database, RunStore};
    use crate::types::AgentKind;
    use crate::upstream::{AgentTransport, SharedTransport, UpstreamClient, UpstreamReply};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Fixed reply per agent, `None` meaning unreachable.
    struct FakeTransport {
        agent1: Option<UpstreamReply>,
        agent2: Option<UpstreamReply>,
        calls: Mutex<Vec<(AgentKind, Value, Duration)>>,
    }

    impl FakeTransport {
        fn new(agent1: Option<UpstreamReply>, agent2: Option<UpstreamReply>) -> Arc<Self> {
            Arc::new(Self {
                agent1,
                agent2,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(AgentKind, Value, Duration)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentTransport for FakeTransport {
        async fn post_json(
            &self,
            agent: AgentKind,
            _url: &str,
            payload: &Value,
            timeout: Duration,
        ) -> Result<UpstreamReply> {
            self.calls
                .lock()
                .unwrap()
                .push((agent, payload.clone(), timeout));
            let reply = match agent {
                AgentKind::LawFinder => &self.agent1,
                AgentKind::RiskEvaluator => &self.agent2,
            };
            reply
                .clone()
                .ok_or_else(|| ReviewError::unreachable(agent, "connection refused", false))
        }
    }

    fn ok(body: Value) -> Option<UpstreamReply> {
        Some(UpstreamReply::new(200, body))
    }

    fn app(transport: Arc<FakeTransport>, database: Option<SharedDatabase>) -> Router {
        let config = Config::default();
        let shared: SharedTransport = transport;
        let mut pipeline = ReviewPipeline::new(
            UpstreamClient::new(shared, &config.upstream),
            config.upstream.clone(),
        );
        if let Some(db) = &database {
            pipeline = pipeline.with_database(db.clone());
        }
        router(AppState::new(config, pipeline, database))
    }

    fn memory_db() -> SharedDatabase {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        Arc::new(db)
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn review_body() -> String {
        json!({"title": "Curfew blocker", "description": "Blocks logins", "regions": ["Utah"]})
            .to_string()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = send(app(FakeTransport::new(None, None), None), "GET", "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["port"], json!(5050));
        assert_eq!(body["agent1"], json!(UpstreamConfig::default().law_finder.url));
    }

    #[tokio::test]
    async fn test_analyze_missing_fields() {
        let transport = FakeTransport::new(None, None);
        let (status, body) = send(
            app(transport.clone(), None),
            "POST",
            "/analyze",
            r#"{"title": "only a title"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Missing required fields: title, description"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_unparseable_body() {
        let (status, body) = send(
            app(FakeTransport::new(None, None), None),
            "POST",
            "/analyze",
            "{not json",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid JSON body")
        );
    }

    #[tokio::test]
    async fn test_route_listing_matches_router() {
        let (status, body) = send(
            app(FakeTransport::new(None, None), None),
            "GET",
            "/__routes",
            "",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let listed = body["routes"].as_array().unwrap();
        assert_eq!(listed.len(), ROUTES.len());
        assert!(listed.contains(&json!({"path": "/analyze", "methods": ["POST"]})));
        assert!(listed.contains(&json!({"path": "/feature-runs", "methods": ["GET"]})));

        for (method, path) in ROUTES {
            let (status, _) = send(
                app(FakeTransport::new(None, None), None),
                method,
                path,
                "{}",
            )
            .await;
            assert_ne!(status, StatusCode::NOT_FOUND, "{} {}", method, path);
            assert_ne!(status, StatusCode::METHOD_NOT_ALLOWED, "{} {}", method, path);
        }
    }

    #[tokio::test]
    async fn test_analyze_success_and_history() {
        let db = memory_db();
        let transport = FakeTransport::new(
            ok(json!({"regions_hit": ["EU", "US"], "sources": [{"url": "https://eur-lex.example/dsa"}]})),
            ok(json!({"score": {"value": 17}, "regions": ["US", "KR"], "regulations_hit": "DSA"})),
        );
        let router = app(transport.clone(), Some(db.clone()));

        let (status, body) = send(router.clone(), "POST", "/analyze", &review_body()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["findings"]["regions_hit"], json!(["EU", "US", "KR"]));
        assert_eq!(body["findings"]["regulations_hit"], json!(["DSA"]));
        assert_eq!(body["findings"]["evidence_urls"], json!(["https://eur-lex.example/dsa"]));
        assert_eq!(body["score"]["value"], json!(17.0));
        assert_eq!(body["raw"]["agent2"]["score"], json!({"value": 17}));

        // Pipeline calls use the pipeline timeouts
        let calls = transport.calls();
        assert_eq!(calls[0].2, Duration::from_secs(20));
        assert_eq!(calls[1].2, Duration::from_secs(25));

        let (status, body) = send(router, "GET", "/feature-runs", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["runs"][0]["feature_name"], json!("Curfew blocker"));
        assert_eq!(body["runs"][0]["risk_score"], json!("17"));
        assert_eq!(RunStore::new(&db).list_recent_runs(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_agent1_rejected() {
        let transport = FakeTransport::new(
            Some(UpstreamReply::new(500, json!({"detail": "boom"}))),
            ok(json!({})),
        );
        let (status, body) =
            send(app(transport.clone(), None), "POST", "/analyze", &review_body()).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], json!("Agent1 returned non-2xx"));
        assert_eq!(body["status"], json!(500));
        assert_eq!(body["data"], json!({"detail": "boom"}));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, AgentKind::LawFinder);
    }

    #[tokio::test]
    async fn test_analyze_agent2_unreachable() {
        let transport = FakeTransport::new(ok(json!({})), None);
        let (status, body) = send(app(transport, None), "POST", "/analyze", &review_body()).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], json!("Agent2 unreachable"));
        assert_eq!(body["agent"], json!("agent2"));
    }

    #[tokio::test]
    async fn test_feature_runs_without_database() {
        let (status, body) =
            send(app(FakeTransport::new(None, None), None), "GET", "/feature-runs", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"ok": false, "error": "Failed to fetch feature runs"})
        );
    }

    #[tokio::test]
    async fn test_echo() {
        let router = app(FakeTransport::new(None, None), None);
        let (status, body) = send(router.clone(), "POST", "/echo", r#"{"a": [1, 2]}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "received": {"a": [1, 2]}}));

        let (_, body) = send(router, "POST", "/echo", "").await;
        assert_eq!(body, json!({"ok": true, "received": {}}));
    }

    #[tokio::test]
    async fn test_law_finder_probe_uses_sample_and_probe_timeout() {
        let transport = FakeTransport::new(
            Some(UpstreamReply::new(404, json!("Not Found"))),
            None,
        );
        let (status, body) = send(app(transport.clone(), None), "POST", "/a1-test", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["status"], json!(404));
        assert_eq!(body["data"], json!("Not Found"));
        assert_eq!(body["sent"]["regions"], json!(["Utah"]));

        let calls = transport.calls();
        assert_eq!(calls[0].2, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_risk_evaluator_probe_summarizes_sources() {
        let transport = FakeTransport::new(None, ok(json!({"risk_score": 3})));
        let (status, body) = send(app(transport.clone(), None), "POST", "/a2-test", "{}").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["sent"]["law_agent_input"]["sources"], json!("( 1 items )"));

        // The agent itself received the full source list
        let calls = transport.calls();
        assert!(calls[0].1["law_agent_input"]["sources"].is_array());
        assert_eq!(calls[0].2, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let (status, body) =
            send(app(FakeTransport::new(None, None), None), "POST", "/a1-test", "").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/analyze")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(FakeTransport::new(None, None), None)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }
}
