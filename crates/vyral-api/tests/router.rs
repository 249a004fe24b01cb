//! HTTP surface tests: authentication, validation and status mapping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use vyral_api::{create_router, ApiConfig, AppState, OperationCatalog};
use vyral_cache::MemoryCache;
use vyral_models::{AsyncJobSnapshot, JobHandle, JobRequest, Operation};
use vyral_orchestrator::{OperationDescriptor, Orchestrator, OrchestratorConfig};
use vyral_providers::{AsyncProvider, Candidate, Provider, ProviderError, ProviderResult};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "test-secret";

struct StubProvider {
    outcome: Result<Value, String>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new(outcome: Result<Value, String>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Candidate for StubProvider {
    fn id(&self) -> &str {
        "stub"
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn invoke(&self, _request: &JobRequest) -> ProviderResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(ProviderError::reported)
    }
}

/// Accepts every submission and never finishes.
struct StuckRender {
    checks: AtomicUsize,
}

impl Candidate for StuckRender {
    fn id(&self) -> &str {
        "stuck"
    }
}

#[async_trait]
impl AsyncProvider for StuckRender {
    async fn submit(&self, _request: &JobRequest) -> ProviderResult<JobHandle> {
        Ok(JobHandle::new("stuck", "render-1"))
    }

    async fn status(&self, _handle: &JobHandle) -> ProviderResult<AsyncJobSnapshot> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(AsyncJobSnapshot::running())
    }
}

fn app(strategy: Arc<StubProvider>, captions: Arc<StubProvider>) -> Router {
    let config = ApiConfig {
        worker_secret: SECRET.to_string(),
        ..Default::default()
    };
    let orchestrator =
        Orchestrator::new(Arc::new(MemoryCache::new()), &OrchestratorConfig::default()).unwrap();
    let catalog = OperationCatalog::new()
        .with(
            Operation::Strategy,
            OperationDescriptor::direct("strategy", vec![strategy as Arc<dyn Provider>]),
        )
        .with(
            Operation::PlatformCaptions,
            OperationDescriptor::direct("platform-captions", vec![captions as Arc<dyn Provider>]),
        );

    create_router(AppState::new(config, orchestrator, catalog), None)
}

fn default_app() -> Router {
    app(
        StubProvider::new(Ok(json!({"strategy_text": "go"}))),
        StubProvider::new(Err("caption model down".to_string())),
    )
}

fn post(path: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (status, body) = send(default_app(), post("/strategy", None, r#"{"transcript":"x"}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized_before_validation() {
    let strategy = StubProvider::new(Ok(json!({})));
    let app = app(Arc::clone(&strategy), StubProvider::new(Ok(json!({}))));

    let (status, body) = send(app, post("/strategy", Some("nope"), "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (status, body) = send(default_app(), post("/nope", None, "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_unregistered_operation_is_not_found() {
    let (status, _) = send(
        default_app(),
        post("/vision", Some(SECRET), r#"{"file_url":"https://cdn.example.com/a.jpg"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_required_fields() {
    let (status, body) = send(default_app(), post("/strategy", Some(SECRET), "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "transcript is required"}));

    let (status, body) = send(
        default_app(),
        post("/platform-captions", Some(SECRET), r#"{"transcript":"x","platform":""}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "transcript and platform are required");

    let (status, body) = send(default_app(), post("/micro-clips", Some(SECRET), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "file_url and transcript are required");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (status, body) =
        send(default_app(), post("/strategy", Some(SECRET), r#"{"transcript":"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_private_webhook_url_is_rejected() {
    let strategy = StubProvider::new(Ok(json!({})));
    let app = app(Arc::clone(&strategy), StubProvider::new(Ok(json!({}))));

    let (status, body) = send(
        app,
        post(
            "/strategy",
            Some(SECRET),
            r#"{"transcript":"x","webhook_url":"http://169.254.169.254/latest"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid webhook_url"));
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_completed_job_is_ok() {
    let (status, body) = send(
        default_app(),
        post("/strategy", Some(SECRET), r#"{"transcript":"x","job_id":"job-7"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"job_id": "job-7", "status": "completed", "result": {"strategy_text": "go"}})
    );
}

#[tokio::test]
async fn test_failed_job_is_server_error() {
    let (status, body) = send(
        default_app(),
        post("/platform-captions", Some(SECRET), r#"{"transcript":"x","platform":"tiktok"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"job_id": null, "status": "failed", "error": "caption model down"})
    );
}

#[tokio::test]
async fn test_health_and_ready() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(default_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["cache"]["backend"], "memory");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "req-123");
    assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
}

#[tokio::test]
async fn test_client_disconnect_cancels_polling_and_notifies_webhook() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(json!({
            "job_id": "render-9",
            "status": "failed",
            "error": "Job cancelled"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;

    let render = Arc::new(StuckRender {
        checks: AtomicUsize::new(0),
    });
    let config = ApiConfig {
        worker_secret: SECRET.to_string(),
        allow_private_webhooks: true,
        ..Default::default()
    };
    let orchestrator_config = OrchestratorConfig {
        poll_interval: Duration::from_millis(10),
        max_poll_ticks: 10_000,
        ..Default::default()
    };
    let orchestrator =
        Orchestrator::new(Arc::new(MemoryCache::new()), &orchestrator_config).unwrap();
    let catalog = OperationCatalog::new().with(
        Operation::RenderCaptions,
        OperationDescriptor::polled(
            "render-captions",
            vec![Arc::clone(&render) as Arc<dyn AsyncProvider>],
        ),
    );
    let app = create_router(AppState::new(config, orchestrator, catalog), None);

    let body = json!({
        "file_url": "https://cdn.example.com/v.mp4",
        "captions": "Hi",
        "job_id": "render-9",
        "webhook_url": format!("{}/hook", webhook.uri())
    })
    .to_string();

    // The client gives up while the render is still running
    let dropped = tokio::time::timeout(
        Duration::from_millis(100),
        app.oneshot(post("/render-captions", Some(SECRET), &body)),
    )
    .await;
    assert!(dropped.is_err());
    assert!(render.checks.load(Ordering::SeqCst) > 0);

    let mut delivered = 0;
    for _ in 0..100 {
        delivered = webhook.received_requests().await.unwrap_or_default().len();
        if delivered > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(delivered, 1);

    // Polling stopped with the request
    let checks = render.checks.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(render.checks.load(Ordering::SeqCst), checks);
}
