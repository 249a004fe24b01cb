//! End-to-end orchestration tests with in-process providers and cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use vyral_cache::{fingerprint, CacheError, CacheResult, CacheStore, MemoryCache};
use vyral_models::{AsyncJobSnapshot, JobHandle, JobRequest, JobStatus, Operation, Params};
use vyral_orchestrator::{
    CancellationToken, OperationDescriptor, Orchestrator, OrchestratorConfig, Sleeper,
};
use vyral_providers::{AsyncProvider, Candidate, Provider, ProviderError, ProviderResult};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct SpyProvider {
    id: String,
    outcome: Result<Value, String>,
    calls: AtomicUsize,
}

impl SpyProvider {
    fn ok(id: &str, value: Value) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            outcome: Ok(value),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(id: &str, msg: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            outcome: Err(msg.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Candidate for SpyProvider {
    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl Provider for SpyProvider {
    async fn invoke(&self, _request: &JobRequest) -> ProviderResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(ProviderError::reported)
    }
}

/// Accepts (or rejects) submissions and replays statuses in order.
struct ScriptedJob {
    id: String,
    accept: bool,
    statuses: Mutex<Vec<AsyncJobSnapshot>>,
    submits: AtomicUsize,
    checks: AtomicUsize,
}

impl ScriptedJob {
    fn accepting(id: &str, statuses: Vec<AsyncJobSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            accept: true,
            statuses: Mutex::new(statuses),
            submits: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
        })
    }

    fn rejecting(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            accept: false,
            statuses: Mutex::new(Vec::new()),
            submits: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
        })
    }
}

impl Candidate for ScriptedJob {
    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl AsyncProvider for ScriptedJob {
    async fn submit(&self, _request: &JobRequest) -> ProviderResult<JobHandle> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.accept {
            Ok(JobHandle::new(self.id.clone(), "job-1"))
        } else {
            Err(ProviderError::reported(format!("{} rejected the job", self.id)))
        }
    }

    async fn status(&self, handle: &JobHandle) -> ProviderResult<AsyncJobSnapshot> {
        assert_eq!(handle.provider, self.id);
        self.checks.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        Ok(if statuses.len() > 1 {
            statuses.remove(0)
        } else {
            statuses.first().cloned().unwrap_or_default()
        })
    }
}

struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Cache whose every call fails.
struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError::connection_failed("connection refused"))
    }

    async fn put(&self, _key: &str, _value: &Value, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::connection_failed("connection refused"))
    }
}

fn orchestrator(cache: Arc<dyn CacheStore>) -> Orchestrator {
    Orchestrator::with_sleeper(cache, &OrchestratorConfig::default(), Arc::new(InstantSleeper))
        .unwrap()
}

fn strategy_descriptor(candidates: Vec<Arc<dyn Provider>>) -> OperationDescriptor {
    OperationDescriptor::direct("strategy", candidates).cached(
        "generate",
        &["transcript", "platform_preferences"],
        Duration::from_secs(3600),
    )
}

fn strategy_request() -> JobRequest {
    JobRequest::from_body(
        Operation::Strategy,
        json!({"transcript": "Hello world", "job_id": "j-1"}),
    )
    .unwrap()
}

fn strategy_key() -> String {
    let mut params = Params::new();
    params.insert("transcript".into(), json!("Hello world"));
    fingerprint("strategy", "generate", &params)
}

#[tokio::test]
async fn test_miss_runs_provider_and_stores_result() {
    let cache = Arc::new(MemoryCache::new());
    let provider = SpyProvider::ok("m1", json!({"strategy_text": "S"}));
    let descriptor = strategy_descriptor(vec![provider.clone()]);

    let run = orchestrator(cache.clone())
        .run(&strategy_request(), &descriptor, CancellationToken::new())
        .await;

    assert_eq!(run.outcome.status, JobStatus::Completed);
    assert_eq!(run.outcome.job_id.as_ref().unwrap().as_str(), "j-1");
    assert_eq!(run.outcome.result, Some(json!({"strategy_text": "S"})));
    assert!(run.delivery.is_none());
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        cache.ttl_of(&strategy_key()).await,
        Some(Duration::from_secs(3600))
    );
}

#[tokio::test]
async fn test_repeat_is_served_from_cache() {
    let cache = Arc::new(MemoryCache::new());
    let provider = SpyProvider::ok("m1", json!({"strategy_text": "S"}));
    let descriptor = strategy_descriptor(vec![provider.clone()]);
    let orchestrator = orchestrator(cache.clone());

    let first = orchestrator
        .run(&strategy_request(), &descriptor, CancellationToken::new())
        .await;
    let second = orchestrator
        .run(&strategy_request(), &descriptor, CancellationToken::new())
        .await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(first.outcome, second.outcome);
}

#[tokio::test]
async fn test_cache_hit_makes_no_provider_calls() {
    let cache = Arc::new(MemoryCache::new());
    cache
        .put(&strategy_key(), &json!(false), Duration::from_secs(60))
        .await
        .unwrap();
    let provider = SpyProvider::ok("m1", json!("fresh"));

    let run = orchestrator(cache)
        .run(
            &strategy_request(),
            &strategy_descriptor(vec![provider.clone()]),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(run.outcome.result, Some(json!(false)));
}

#[tokio::test]
async fn test_param_key_order_shares_cache_entry() {
    let cache = Arc::new(MemoryCache::new());
    let provider = SpyProvider::ok("m1", json!("r"));
    let descriptor = strategy_descriptor(vec![provider.clone()]);
    let orchestrator = orchestrator(cache);

    let a = JobRequest::from_body(
        Operation::Strategy,
        json!({"transcript": "t", "platform_preferences": ["tiktok"], "job_id": "a"}),
    )
    .unwrap();
    let b = JobRequest::from_body(
        Operation::Strategy,
        json!({"job_id": "b", "platform_preferences": ["tiktok"], "transcript": "t"}),
    )
    .unwrap();

    orchestrator.run(&a, &descriptor, CancellationToken::new()).await;
    let second = orchestrator.run(&b, &descriptor, CancellationToken::new()).await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(second.outcome.job_id.unwrap().as_str(), "b");
}

#[tokio::test]
async fn test_all_failing_providers_notify_webhook_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(json!({
            "job_id": "j-1",
            "status": "failed",
            "error": "gpt-3.5 unavailable"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let a = SpyProvider::failing("gpt-4", "gpt-4 unavailable");
    let b = SpyProvider::failing("claude", "claude unavailable");
    let c = SpyProvider::failing("gpt-3.5", "gpt-3.5 unavailable");
    let descriptor = strategy_descriptor(vec![a.clone(), b.clone(), c.clone()]);
    let request = strategy_request().with_webhook_url(format!("{}/hook", server.uri()));

    let run = orchestrator(cache.clone())
        .run(&request, &descriptor, CancellationToken::new())
        .await;

    assert_eq!(run.outcome.status, JobStatus::Failed);
    assert_eq!(run.outcome.error.as_deref(), Some("gpt-3.5 unavailable"));
    assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
    assert!(cache.is_empty().await);

    run.delivery.unwrap().await.unwrap();
}

#[tokio::test]
async fn test_webhook_failure_does_not_change_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SpyProvider::ok("m1", json!({"ok": 1}));
    let request = strategy_request().with_webhook_url(server.uri());

    let run = orchestrator(Arc::new(MemoryCache::new()))
        .run(&request, &strategy_descriptor(vec![provider]), CancellationToken::new())
        .await;

    assert_eq!(run.outcome.status, JobStatus::Completed);
    assert!(run.delivery.unwrap().await.is_ok());
}

#[tokio::test]
async fn test_cache_errors_degrade_to_miss() {
    let provider = SpyProvider::ok("m1", json!("r"));

    let run = orchestrator(Arc::new(BrokenCache))
        .run(
            &strategy_request(),
            &strategy_descriptor(vec![provider.clone()]),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(run.outcome.status, JobStatus::Completed);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_empty_candidate_list_fails() {
    let run = orchestrator(Arc::new(MemoryCache::new()))
        .run(
            &strategy_request(),
            &strategy_descriptor(Vec::new()),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(run.outcome.status, JobStatus::Failed);
    assert_eq!(
        run.outcome.error.as_deref(),
        Some("No providers configured for this operation")
    );
}

#[tokio::test]
async fn test_polled_job_submits_with_fallback_then_polls() {
    let cache = Arc::new(MemoryCache::new());
    let rejecting = ScriptedJob::rejecting("primary");
    let accepting = ScriptedJob::accepting(
        "secondary",
        vec![
            AsyncJobSnapshot::pending(),
            AsyncJobSnapshot::running(),
            AsyncJobSnapshot::done(json!({"transcript": "hi"})),
        ],
    );
    let descriptor =
        OperationDescriptor::polled("transcribe", vec![rejecting.clone(), accepting.clone()]);
    let request =
        JobRequest::from_body(Operation::Transcribe, json!({"file_url": "https://cdn/a.mp3"}))
            .unwrap();

    let run = orchestrator(cache.clone())
        .run(&request, &descriptor, CancellationToken::new())
        .await;

    assert_eq!(run.outcome.result, Some(json!({"transcript": "hi"})));
    assert_eq!(rejecting.submits.load(Ordering::SeqCst), 1);
    assert_eq!(accepting.checks.load(Ordering::SeqCst), 3);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_polled_job_timeout() {
    let job = ScriptedJob::accepting("render", vec![AsyncJobSnapshot::pending()]);
    let config = OrchestratorConfig {
        max_poll_ticks: 3,
        ..Default::default()
    };
    let orchestrator = Orchestrator::with_sleeper(
        Arc::new(MemoryCache::new()),
        &config,
        Arc::new(InstantSleeper),
    )
    .unwrap();
    let request = JobRequest::from_body(
        Operation::RenderCaptions,
        json!({"file_url": "x", "captions": "y"}),
    )
    .unwrap();

    let run = orchestrator
        .run(
            &request,
            &OperationDescriptor::polled("render-captions", vec![job.clone()]),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(run.outcome.status, JobStatus::Failed);
    assert_eq!(
        run.outcome.error.as_deref(),
        Some("Job timed out after 3 status checks")
    );
    assert_eq!(job.checks.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_polled_job_provider_failure() {
    let job = ScriptedJob::accepting(
        "assemblyai",
        vec![
            AsyncJobSnapshot::pending(),
            AsyncJobSnapshot::failed("Audio file is corrupt"),
        ],
    );
    let request = JobRequest::from_body(Operation::Transcribe, json!({"file_url": "x"})).unwrap();

    let run = orchestrator(Arc::new(MemoryCache::new()))
        .run(
            &request,
            &OperationDescriptor::polled("transcribe", vec![job]),
            CancellationToken::new(),
        )
        .await;

    assert_eq!(run.outcome.error.as_deref(), Some("Audio file is corrupt"));
}

#[tokio::test]
async fn test_cancelled_polling_fails_job() {
    let job = ScriptedJob::accepting("assemblyai", vec![AsyncJobSnapshot::pending()]);
    let request = JobRequest::from_body(Operation::Transcribe, json!({"file_url": "x"})).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let run = orchestrator(Arc::new(MemoryCache::new()))
        .run(
            &request,
            &OperationDescriptor::polled("transcribe", vec![job.clone()]),
            cancel,
        )
        .await;

    assert_eq!(run.outcome.error.as_deref(), Some("Job cancelled"));
    assert_eq!(job.checks.load(Ordering::SeqCst), 0);
}
