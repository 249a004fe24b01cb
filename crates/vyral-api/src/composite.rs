//! Providers assembled from several chat calls.
//!
//! A caption pack runs one model fallback per platform, and micro clips
//! either reuse supplied highlights or ask a model for key moments. Each
//! inner fallback goes through the same [`FallbackExecutor`] as the outer
//! job, so attempts are logged and counted the same way.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use vyral_models::JobRequest;
use vyral_orchestrator::{FallbackExecutor, JobLogger};
use vyral_providers::shaping::{self, KeyMoment};
use vyral_providers::{Candidate, ChatCandidate, OpenRouterClient, Provider, ProviderError, ProviderResult};
use vyral_providers::prompts;

/// Run `request` through `candidates` in order, surfacing the last failure.
async fn first_success(
    logger: &JobLogger,
    candidates: &[Arc<ChatCandidate>],
    request: &JobRequest,
) -> ProviderResult<Value> {
    FallbackExecutor::new(logger)
        .execute(candidates, |candidate| async move { candidate.invoke(request).await })
        .await
        .map(|attempted| attempted.value)
        .map_err(|e| ProviderError::reported(e.to_string()))
}

/// Captions for every requested platform (defaults to TikTok, Instagram and
/// YouTube).
pub struct CaptionPackProvider {
    candidates: Vec<Arc<ChatCandidate>>,
}

impl CaptionPackProvider {
    pub fn new(client: &Arc<OpenRouterClient>, models: &[String]) -> Self {
        Self {
            candidates: ChatCandidate::for_models(
                client,
                models,
                prompts::platform_caption,
                shaping::caption_text,
            )
            .into_iter()
            .map(Arc::new)
            .collect(),
        }
    }
}

impl Candidate for CaptionPackProvider {
    fn id(&self) -> &str {
        "openrouter:caption-pack"
    }
}

#[async_trait]
impl Provider for CaptionPackProvider {
    async fn invoke(&self, request: &JobRequest) -> ProviderResult<Value> {
        let logger = JobLogger::for_request(request, "caption-pack");
        let platforms = shaping::target_platforms(request);

        let mut captions = Map::new();
        for platform in &platforms {
            let mut platform_request = request.clone();
            platform_request
                .params
                .insert("platform".to_string(), Value::String(platform.clone()));

            let caption = first_success(&logger, &self.candidates, &platform_request).await?;
            captions.insert(platform.clone(), caption);
        }

        Ok(serde_json::json!({
            "captions": captions,
            "platforms": platforms,
        }))
    }
}

/// Clip list cut from supplied highlights or model-picked key moments.
pub struct MicroClipsProvider {
    candidates: Vec<Arc<ChatCandidate>>,
}

impl MicroClipsProvider {
    pub fn new(client: &Arc<OpenRouterClient>, models: &[String]) -> Self {
        Self {
            candidates: ChatCandidate::for_models(
                client,
                models,
                prompts::key_moments,
                shaping::key_moments,
            )
            .into_iter()
            .map(Arc::new)
            .collect(),
        }
    }

    async fn key_moments(&self, request: &JobRequest) -> ProviderResult<Vec<KeyMoment>> {
        let supplied = request
            .param("highlights")
            .and_then(Value::as_array)
            .filter(|highlights| !highlights.is_empty());

        if let Some(highlights) = supplied {
            return Ok(shaping::moments_from_highlights(highlights));
        }

        let logger = JobLogger::for_request(request, "micro-clips");
        let moments = first_success(&logger, &self.candidates, request).await?;
        serde_json::from_value(moments)
            .map_err(|e| ProviderError::invalid_response(format!("Malformed key moments: {e}")))
    }
}

impl Candidate for MicroClipsProvider {
    fn id(&self) -> &str {
        "openrouter:micro-clips"
    }
}

#[async_trait]
impl Provider for MicroClipsProvider {
    async fn invoke(&self, request: &JobRequest) -> ProviderResult<Value> {
        let moments = self.key_moments(request).await?;
        let file_url = request.str_param("file_url").unwrap_or_default();
        Ok(shaping::micro_clips(file_url, &moments))
    }
}
