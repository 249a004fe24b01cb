//! Operation catalogue: which fields each route requires, how results are
//! cached and which providers serve it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use vyral_models::Operation;
use vyral_orchestrator::OperationDescriptor;
use vyral_providers::{
    prompts, shaping, AsyncProvider, AssemblyAiTranscriber, ChatCandidate, ChatOptions,
    OpenRouterClient, Provider, ProviderConfig, ProviderResult, ShotstackRenderer,
};

use crate::composite::{CaptionPackProvider, MicroClipsProvider};

const ONE_HOUR: Duration = Duration::from_secs(3600);
const HALF_HOUR: Duration = Duration::from_secs(1800);

/// Frame analysis runs at the model's default temperature with a bounded reply.
const VISION_OPTIONS: ChatOptions = ChatOptions {
    temperature: None,
    max_tokens: Some(1000),
};

/// Fields that must be present and non-empty for an operation.
pub fn required_fields(operation: Operation) -> &'static [&'static str] {
    match operation {
        Operation::Transcribe | Operation::Vision => &["file_url"],
        Operation::Strategy | Operation::ScriptGenerator | Operation::CaptionPack => {
            &["transcript"]
        }
        Operation::PlatformCaptions => &["transcript", "platform"],
        Operation::RenderCaptions => &["file_url", "captions"],
        Operation::MicroClips => &["file_url", "transcript"],
    }
}

/// Descriptor per operation.
#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    descriptors: HashMap<Operation, OperationDescriptor>,
}

impl OperationCatalog {
    /// Empty catalogue; unregistered operations answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the descriptor for `operation`.
    pub fn with(mut self, operation: Operation, descriptor: OperationDescriptor) -> Self {
        self.descriptors.insert(operation, descriptor);
        self
    }

    pub fn get(&self, operation: Operation) -> Option<&OperationDescriptor> {
        self.descriptors.get(&operation)
    }

    /// Build the production catalogue from provider configuration.
    pub fn from_providers(config: &ProviderConfig) -> ProviderResult<Self> {
        let openrouter = Arc::new(OpenRouterClient::from_config(config)?);
        let models = &config.text_models;

        let chat = |prompt: prompts::PromptBuilder, shape: shaping::ResultShaper| {
            ChatCandidate::for_models(&openrouter, models, prompt, shape)
                .into_iter()
                .map(|candidate| Arc::new(candidate) as Arc<dyn Provider>)
                .collect::<Vec<_>>()
        };

        let vision: Vec<Arc<dyn Provider>> = vec![Arc::new(
            ChatCandidate::new(
                Arc::clone(&openrouter),
                config.vision_model.clone(),
                prompts::vision,
                shaping::vision,
            )
            .with_options(VISION_OPTIONS),
        )];
        let transcriber: Vec<Arc<dyn AsyncProvider>> =
            vec![Arc::new(AssemblyAiTranscriber::from_config(config)?)];
        let renderer: Vec<Arc<dyn AsyncProvider>> =
            vec![Arc::new(ShotstackRenderer::from_config(config)?)];
        let caption_pack: Vec<Arc<dyn Provider>> =
            vec![Arc::new(CaptionPackProvider::new(&openrouter, models))];
        let micro_clips: Vec<Arc<dyn Provider>> =
            vec![Arc::new(MicroClipsProvider::new(&openrouter, models))];

        Ok(Self::new()
            .with(
                Operation::Transcribe,
                OperationDescriptor::polled("transcribe", transcriber),
            )
            .with(
                Operation::Vision,
                OperationDescriptor::direct("vision", vision).cached(
                    "analyze",
                    &["file_url"],
                    ONE_HOUR,
                ),
            )
            .with(
                Operation::Strategy,
                OperationDescriptor::direct("strategy", chat(prompts::strategy, shaping::strategy))
                    .cached("generate", &["transcript", "platform_preferences"], ONE_HOUR),
            )
            .with(
                Operation::ScriptGenerator,
                OperationDescriptor::direct(
                    "script-generator",
                    chat(prompts::script, shaping::script),
                )
                .cached("generate", &["transcript", "strategy"], ONE_HOUR),
            )
            .with(
                Operation::CaptionPack,
                OperationDescriptor::direct("caption-pack", caption_pack).cached(
                    "generate",
                    &["transcript", "platforms"],
                    HALF_HOUR,
                ),
            )
            .with(
                Operation::PlatformCaptions,
                OperationDescriptor::direct(
                    "platform-captions",
                    chat(
                        prompts::platform_caption_with_strategy,
                        shaping::platform_captions,
                    ),
                )
                .cached("generate", &["transcript", "strategy", "platform"], HALF_HOUR),
            )
            .with(
                Operation::RenderCaptions,
                OperationDescriptor::polled("render-captions", renderer),
            )
            .with(
                Operation::MicroClips,
                OperationDescriptor::direct("micro-clips", micro_clips),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use vyral_models::JobRequest;
    use vyral_orchestrator::{CachePolicy, Execution};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_every_operation_is_registered() {
        let catalog = OperationCatalog::from_providers(&ProviderConfig::default()).unwrap();
        for op in Operation::ALL {
            let descriptor = catalog.get(op).expect("registered");
            assert_eq!(descriptor.name, op.as_str());
        }
    }

    #[test]
    fn test_cache_policies() {
        let catalog = OperationCatalog::from_providers(&ProviderConfig::default()).unwrap();

        let strategy = catalog.get(Operation::Strategy).unwrap();
        assert_eq!(strategy.cache, CachePolicy::Cached { ttl: ONE_HOUR });
        assert_eq!(strategy.sub_operation, "generate");
        assert_eq!(strategy.cache_fields, vec!["transcript", "platform_preferences"]);

        let captions = catalog.get(Operation::PlatformCaptions).unwrap();
        assert_eq!(captions.cache, CachePolicy::Cached { ttl: HALF_HOUR });

        let vision = catalog.get(Operation::Vision).unwrap();
        assert_eq!(vision.sub_operation, "analyze");

        for op in [Operation::Transcribe, Operation::RenderCaptions, Operation::MicroClips] {
            assert_eq!(catalog.get(op).unwrap().cache, CachePolicy::Bypass);
        }
    }

    #[test]
    fn test_model_fallback_order() {
        let catalog = OperationCatalog::from_providers(&ProviderConfig::default()).unwrap();
        assert_eq!(
            catalog.get(Operation::Strategy).unwrap().execution.candidate_ids(),
            vec![
                "openrouter:openai/gpt-4",
                "openrouter:anthropic/claude-3.5-sonnet",
                "openrouter:openai/gpt-3.5-turbo",
            ]
        );
        assert_eq!(
            catalog.get(Operation::Vision).unwrap().execution.candidate_ids(),
            vec!["openrouter:openai/gpt-4-vision-preview"]
        );
        assert!(matches!(
            catalog.get(Operation::Transcribe).unwrap().execution,
            Execution::Polled(_)
        ));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(required_fields(Operation::MicroClips), ["file_url", "transcript"]);
        assert_eq!(required_fields(Operation::PlatformCaptions), ["transcript", "platform"]);
        assert_eq!(required_fields(Operation::RenderCaptions), ["file_url", "captions"]);
    }

    #[tokio::test]
    async fn test_vision_request_caps_tokens_without_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4-vision-preview",
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "a cat"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig {
            openrouter_api_key: Some("or-key".into()),
            openrouter_base_url: server.uri(),
            ..Default::default()
        };
        let catalog = OperationCatalog::from_providers(&config).unwrap();
        let Execution::Direct(candidates) = &catalog.get(Operation::Vision).unwrap().execution
        else {
            panic!("vision is a direct operation");
        };

        let request = JobRequest::from_body(
            Operation::Vision,
            json!({"file_url": "https://cdn.example.com/frame.jpg"}),
        )
        .unwrap();
        let result = candidates[0].invoke(&request).await.unwrap();
        assert_eq!(result["analysis"], "a cat");

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["max_tokens"], 1000);
        assert!(body.get("temperature").is_none());
    }
}
