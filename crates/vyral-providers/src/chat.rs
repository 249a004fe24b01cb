//! Chat-model candidates.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use vyral_models::JobRequest;

use crate::candidate::{Candidate, Provider};
use crate::error::ProviderResult;
use crate::openrouter::{ChatOptions, OpenRouterClient};
use crate::prompts::PromptBuilder;
use crate::shaping::ResultShaper;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One model on OpenRouter, paired with a prompt and a result shaper.
pub struct ChatCandidate {
    id: String,
    model: String,
    client: Arc<OpenRouterClient>,
    prompt: PromptBuilder,
    shape: ResultShaper,
    options: ChatOptions,
}

impl ChatCandidate {
    pub fn new(
        client: Arc<OpenRouterClient>,
        model: impl Into<String>,
        prompt: PromptBuilder,
        shape: ResultShaper,
    ) -> Self {
        let model = model.into();
        Self {
            id: format!("openrouter:{model}"),
            model,
            client,
            prompt,
            shape,
            options: ChatOptions {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_tokens: None,
            },
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// One candidate per model, keeping the model order.
    pub fn for_models(
        client: &Arc<OpenRouterClient>,
        models: &[String],
        prompt: PromptBuilder,
        shape: ResultShaper,
    ) -> Vec<Self> {
        models
            .iter()
            .map(|model| Self::new(Arc::clone(client), model.clone(), prompt, shape))
            .collect()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Candidate for ChatCandidate {
    fn id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl Provider for ChatCandidate {
    async fn invoke(&self, request: &JobRequest) -> ProviderResult<Value> {
        let messages = (self.prompt)(request);
        let text = self.client.chat(&self.model, &messages, self.options).await?;
        debug!(model = %self.model, chars = text.len(), "Chat completion received");
        (self.shape)(request, &self.model, &text)
    }
}
