//! OpenRouter chat completions client.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{json_body, reject_embedded_error};

/// One chat message. `content` is a string, or a list of parts for
/// multimodal prompts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Value::String(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Value::String(text.into()),
        }
    }

    /// User message made of a text part and an image part.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: json!([
                { "type": "text", "text": text.into() },
                { "type": "image_url", "image_url": { "url": image_url.into() } }
            ]),
        }
    }
}

/// Sampling options sent with a completion request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenRouter API client.
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    referer: String,
    org_id: Option<String>,
}

impl OpenRouterClient {
    /// Create a client. A missing key is reported on the first call, not here.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        referer: impl Into<String>,
        org_id: Option<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            referer: referer.into(),
            org_id,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Self::new(
            config.openrouter_api_key.clone(),
            config.openrouter_base_url.clone(),
            config.referer.clone(),
            config.openai_org_id.clone(),
            config.request_timeout,
        )
    }

    /// Run a chat completion and return the first choice's text.
    ///
    /// A body carrying an `error` field is a failure even on HTTP 200.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> ProviderResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config("OPENROUTER_KEY not set"))?;

        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(model = model, messages = messages.len(), "Sending chat completion");

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .json(&payload);
        if let Some(org_id) = &self.org_id {
            request = request.header("X-OpenAI-Organization", org_id);
        }

        let body = reject_embedded_error(json_body(request.send().await?).await?)?;

        body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::invalid_response("No content in chat completion"))
    }
}
