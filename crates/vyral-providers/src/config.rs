//! Provider configuration.

use std::time::Duration;

/// Default chat model fallback order.
pub const DEFAULT_TEXT_MODELS: [&str; 3] = [
    "openai/gpt-4",
    "anthropic/claude-3.5-sonnet",
    "openai/gpt-3.5-turbo",
];

/// Default model used for frame analysis.
pub const DEFAULT_VISION_MODEL: &str = "openai/gpt-4-vision-preview";

/// Credentials, endpoints and model lists for every external provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OpenRouter API key
    pub openrouter_api_key: Option<String>,
    /// OpenRouter API base (without `/chat/completions`)
    pub openrouter_base_url: String,
    /// Value sent as `HTTP-Referer` on chat requests
    pub referer: String,
    /// Sent as `X-OpenAI-Organization` when set
    pub openai_org_id: Option<String>,
    /// Chat models tried in order
    pub text_models: Vec<String>,
    /// Model used for frame analysis
    pub vision_model: String,
    /// AssemblyAI API key
    pub assemblyai_api_key: Option<String>,
    pub assemblyai_base_url: String,
    /// Shotstack API key
    pub shotstack_api_key: Option<String>,
    /// Shotstack API base, including the stage (`.../stage` or `.../v1`)
    pub shotstack_base_url: String,
    /// Per-request timeout for outbound provider calls
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            referer: "https://vyral.vercel.app".to_string(),
            openai_org_id: None,
            text_models: DEFAULT_TEXT_MODELS.iter().map(|m| m.to_string()).collect(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            assemblyai_api_key: None,
            assemblyai_base_url: "https://api.assemblyai.com".to_string(),
            shotstack_api_key: None,
            shotstack_base_url: "https://api.shotstack.io/stage".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            openrouter_api_key: non_empty_var("OPENROUTER_KEY"),
            openrouter_base_url: non_empty_var("OPENROUTER_BASE_URL")
                .unwrap_or(defaults.openrouter_base_url),
            referer: non_empty_var("OPENROUTER_REFERER").unwrap_or(defaults.referer),
            openai_org_id: non_empty_var("OPENAI_ORG_ID"),
            text_models: non_empty_var("TEXT_MODELS")
                .map(|s| parse_list(&s))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.text_models),
            vision_model: non_empty_var("VISION_MODEL").unwrap_or(defaults.vision_model),
            assemblyai_api_key: non_empty_var("ASSEMBLYAI_KEY"),
            assemblyai_base_url: non_empty_var("ASSEMBLYAI_BASE_URL")
                .unwrap_or(defaults.assemblyai_base_url),
            shotstack_api_key: non_empty_var("SHOTSTACK_KEY"),
            shotstack_base_url: non_empty_var("SHOTSTACK_BASE_URL")
                .unwrap_or(defaults.shotstack_base_url),
            request_timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
