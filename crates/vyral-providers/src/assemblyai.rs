//! AssemblyAI transcription.
//!
//! Submission creates a transcript job with speaker labels and automatic
//! highlights enabled. Status polling maps AssemblyAI's
//! `queued`/`processing`/`completed`/`error` onto [`AsyncJobStatus`].
//!
//! [`AsyncJobStatus`]: vyral_models::AsyncJobStatus

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use vyral_models::{AsyncJobSnapshot, JobHandle, JobRequest};

use crate::candidate::{AsyncProvider, Candidate};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{json_body, reject_embedded_error};

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    speaker_labels: bool,
    auto_highlights: bool,
}

/// AssemblyAI transcript client.
pub struct AssemblyAiTranscriber {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AssemblyAiTranscriber {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Self::new(
            config.assemblyai_api_key.clone(),
            config.assemblyai_base_url.clone(),
            config.request_timeout,
        )
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config("ASSEMBLYAI_KEY not set"))
    }

    fn shape(body: &Value) -> Value {
        let field = |pointer: &str| body.pointer(pointer).cloned().unwrap_or(Value::Null);
        json!({
            "transcript": field("/text"),
            "confidence": field("/confidence"),
            "highlights": field("/auto_highlights_result/results"),
            "speaker_labels": field("/utterances"),
            "chapters": field("/chapters"),
            "sentiment_analysis": field("/sentiment_analysis_results"),
        })
    }
}

impl Candidate for AssemblyAiTranscriber {
    fn id(&self) -> &str {
        "assemblyai"
    }
}

#[async_trait]
impl AsyncProvider for AssemblyAiTranscriber {
    async fn submit(&self, request: &JobRequest) -> ProviderResult<JobHandle> {
        let api_key = self.api_key()?;
        let audio_url = request
            .str_param("file_url")
            .ok_or_else(|| ProviderError::reported("file_url is required"))?;

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", api_key)
            .json(&TranscriptRequest {
                audio_url,
                speaker_labels: true,
                auto_highlights: true,
            })
            .send()
            .await?;
        let body = reject_embedded_error(json_body(response).await?)?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_response("Transcript submission returned no id"))?;

        debug!(transcript_id = id, "Transcript submitted");
        Ok(JobHandle::new(self.id(), id))
    }

    async fn status(&self, handle: &JobHandle) -> ProviderResult<AsyncJobSnapshot> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/v2/transcript/{}", self.base_url, handle.id))
            .header("authorization", api_key)
            .send()
            .await?;
        let body = json_body(response).await?;

        let status = body.get("status").and_then(Value::as_str).unwrap_or_default();
        Ok(match status {
            "queued" => AsyncJobSnapshot::pending(),
            "processing" => AsyncJobSnapshot::running(),
            "completed" => AsyncJobSnapshot::done(Self::shape(&body)),
            "error" => AsyncJobSnapshot::failed(
                body.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Transcription failed"),
            ),
            other => {
                return Err(ProviderError::invalid_response(format!(
                    "Unknown transcript status: {other:?}"
                )))
            }
        })
    }
}
