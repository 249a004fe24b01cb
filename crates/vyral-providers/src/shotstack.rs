//! Shotstack caption rendering.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use vyral_models::{AsyncJobSnapshot, JobHandle, JobRequest};

use crate::candidate::{AsyncProvider, Candidate};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{json_body, reject_embedded_error};

/// Clip length in seconds when the request gives no `duration`.
const DEFAULT_CLIP_LENGTH: f64 = 30.0;
const DEFAULT_STYLE: &str = "minimal";

/// Shotstack render client.
pub struct ShotstackRenderer {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    referer: String,
}

impl ShotstackRenderer {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        referer: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            referer: referer.into(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Self::new(
            config.shotstack_api_key.clone(),
            config.shotstack_base_url.clone(),
            config.referer.clone(),
            config.request_timeout,
        )
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config("SHOTSTACK_KEY not set"))
    }

    /// Video track with the captions laid over it as a title asset.
    fn edit(request: &JobRequest) -> Value {
        let file_url = request.str_param("file_url").unwrap_or_default();
        let captions = match request.param("captions") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let style = request.str_param("style").unwrap_or(DEFAULT_STYLE);
        let length = request
            .param("duration")
            .and_then(Value::as_f64)
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_CLIP_LENGTH);

        json!({
            "timeline": {
                "tracks": [{
                    "clips": [
                        {
                            "asset": { "type": "video", "src": file_url },
                            "start": 0,
                            "length": length
                        },
                        {
                            "asset": { "type": "title", "text": captions, "style": style },
                            "start": 0,
                            "length": length
                        }
                    ]
                }]
            },
            "output": { "format": "mp4", "resolution": "hd" }
        })
    }
}

impl Candidate for ShotstackRenderer {
    fn id(&self) -> &str {
        "shotstack"
    }
}

#[async_trait]
impl AsyncProvider for ShotstackRenderer {
    async fn submit(&self, request: &JobRequest) -> ProviderResult<JobHandle> {
        let response = self
            .client
            .post(format!("{}/render", self.base_url))
            .header("x-api-key", self.api_key()?)
            .header("HTTP-Referer", &self.referer)
            .json(&Self::edit(request))
            .send()
            .await?;
        let body = reject_embedded_error(json_body(response).await?)?;

        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Render submission rejected");
            return Err(ProviderError::reported(message));
        }

        let id = body
            .pointer("/response/id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_response("Render submission returned no id"))?;

        debug!(render_id = id, "Render submitted");
        Ok(JobHandle::new(self.id(), id))
    }

    async fn status(&self, handle: &JobHandle) -> ProviderResult<AsyncJobSnapshot> {
        let response = self
            .client
            .get(format!("{}/render/{}", self.base_url, handle.id))
            .header("x-api-key", self.api_key()?)
            .header("HTTP-Referer", &self.referer)
            .send()
            .await?;
        let body = json_body(response).await?;

        let render = body
            .get("response")
            .ok_or_else(|| ProviderError::invalid_response("Render status has no response"))?;
        let status = render.get("status").and_then(Value::as_str).unwrap_or_default();

        Ok(match status {
            "queued" => AsyncJobSnapshot::pending(),
            "preprocessing" | "fetching" | "rendering" | "saving" => AsyncJobSnapshot::running(),
            "done" => AsyncJobSnapshot::done(json!({
                "rendered_video_url": render.get("url").cloned().unwrap_or(Value::Null),
                "render_id": handle.id,
                "duration": render.get("duration").cloned().unwrap_or(Value::Null),
            })),
            "failed" => AsyncJobSnapshot::failed(
                render
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Video rendering failed"),
            ),
            // Shotstack adds stages over time; anything unrecognised is still in flight
            other => {
                debug!(render_id = %handle.id, status = other, "Unrecognised render status");
                AsyncJobSnapshot::running()
            }
        })
    }
}
