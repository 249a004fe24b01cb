//! Provider candidate traits.
//!
//! A candidate is one configured, interchangeable way of serving an
//! operation. Candidates are immutable once built and are shared between
//! requests behind `Arc`.

use async_trait::async_trait;
use serde_json::Value;
use vyral_models::{AsyncJobSnapshot, JobHandle, JobRequest};

use crate::error::ProviderResult;

/// Anything that can be listed in a fallback order.
pub trait Candidate: Send + Sync {
    /// Stable identifier, e.g. `openrouter:openai/gpt-4`.
    fn id(&self) -> &str;
}

/// Candidate answering in a single request/response exchange.
#[async_trait]
pub trait Provider: Candidate {
    /// Build the provider request from the job and return the shaped result.
    async fn invoke(&self, request: &JobRequest) -> ProviderResult<Value>;
}

/// Candidate backed by a long-running job that must be polled.
#[async_trait]
pub trait AsyncProvider: Candidate {
    /// Submit the job; the provider accepting it yields a handle.
    async fn submit(&self, request: &JobRequest) -> ProviderResult<JobHandle>;

    /// Fetch the current status of a previously submitted job.
    async fn status(&self, handle: &JobHandle) -> ProviderResult<AsyncJobSnapshot>;
}
