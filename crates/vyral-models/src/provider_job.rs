//! Provider-side long-running jobs.
//!
//! These types describe jobs accepted by an external provider (for example
//! a transcription or render service) that must be polled until they reach
//! a terminal state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Handle returned by a provider when it accepts a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobHandle {
    /// Identifier of the candidate that accepted the job
    pub provider: String,
    /// Provider-assigned job id
    pub id: String,
}

impl JobHandle {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }
}

/// Provider job status, normalised across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AsyncJobStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl AsyncJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AsyncJobStatus::Pending => "pending",
            AsyncJobStatus::Running => "running",
            AsyncJobStatus::Done => "done",
            AsyncJobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more polling needed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AsyncJobStatus::Done | AsyncJobStatus::Failed)
    }
}

impl std::fmt::Display for AsyncJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One status observation of a provider job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct AsyncJobSnapshot {
    pub status: AsyncJobStatus,
    /// Result payload, present once `Done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Provider error detail, present once `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AsyncJobSnapshot {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        Self {
            status: AsyncJobStatus::Running,
            ..Default::default()
        }
    }

    pub fn done(result: Value) -> Self {
        Self {
            status: AsyncJobStatus::Done,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: AsyncJobStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}
