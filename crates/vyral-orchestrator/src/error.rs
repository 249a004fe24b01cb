//! Orchestrator error types.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Why a job did not produce a result.
///
/// The display message is what callers and webhooks receive as `error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No providers configured for this operation")]
    NoCandidates,

    /// Every candidate failed; carries the last candidate's message.
    #[error("{0}")]
    ProviderFailure(String),

    #[error("Job timed out after {ticks} status checks")]
    PollTimeout { ticks: u32 },

    /// The provider reported the long-running job as failed.
    #[error("{0}")]
    PollProviderFailure(String),

    #[error("Job cancelled")]
    Cancelled,
}

impl OrchestratorError {
    pub fn provider_failure(msg: impl Into<String>) -> Self {
        Self::ProviderFailure(msg.into())
    }

    pub fn poll_provider_failure(msg: impl Into<String>) -> Self {
        Self::PollProviderFailure(msg.into())
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::NoCandidates => "no_candidates",
            OrchestratorError::ProviderFailure(_) => "provider_failure",
            OrchestratorError::PollTimeout { .. } => "poll_timeout",
            OrchestratorError::PollProviderFailure(_) => "poll_failed",
            OrchestratorError::Cancelled => "cancelled",
        }
    }
}

/// Webhook delivery failure. Logged, never surfaced to the caller.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Webhook endpoint returned HTTP {0}")]
    Status(u16),
}
