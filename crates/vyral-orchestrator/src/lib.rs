//! Job orchestration core.
//!
//! Every HTTP-triggered operation runs through [`Orchestrator::run`], which
//! combines:
//!
//! - result caching keyed by a parameter fingerprint,
//! - ordered provider fallback ([`FallbackExecutor`]),
//! - bounded polling of long-running provider jobs ([`CompletionPoller`]),
//! - best-effort webhook notification ([`WebhookDispatcher`]).

pub mod config;
pub mod descriptor;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod poller;
pub mod webhook;

pub use config::OrchestratorConfig;
pub use descriptor::{CachePolicy, Execution, OperationDescriptor};
pub use error::{OrchestratorError, OrchestratorResult, WebhookError};
pub use fallback::{Attempted, FallbackExecutor};
pub use logging::JobLogger;
pub use orchestrator::{JobRun, Orchestrator};
pub use poller::{CompletionPoller, PollOutcome, Sleeper, TokioSleeper};
pub use webhook::WebhookDispatcher;

pub use tokio_util::sync::CancellationToken;
