//! Structured job logging.

use tracing::{error, info, warn, Span};
use vyral_models::JobRequest;

/// Attaches `job_id` and `operation` to every job lifecycle event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Logger for a request. Jobs without a caller id log as `-`.
    pub fn for_request(request: &JobRequest, operation: &str) -> Self {
        Self {
            job_id: request
                .job_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            operation: operation.to_string(),
        }
    }

    pub fn from_string(job_id: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span covering the whole job; provider and cache events nest under it.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vyral_models::Operation;

    #[test]
    fn test_logger_for_request() {
        let request =
            JobRequest::from_body(Operation::Vision, json!({"job_id": 42, "file_url": "x"})).unwrap();
        let logger = JobLogger::for_request(&request, "vision");
        assert_eq!(logger.job_id(), "42");
        assert_eq!(logger.operation(), "vision");
    }

    #[test]
    fn test_logger_without_job_id() {
        let request = JobRequest::from_body(Operation::Vision, json!({})).unwrap();
        assert_eq!(JobLogger::for_request(&request, "vision").job_id(), "-");
    }
}
