//! Job request and outcome definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::{JobStatus, Operation};

/// Parameter bag carried by a job request.
pub type Params = serde_json::Map<String, Value>;

/// Caller-supplied job identifier, echoed back unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single orchestration request.
///
/// Built once per incoming HTTP request and owned by the orchestrator for
/// the duration of that request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRequest {
    /// Operation to run
    pub operation: Operation,
    /// Operation-specific fields (key order is irrelevant)
    #[serde(default)]
    pub params: Params,
    /// Opaque caller job identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Endpoint notified with the outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl JobRequest {
    /// Create a request without job id or webhook.
    pub fn new(operation: Operation, params: Params) -> Self {
        Self {
            operation,
            params,
            job_id: None,
            webhook_url: None,
        }
    }

    /// Split a flat JSON request body into envelope fields and params.
    ///
    /// `job_id` and `webhook_url` are lifted out of the body; every other
    /// key becomes a parameter. A numeric `job_id` is kept as its string
    /// form.
    pub fn from_body(operation: Operation, body: Value) -> Result<Self, String> {
        let mut params = match body {
            Value::Object(map) => map,
            Value::Null => Params::new(),
            _ => return Err("Request body must be a JSON object".to_string()),
        };

        let job_id = match params.remove("job_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(JobId(s)),
            Some(Value::Number(n)) => Some(JobId(n.to_string())),
            Some(_) => return Err("job_id must be a string".to_string()),
        };

        let webhook_url = match params.remove("webhook_url") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err("webhook_url must be a string".to_string()),
        };

        Ok(Self {
            operation,
            params,
            job_id,
            webhook_url,
        })
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(JobId(job_id.into()));
        self
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Get a parameter, treating JSON `null` as absent.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    /// Get a string parameter.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }

    /// Get an array of strings, skipping non-string items.
    pub fn str_list_param(&self, key: &str) -> Vec<String> {
        self.param(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of required fields that are absent or empty.
    ///
    /// A field counts as missing when it is absent, `null`, `false` or an
    /// empty string.
    pub fn missing_fields<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|field| match self.param(field) {
                None => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Bool(b)) => !b,
                Some(_) => false,
            })
            .collect()
    }

    /// Subset of params used to compute the cache fingerprint.
    ///
    /// Absent and `null` fields are left out so that omitting a field and
    /// sending it as `null` produce the same key.
    pub fn cache_params(&self, fields: &[&str]) -> Params {
        fields
            .iter()
            .filter_map(|field| {
                self.param(field)
                    .map(|value| ((*field).to_string(), value.clone()))
            })
            .collect()
    }
}

/// Terminal record of a job, delivered to both the caller and the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobOutcome {
    /// Job id echoed from the request
    pub job_id: Option<JobId>,
    /// Completed or failed
    pub status: JobStatus,
    /// Result payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Human-readable error on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn completed(job_id: Option<JobId>, result: Value) -> Self {
        Self {
            job_id,
            status: JobStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(job_id: Option<JobId>, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Failed,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
