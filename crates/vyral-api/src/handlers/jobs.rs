//! Operation handler shared by every job route.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::debug;
use vyral_models::{JobRequest, Operation};
use vyral_orchestrator::CancellationToken;

use crate::catalog::required_fields;
use crate::error::{ApiError, ApiResult};
use crate::security::validate_webhook_url;
use crate::state::AppState;

/// Validate the body, run the job and answer with its outcome.
///
/// Completed jobs answer 200 and failed jobs 500, both with the same body
/// the webhook receives. Dropping the request (client disconnect) cancels
/// any in-flight polling.
pub async fn run_job(state: AppState, operation: Operation, body: Bytes) -> ApiResult<Response> {
    let request = parse_request(&state, operation, &body)?;
    let descriptor = state
        .catalog
        .get(operation)
        .cloned()
        .ok_or(ApiError::NotFound)?;

    // The run is detached so that a dropped request cancels it instead of
    // discarding it; the cancelled run still reports to the webhook.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let orchestrator = state.orchestrator.clone();
    let run = tokio::spawn(async move { orchestrator.run(&request, &descriptor, cancel).await })
        .await
        .map_err(|e| ApiError::internal(format!("Job task failed: {e}")))?;
    // Delivery continues in the background
    drop(run.delivery);

    let status = if run.outcome.is_completed() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(run.outcome)).into_response())
}

fn parse_request(state: &AppState, operation: Operation, body: &[u8]) -> ApiResult<JobRequest> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| {
            debug!(operation = %operation, error = %e, "Rejected malformed JSON body");
            ApiError::invalid_request("Invalid JSON body")
        })?
    };

    let request = JobRequest::from_body(operation, body).map_err(ApiError::invalid_request)?;

    let required = required_fields(operation);
    if !request.missing_fields(required).is_empty() {
        return Err(ApiError::missing_fields(required));
    }

    if let Some(url) = &request.webhook_url {
        validate_webhook_url(url, state.config.allow_private_webhooks)
            .into_result()
            .map_err(ApiError::invalid_request)?;
    }

    Ok(request)
}
