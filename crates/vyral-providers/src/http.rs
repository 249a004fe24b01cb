//! Shared response handling for provider HTTP calls.

use serde_json::Value;

use crate::error::{embedded_error, ProviderError, ProviderResult};

/// Read a provider response as JSON.
///
/// Non-2xx statuses fail, preferring the provider's own error message when
/// the body carries one. Callers decide what an `error` field means on a
/// successful status.
pub(crate) async fn json_body(response: reqwest::Response) -> ProviderResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let parsed: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        return Err(match parsed.as_ref().and_then(embedded_error) {
            Some(msg) => ProviderError::reported(msg),
            None => ProviderError::status(status.as_u16(), text),
        });
    }

    parsed.ok_or_else(|| ProviderError::invalid_response("response body is not JSON"))
}

/// Fail if a successful response still reports an error.
pub(crate) fn reject_embedded_error(body: Value) -> ProviderResult<Value> {
    match embedded_error(&body) {
        Some(msg) => Err(ProviderError::reported(msg)),
        None => Ok(body),
    }
}
