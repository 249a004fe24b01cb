//! Best-effort webhook notification.
//!
//! Delivery runs on a detached task: one POST, no retry. Failures are
//! logged and counted, and can never change the response already being
//! returned to the caller.

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};
use vyral_models::JobOutcome;

use crate::error::WebhookError;
use crate::logging::JobLogger;
use crate::metrics;

/// Sends job outcomes to caller-supplied endpoints.
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: Client,
}

impl WebhookDispatcher {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Deliver `outcome` to `url` in the background.
    ///
    /// Returns `None` when there is nothing to deliver. The handle resolves
    /// once the single delivery attempt has finished.
    pub fn notify(
        &self,
        url: Option<&str>,
        outcome: &JobOutcome,
        logger: &JobLogger,
    ) -> Option<JoinHandle<()>> {
        let url = url?.to_string();
        let client = self.client.clone();
        let outcome = outcome.clone();
        let span = logger.create_span();

        let handle = tokio::spawn(
            async move {
                match deliver(&client, &url, &outcome).await {
                    Ok(()) => {
                        metrics::record_webhook_delivery("delivered");
                        info!(status = %outcome.status, "Webhook delivered");
                    }
                    Err(e) => {
                        metrics::record_webhook_delivery("failed");
                        warn!(error = %e, "Failed to call webhook");
                    }
                }
            }
            .instrument(span),
        );
        Some(handle)
    }
}

async fn deliver(client: &Client, url: &str, outcome: &JobOutcome) -> Result<(), WebhookError> {
    let response = client.post(url).json(outcome).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(WebhookError::Status(status.as_u16()))
    }
}
