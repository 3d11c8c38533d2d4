// # HTTP Notifier
//
// This crate provides the HTTP notifier for ntfyer.
//
// ## Behavior
//
// - Makes exactly one POST per `send` call
// - Request body is the notification text, verbatim
// - No headers beyond the client defaults
// - Status 200 is success; every other status is `NotificationFailed`
// - Connection failures are `TransportError`
// - No retry, no backoff, no timeout beyond what the client was built with
//
// ## API Reference
//
// - ntfy publishing: `POST {URL}/{TOPIC}` with the message as the body

use async_trait::async_trait;
use ntfyer_core::{Error, Notifier, Result};

/// Status code the endpoint must return for a notification to count as sent
const SUCCESS_STATUS: u16 = 200;

/// Notifier that publishes with a single HTTP POST
///
/// The `reqwest::Client` is supplied by the caller, so tests and embedders
/// control its configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    /// Create a notifier around an existing client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The client used for requests
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notifier_url: &str, text: &str) -> Result<()> {
        tracing::debug!("POST {} ({} bytes)", notifier_url, text.len());

        let response = self
            .client
            .post(notifier_url)
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request to {} failed: {}", notifier_url, e)))?;

        let status = response.status();
        if status.as_u16() != SUCCESS_STATUS {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::warn!("Notification rejected by {}: {}", notifier_url, status);
            return Err(Error::notification_failed(status.as_u16(), body));
        }

        tracing::info!("Notification delivered to {}", notifier_url);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "http"
    }
}
