// # Notifier Trait
//
// Defines the interface for delivering a text notification.
//
// ## Implementations
//
// - HTTP: `ntfyer-notifier-http` crate (single POST to an ntfy endpoint)
//
// ## Usage
//
// ```rust,ignore
// use ntfyer_core::Notifier;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let notifier = /* Notifier implementation */;
//
//     notifier.send("https://ntfy.sh/test_topic", "backup finished").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for notification transports
///
/// A notifier is stateless and single-shot: one call, one outbound request.
/// It never retries and never reads the settings store; the caller resolves
/// the endpoint first.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to `notifier_url`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The endpoint accepted the notification
    /// - `Err(Error::NotificationFailed)`: The endpoint answered with a non-success status
    /// - `Err(Error::TransportError)`: No response was received
    async fn send(&self, notifier_url: &str, text: &str) -> Result<(), crate::Error>;

    /// Transport name for logs
    fn notifier_name(&self) -> &'static str;
}
