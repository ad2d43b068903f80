use async_trait::async_trait;
use identity::{Notification, Notifier};
use shared::error::Result;

/// Logs the notification instead of delivering it. A real deployment wires
/// `Notifier` to email/SMS.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            "notification (no transport configured)"
        );
        Ok(())
    }
}
