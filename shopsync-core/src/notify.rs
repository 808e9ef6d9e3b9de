use async_trait::async_trait;

/// Chat delivery failure. Notifications are best-effort; callers log this
/// and keep going.
#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Group-chat notifier. `mentions` tags specific contacts (admin
/// escalation); an empty slice addresses the general group only.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str, mentions: &[String]) -> Result<(), NotifyError>;
}

/// Notifier that drops everything. Used when the chat channel is not
/// configured and in tests that do not assert on messages.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, text: &str, _mentions: &[String]) -> Result<(), NotifyError> {
        tracing::debug!("dropping notification: {text}");
        Ok(())
    }
}
