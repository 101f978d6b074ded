//! The [`Notifier`] collaborator trait.

use async_trait::async_trait;

use crate::error::NotifyResult;

/// Outbound delivery of a completed result.
///
/// The delivery surface is written against this trait so handler tests
/// can run with an in-memory fake; the production implementation is
/// [`crate::SmtpNotifier`].
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the result JPEG to the given address.
    async fn send_result(&self, to: &str, jpeg: &[u8]) -> NotifyResult<()>;
}
