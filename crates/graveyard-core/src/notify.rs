//! Notification seam
//!
//! The job reports runs with failed relocations to an injected
//! [`Notifier`]. Delivery is the notifier's business; a notifier error is
//! logged by the job and never fails the run.

use crate::job::InvocationContext;
use crate::types::RelocationSummary;
use async_trait::async_trait;
use tracing::warn;

/// Notifier errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// The notification could not be delivered
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Sink for run notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report a completed run that left accounts unrelocated
    async fn notify_failures(
        &self,
        summary: &RelocationSummary,
        ctx: &InvocationContext,
    ) -> Result<(), NotifyError>;
}

/// Notifier that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_failures(
        &self,
        _summary: &RelocationSummary,
        _ctx: &InvocationContext,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier that emits a warning event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_failures(
        &self,
        summary: &RelocationSummary,
        ctx: &InvocationContext,
    ) -> Result<(), NotifyError> {
        let failed: Vec<&str> = summary.failed_accounts.iter().map(|a| a.as_str()).collect();
        warn!(
            action = "notify_failures",
            request_id = %ctx.request_id,
            total_failed = summary.total_failed,
            failed_accounts = ?failed,
            "Closed accounts could not be moved to Graveyard OU"
        );
        Ok(())
    }
}
