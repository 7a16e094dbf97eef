//! Graveyard job entry point
//!
//! One invocation runs the whole reconciliation:
//! 1. Resolve the archival grouping by name (fatal on failure)
//! 2. Scan for closed accounts outside it (fatal on failure)
//! 3. Relocate each candidate in scan order, isolating failures
//! 4. Aggregate outcomes into a single response
//!
//! Collaborators are injected at construction; nothing is kept between runs.

use crate::config::JobConfig;
use crate::directory::DirectoryClient;
use crate::error::JobError;
use crate::notify::{NoopNotifier, Notifier};
use crate::relocation::{RelocationExecutor, RelocationOutcome};
use crate::resolver::GroupingResolver;
use crate::scanner::CandidateScanner;
use crate::types::{AccountId, RelocationSummary, RunResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Invocation metadata supplied by the trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Request identifier, used only to correlate log events
    pub request_id: String,
}

impl InvocationContext {
    /// Create context for `request_id`
    #[inline]
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}

/// The remediation job
pub struct GraveyardJob<D: ?Sized> {
    config: JobConfig,
    resolver: GroupingResolver<D>,
    scanner: CandidateScanner<D>,
    executor: RelocationExecutor<D>,
    notifier: Arc<dyn Notifier>,
}

impl<D: ?Sized> std::fmt::Debug for GraveyardJob<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraveyardJob")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: DirectoryClient + ?Sized> GraveyardJob<D> {
    /// Create a job over `directory` with a no-op notifier
    #[must_use]
    pub fn new(directory: Arc<D>, config: JobConfig) -> Self {
        Self::with_notifier(directory, config, Arc::new(NoopNotifier))
    }

    /// Create a job with an explicit notifier
    #[must_use]
    pub fn with_notifier(
        directory: Arc<D>,
        config: JobConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver: GroupingResolver::new(Arc::clone(&directory)),
            scanner: CandidateScanner::new(Arc::clone(&directory)),
            executor: RelocationExecutor::with_policy(directory, config.retry),
            config,
            notifier,
        }
    }

    /// Create a job configured from the process environment
    ///
    /// # Errors
    /// - `JobError::Config` if `GRAVEYARD_OU_NAME` is missing or settings are invalid
    pub fn from_env(directory: Arc<D>) -> Result<Self, JobError> {
        Ok(Self::new(directory, JobConfig::from_env()?))
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Trigger-facing entry point; the event payload is not inspected
    ///
    /// # Errors
    /// Same as [`GraveyardJob::run`].
    pub async fn handle(
        &self,
        _event: &serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<RunResponse, JobError> {
        self.run(ctx).await
    }

    /// Run one reconciliation
    ///
    /// Per-account failures land in `failed_accounts`; only configuration,
    /// resolution and scan failures are returned as errors.
    ///
    /// # Errors
    /// - `JobError::Config` for a blank grouping name
    /// - `JobError::GroupingNotFound` / `JobError::Resolution` from resolution
    /// - `JobError::Scan` from the candidate scan
    pub async fn run(&self, ctx: &InvocationContext) -> Result<RunResponse, JobError> {
        let span = tracing::info_span!("graveyard_run", request_id = %ctx.request_id);
        async {
            info!(action = "run", "Processing account closure event");
            match self.run_inner(ctx).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    error!(action = "run", error = %e, "Error processing account closures");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, ctx: &InvocationContext) -> Result<RunResponse, JobError> {
        self.config.require_grouping_name()?;

        let target = self.resolver.resolve(&self.config.graveyard_ou_name).await?;
        let candidates = self.scanner.scan(&target).await?;

        if candidates.is_empty() {
            info!(action = "run", "No closed accounts found for processing");
            return Ok(RunResponse::nothing_to_process());
        }

        let mut processed: Vec<AccountId> = Vec::new();
        let mut failed: Vec<AccountId> = Vec::new();
        for account in candidates {
            match self.executor.relocate(&account, &target).await {
                RelocationOutcome::Moved { .. } => processed.push(account),
                RelocationOutcome::Failed { .. } => failed.push(account),
            }
        }

        let summary = RelocationSummary::new(processed, failed);
        info!(
            action = "run",
            total_processed = summary.total_processed,
            total_failed = summary.total_failed,
            processed_accounts = ?summary.processed_accounts,
            failed_accounts = ?summary.failed_accounts,
            "Account closure processing completed"
        );

        if summary.has_failures() {
            if let Err(e) = self.notifier.notify_failures(&summary, ctx).await {
                error!(action = "notify_failures", error = %e, "Failed to send failure notification");
            }
        }

        Ok(RunResponse::completed(summary))
    }
}
