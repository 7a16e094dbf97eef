//! Relocation with bounded retry
//!
//! Moves one candidate account into the archival grouping. Each attempt
//! re-reads the account's current parent and then issues the move; a failed
//! attempt is followed by an exponential backoff sleep. Outcomes are values,
//! never errors, so one account's failure cannot abort the batch.

use crate::directory::DirectoryClient;
use crate::error::{DirectoryError, ErrorClass};
use crate::types::{AccountId, GroupingId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry behavior for relocation attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per account, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later one
    pub base_delay: Duration,
    /// Give up immediately on `ErrorClass::Permanent` instead of retrying
    pub fail_fast_on_permanent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            fail_fast_on_permanent: false,
        }
    }
}

impl RetryPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max attempts (minimum 1)
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// With base delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// With fail-fast on permanent errors
    #[inline]
    #[must_use]
    pub fn with_fail_fast_on_permanent(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_permanent = fail_fast;
        self
    }

    /// Sleep after the failed attempt at zero-based `attempt_index`
    ///
    /// `base_delay * 2^attempt_index`: 1s after the first failure, 2s after
    /// the second with the default policy.
    #[must_use]
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }

    fn should_retry(&self, error: &DirectoryError) -> bool {
        // A parentless account fails on its first attempt.
        if matches!(error, DirectoryError::ParentNotFound { .. }) {
            return false;
        }
        !(self.fail_fast_on_permanent && error.class() == ErrorClass::Permanent)
    }
}

/// Result of relocating a single account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Account now sits under the target grouping
    Moved {
        /// Attempt that succeeded (1-based)
        attempts: u32,
    },
    /// Every allowed attempt failed
    Failed {
        /// Attempts made
        attempts: u32,
        /// Error from the last attempt
        error: DirectoryError,
    },
}

impl RelocationOutcome {
    /// Check whether the account was moved
    #[inline]
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// Attempts made
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Moved { attempts } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Moves accounts into the archival grouping
#[derive(Debug, Clone)]
pub struct RelocationExecutor<D: ?Sized> {
    directory: Arc<D>,
    policy: RetryPolicy,
}

impl<D: DirectoryClient + ?Sized> RelocationExecutor<D> {
    /// Create an executor with the default retry policy
    #[inline]
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self::with_policy(directory, RetryPolicy::default())
    }

    /// Create an executor with a custom retry policy
    #[inline]
    #[must_use]
    pub fn with_policy(directory: Arc<D>, policy: RetryPolicy) -> Self {
        Self { directory, policy }
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Move `account` under `target`
    ///
    /// Errors from either the parent lookup or the move count as a failed
    /// attempt. With attempts left the executor sleeps
    /// [`RetryPolicy::backoff`] and tries again, except when the lookup
    /// reports `DirectoryError::ParentNotFound`: the account fails at once.
    pub async fn relocate(&self, account: &AccountId, target: &GroupingId) -> RelocationOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt_index = 0;

        loop {
            let attempt = attempt_index + 1;
            debug!(
                action = "relocate_account",
                account_id = %account,
                attempt,
                max_retries = max_attempts,
                "Attempting to move account to Graveyard OU"
            );

            let error = match self.attempt(account, target).await {
                Ok(()) => {
                    info!(
                        action = "relocate_account",
                        account_id = %account,
                        graveyard_ou_id = %target,
                        attempt,
                        "Account moved to Graveyard OU"
                    );
                    return RelocationOutcome::Moved { attempts: attempt };
                }
                Err(error) => error,
            };

            if attempt >= max_attempts || !self.policy.should_retry(&error) {
                error!(
                    action = "relocate_account",
                    account_id = %account,
                    attempts = attempt,
                    error = %error,
                    "Error processing account"
                );
                return RelocationOutcome::Failed {
                    attempts: attempt,
                    error,
                };
            }

            let delay = self.policy.backoff(attempt_index);
            warn!(
                action = "relocate_account",
                account_id = %account,
                attempt,
                retry_delay_seconds = delay.as_secs_f64(),
                transient = error.is_transient(),
                error = %error,
                "Attempt failed, retrying with exponential backoff"
            );
            tokio::time::sleep(delay).await;
            attempt_index += 1;
        }
    }

    async fn attempt(&self, account: &AccountId, target: &GroupingId) -> Result<(), DirectoryError> {
        let source = self.directory.list_parent(account).await?;
        self.directory.move_account(account, &source, target).await
    }
}
