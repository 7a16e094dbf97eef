//! Error types for the graveyard job
//!
//! Provides error handling for:
//! - Directory service calls (classified transient vs permanent)
//! - Missing or invalid configuration
//! - Run-level failures that abort an invocation

use crate::types::{AccountId, GroupingId};

/// Classification of a directory failure for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Raised by the service's request layer; eligible for backoff and retry
    Transient,
    /// Anything else
    Permanent,
}

/// Directory client errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory service rejected or failed a request
    #[error("{operation} failed: {message}")]
    Service {
        /// Operation name, e.g. `move_account`
        operation: &'static str,
        /// Failure classification
        class: ErrorClass,
        /// Service-provided detail
        message: String,
    },

    /// Account has no parent grouping
    #[error("could not find parent for account: {account}")]
    ParentNotFound { account: AccountId },

    /// The organization has no root
    #[error("organization has no root")]
    NoRoot,

    /// Referenced grouping does not exist
    #[error("unknown grouping: {0}")]
    UnknownGrouping(GroupingId),

    /// Referenced account does not exist
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Move source is not the account's current parent
    #[error("account {account} is not under {source_parent} (current parent: {actual})")]
    SourceMismatch {
        account: AccountId,
        source_parent: GroupingId,
        actual: GroupingId,
    },
}

impl DirectoryError {
    /// Transient service error
    #[inline]
    pub fn transient(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            class: ErrorClass::Transient,
            message: message.into(),
        }
    }

    /// Permanent service error
    #[inline]
    pub fn permanent(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            class: ErrorClass::Permanent,
            message: message.into(),
        }
    }

    /// Classify this error
    #[inline]
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Service { class, .. } => *class,
            _ => ErrorClass::Permanent,
        }
    }

    /// Check if error came from the request layer and may succeed on retry
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required setting absent or empty
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// Setting present but unusable
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Run-level errors; every variant aborts the invocation
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Configuration missing or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No grouping with the requested name exists in the tree
    #[error("could not find grouping with name: {name}")]
    GroupingNotFound { name: String },

    /// Directory call failed while resolving the target grouping
    #[error("grouping resolution failed: {0}")]
    Resolution(#[source] DirectoryError),

    /// Directory call failed while scanning for candidates
    #[error("candidate scan failed: {0}")]
    Scan(#[source] DirectoryError),
}

impl JobError {
    /// Check if this is the "grouping not found" failure
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GroupingNotFound { .. })
    }
}

/// Result alias for directory calls
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_classification() {
        assert!(DirectoryError::transient("move_account", "throttled").is_transient());
        assert!(!DirectoryError::permanent("move_account", "denied").is_transient());
        assert_eq!(
            DirectoryError::ParentNotFound {
                account: AccountId::new("1")
            }
            .class(),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn error_display() {
        let err = DirectoryError::transient("list_accounts", "rate exceeded");
        assert_eq!(err.to_string(), "list_accounts failed: rate exceeded");

        let err = JobError::GroupingNotFound {
            name: "Graveyard".to_string(),
        };
        assert!(err.to_string().contains("Graveyard"));
        assert!(err.is_not_found());
    }

    #[test]
    fn config_error_converts() {
        let err: JobError = ConfigError::Missing("GRAVEYARD_OU_NAME").into();
        assert!(matches!(err, JobError::Config(ConfigError::Missing(_))));
        assert!(!err.is_not_found());
    }
}
