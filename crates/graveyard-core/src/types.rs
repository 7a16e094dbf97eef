//! Core types for the graveyard job
//!
//! Defines the values the job reads from the directory and the result it
//! hands back to the invoker:
//! - Grouping and account identifiers
//! - Grouping and account records as returned by listings
//! - Paginated listing pages
//! - The relocation summary and the run response

use serde::{Deserialize, Serialize};

/// Opaque grouping (organizational unit or root) identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingId(pub String);

impl GroupingId {
    /// Create a grouping identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Opaque, stable account identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create an account identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A grouping as returned by a child listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    /// Grouping ID
    pub id: GroupingId,
    /// Human-readable name, unique only within its parent
    pub name: String,
}

impl Grouping {
    /// Create a grouping record
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: GroupingId::new(id),
            name: name.into(),
        }
    }
}

/// Account lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountState {
    /// Account is in use
    Active,
    /// Account is closed; the only state the job acts on
    Suspended,
    /// Closure requested but not yet effective
    PendingClosure,
    /// Any state this job does not know about
    #[serde(untagged)]
    Other(String),
}

impl AccountState {
    /// Check whether the account is closed
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Suspended)
    }
}

/// An account as returned by the account listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: AccountId,
    /// Display name (informational only)
    pub name: String,
    /// Lifecycle state
    pub state: AccountState,
}

impl Account {
    /// Create an account record
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: AccountState) -> Self {
        Self {
            id: AccountId::new(id),
            name: name.into(),
            state,
        }
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Final page holding `items`
    #[inline]
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Page followed by another one
    #[inline]
    #[must_use]
    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// Message body returned when a run finds nothing to relocate
pub const NOTHING_TO_PROCESS: &str = "No closed accounts found to process";

/// Aggregate of per-account relocation outcomes
///
/// Counts are derived from the lists when the summary is built, so they
/// always agree with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationSummary {
    /// Accounts moved into the archival grouping, in processing order
    pub processed_accounts: Vec<AccountId>,
    /// Accounts that could not be moved, in processing order
    pub failed_accounts: Vec<AccountId>,
    /// Number of processed accounts
    pub total_processed: usize,
    /// Number of failed accounts
    pub total_failed: usize,
}

impl RelocationSummary {
    /// Build a summary from the two outcome lists
    #[must_use]
    pub fn new(processed_accounts: Vec<AccountId>, failed_accounts: Vec<AccountId>) -> Self {
        Self {
            total_processed: processed_accounts.len(),
            total_failed: failed_accounts.len(),
            processed_accounts,
            failed_accounts,
        }
    }

    /// Summary with nothing processed and nothing failed
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Check whether any relocation failed
    #[inline]
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_accounts.is_empty()
    }
}

/// Body of a run response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Short-circuit message when there were no candidates
    Message(String),
    /// Full aggregate of a run that relocated at least one candidate
    Summary(RelocationSummary),
}

/// Result object of a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Always 200 on the success path
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Message or aggregate
    pub body: ResponseBody,
}

impl RunResponse {
    /// Response for a run with no candidates
    #[must_use]
    pub fn nothing_to_process() -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Message(NOTHING_TO_PROCESS.to_string()),
        }
    }

    /// Response for a run that attempted relocations
    #[must_use]
    pub fn completed(summary: RelocationSummary) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Summary(summary),
        }
    }

    /// Check whether this is the short-circuit response
    #[inline]
    #[must_use]
    pub fn is_nothing_to_process(&self) -> bool {
        matches!(self.body, ResponseBody::Message(_))
    }

    /// Normalized view: the aggregate, or an empty one for the short-circuit
    #[must_use]
    pub fn summary(&self) -> RelocationSummary {
        match &self.body {
            ResponseBody::Summary(summary) => summary.clone(),
            ResponseBody::Message(_) => RelocationSummary::empty(),
        }
    }
}
