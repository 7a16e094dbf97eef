//! Graveyard Core - closed-account remediation
//!
//! Files every closed (suspended) account of an organization under a
//! designated archival grouping:
//! - Resolves the archival grouping by name with a depth-first tree search
//! - Scans all accounts for closed ones outside that grouping
//! - Moves each candidate with bounded exponential-backoff retry
//! - Aggregates per-account outcomes into one response
//!
//! # Example
//!
//! ```rust,ignore
//! use graveyard_core::{GraveyardJob, InMemoryDirectory, InvocationContext, JobConfig};
//! use std::sync::Arc;
//!
//! # async fn example(snapshot: graveyard_core::DirectorySnapshot) -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(InMemoryDirectory::new(snapshot));
//! let job = GraveyardJob::new(directory, JobConfig::new("Graveyard"));
//!
//! let response = job.run(&InvocationContext::new("req-1")).await?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod directory;
pub mod error;
pub mod job;
pub mod notify;
pub mod relocation;
pub mod resolver;
pub mod scanner;
pub mod telemetry;
pub mod types;

// Re-exports for convenience
pub use config::JobConfig;
pub use directory::{DirectoryClient, DirectorySnapshot, InMemoryDirectory, SnapshotError};
pub use error::{ConfigError, DirectoryError, DirectoryResult, ErrorClass, JobError};
pub use job::{GraveyardJob, InvocationContext};
pub use notify::{LogNotifier, NoopNotifier, Notifier, NotifyError};
pub use relocation::{RelocationExecutor, RelocationOutcome, RetryPolicy};
pub use resolver::GroupingResolver;
pub use scanner::{Candidate, CandidateScanner, ScanReport};
pub use types::{
    Account, AccountId, AccountState, Grouping, GroupingId, Page, RelocationSummary,
    ResponseBody, RunResponse, NOTHING_TO_PROCESS,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the graveyard job
    pub use crate::{
        AccountId, DirectoryClient, GraveyardJob, GroupingId, InMemoryDirectory,
        InvocationContext, JobConfig, JobError, RetryPolicy, RunResponse,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
