//! Candidate scan
//!
//! Walks every account page and keeps the closed accounts that are not
//! already filed under the archival grouping. Decisions are made once, at
//! scan time; the resulting list is a snapshot.

use crate::directory::DirectoryClient;
use crate::error::{DirectoryError, JobError};
use crate::types::{AccountId, GroupingId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A closed account outside the archival grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Account ID
    pub account_id: AccountId,
    /// Account name (informational)
    pub account_name: String,
    /// Parent at scan time
    pub current_parent: GroupingId,
}

/// Outcome of a scan with counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Candidates in encounter order
    pub candidates: Vec<Candidate>,
    /// Accounts listed
    pub accounts_seen: usize,
    /// Accounts in the closed state
    pub closed_accounts: usize,
    /// Closed accounts already under the archival grouping
    pub already_archived: usize,
}

impl ScanReport {
    /// Candidate identifiers in encounter order
    #[must_use]
    pub fn candidate_ids(&self) -> Vec<AccountId> {
        self.candidates.iter().map(|c| c.account_id.clone()).collect()
    }
}

/// Finds closed accounts that still need relocating
#[derive(Debug, Clone)]
pub struct CandidateScanner<D: ?Sized> {
    directory: Arc<D>,
}

impl<D: DirectoryClient + ?Sized> CandidateScanner<D> {
    /// Create a scanner over `directory`
    #[inline]
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Identifiers of closed accounts whose parent is not `target`
    ///
    /// # Errors
    /// - `JobError::Scan` if listing accounts or looking up a parent fails;
    ///   no partial list is returned
    pub async fn scan(&self, target: &GroupingId) -> Result<Vec<AccountId>, JobError> {
        Ok(self.scan_report(target).await?.candidate_ids())
    }

    /// Full scan with counters
    ///
    /// Non-closed accounts are skipped without a parent lookup; each closed
    /// account costs one `list_parent` call.
    ///
    /// # Errors
    /// Same as [`CandidateScanner::scan`].
    pub async fn scan_report(&self, target: &GroupingId) -> Result<ScanReport, JobError> {
        info!(
            action = "scan_accounts",
            graveyard_ou_id = %target,
            "Starting scan for closed accounts"
        );

        let report = self.collect(target).await.map_err(|e| {
            error!(action = "scan_accounts", error = %e, "Error listing accounts");
            JobError::Scan(e)
        })?;

        info!(
            action = "scan_accounts",
            accounts_seen = report.accounts_seen,
            closed_accounts = report.closed_accounts,
            already_archived = report.already_archived,
            total_accounts_to_process = report.candidates.len(),
            "Completed scan for closed accounts"
        );
        Ok(report)
    }

    async fn collect(&self, target: &GroupingId) -> Result<ScanReport, DirectoryError> {
        let mut report = ScanReport::default();
        let mut token = None;

        loop {
            let page = self.directory.list_accounts(token).await?;

            for account in page.items {
                report.accounts_seen += 1;
                if !account.state.is_closed() {
                    continue;
                }
                report.closed_accounts += 1;

                let current_parent = self.directory.list_parent(&account.id).await?;
                if &current_parent == target {
                    report.already_archived += 1;
                    debug!(
                        action = "scan_accounts",
                        account_id = %account.id,
                        account_name = %account.name,
                        "Skipping closed account already in Graveyard OU"
                    );
                    continue;
                }

                info!(
                    action = "scan_accounts",
                    account_id = %account.id,
                    account_name = %account.name,
                    current_parent = %current_parent,
                    "Found closed account to process"
                );
                report.candidates.push(Candidate {
                    account_id: account.id,
                    account_name: account.name,
                    current_parent,
                });
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(report),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectorySnapshot, InMemoryDirectory, MockDirectoryClient};
    use crate::error::DirectoryError;
    use crate::types::{Account, AccountState, Page};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn org() -> DirectorySnapshot {
        DirectorySnapshot::with_root("r-root")
            .grouping("ou-a", "A", "r-root")
            .grouping("ou-b", "B", "r-root")
            .grouping("ou-grave", "Graveyard", "ou-b")
            .account("1", "active", AccountState::Active, "ou-a")
            .account("2", "closed", AccountState::Suspended, "ou-a")
            .account("3", "archived", AccountState::Suspended, "ou-grave")
            .account("4", "closing", AccountState::PendingClosure, "ou-b")
            .account("5", "closed-at-root", AccountState::Suspended, "r-root")
    }

    #[tokio::test]
    async fn keeps_closed_accounts_outside_target() {
        let scanner = CandidateScanner::new(Arc::new(InMemoryDirectory::with_page_size(org(), 2)));
        let ids = scanner.scan(&GroupingId::new("ou-grave")).await.unwrap();
        assert_eq!(ids, vec![AccountId::new("2"), AccountId::new("5")]);
    }

    #[tokio::test]
    async fn report_counts() {
        let scanner = CandidateScanner::new(Arc::new(InMemoryDirectory::new(org())));
        let report = scanner
            .scan_report(&GroupingId::new("ou-grave"))
            .await
            .unwrap();
        assert_eq!(report.accounts_seen, 5);
        assert_eq!(report.closed_accounts, 3);
        assert_eq!(report.already_archived, 1);
        assert_eq!(report.candidates[0].current_parent, GroupingId::new("ou-a"));
    }

    #[tokio::test]
    async fn scan_is_repeatable() {
        let scanner = CandidateScanner::new(Arc::new(InMemoryDirectory::with_page_size(org(), 1)));
        let target = GroupingId::new("ou-grave");
        let first = scanner.scan(&target).await.unwrap();
        let second = scanner.scan(&target).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn parent_lookup_only_for_closed_accounts() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_accounts().times(1).returning(|_| {
            Ok(Page::last(vec![
                Account::new("1", "active", AccountState::Active),
                Account::new("2", "closed", AccountState::Suspended),
            ]))
        });
        mock.expect_list_parent()
            .with(eq(AccountId::new("2")))
            .times(1)
            .returning(|_| Ok(GroupingId::new("ou-a")));

        let ids = CandidateScanner::new(Arc::new(mock))
            .scan(&GroupingId::new("ou-grave"))
            .await
            .unwrap();
        assert_eq!(ids, vec![AccountId::new("2")]);
    }

    #[tokio::test]
    async fn parent_lookup_failure_aborts_scan() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_accounts().times(1).returning(|_| {
            Ok(Page::last(vec![
                Account::new("2", "closed", AccountState::Suspended),
                Account::new("3", "closed", AccountState::Suspended),
            ]))
        });
        mock.expect_list_parent()
            .with(eq(AccountId::new("2")))
            .times(1)
            .returning(|_| Ok(GroupingId::new("ou-a")));
        mock.expect_list_parent()
            .with(eq(AccountId::new("3")))
            .times(1)
            .returning(|account| {
                Err(DirectoryError::ParentNotFound {
                    account: account.clone(),
                })
            });

        let err = CandidateScanner::new(Arc::new(mock))
            .scan(&GroupingId::new("ou-grave"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Scan(DirectoryError::ParentNotFound { .. })
        ));
    }
}
