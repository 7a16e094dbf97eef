//! In-memory directory backed by a snapshot
//!
//! Holds a full copy of an organization (root, groupings, accounts with
//! their parents) and serves it through [`DirectoryClient`] with fixed-size
//! pages. Snapshots load from JSON or YAML so operators can rehearse a run
//! against an exported organization.

use super::DirectoryClient;
use crate::error::{DirectoryError, DirectoryResult};
use crate::types::{Account, AccountId, AccountState, Grouping, GroupingId, Page};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default number of items per listing page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Grouping entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGrouping {
    pub id: GroupingId,
    pub name: String,
    pub parent: GroupingId,
}

/// Account entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotAccount {
    pub id: AccountId,
    pub name: String,
    pub state: AccountState,
    /// `None` models an account the directory reports without a parent
    #[serde(default)]
    pub parent: Option<GroupingId>,
}

/// Serializable picture of an organization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Root identifier; `None` for an organization without a root
    pub root: Option<GroupingId>,
    #[serde(default)]
    pub groupings: Vec<SnapshotGrouping>,
    #[serde(default)]
    pub accounts: Vec<SnapshotAccount>,
}

/// Snapshot loading errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

impl DirectorySnapshot {
    /// Empty organization with the given root
    #[must_use]
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: Some(GroupingId::new(root)),
            ..Self::default()
        }
    }

    /// Add a grouping under `parent`
    #[must_use]
    pub fn grouping(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        self.groupings.push(SnapshotGrouping {
            id: GroupingId::new(id),
            name: name.into(),
            parent: GroupingId::new(parent),
        });
        self
    }

    /// Add an account under `parent`
    #[must_use]
    pub fn account(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        state: AccountState,
        parent: impl Into<String>,
    ) -> Self {
        self.accounts.push(SnapshotAccount {
            id: AccountId::new(id),
            name: name.into(),
            state,
            parent: Some(GroupingId::new(parent)),
        });
        self
    }

    /// Add an account the directory reports without a parent
    #[must_use]
    pub fn orphan_account(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        state: AccountState,
    ) -> Self {
        self.accounts.push(SnapshotAccount {
            id: AccountId::new(id),
            name: name.into(),
            state,
            parent: None,
        });
        self
    }

    /// Load a snapshot; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    ///
    /// # Errors
    /// - `SnapshotError::Io` if the file cannot be read
    /// - `SnapshotError::Json`/`SnapshotError::Yaml` on malformed content
    /// - `SnapshotError::Inconsistent` if parents reference unknown groupings
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Self = if is_yaml(path) {
            serde_yaml::from_str(&raw)?
        } else {
            serde_json::from_str(&raw)?
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write the snapshot back in the format implied by the extension
    ///
    /// # Errors
    /// Returns `SnapshotError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let raw = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Check that every parent reference points at the root or a known grouping
    ///
    /// # Errors
    /// Returns `SnapshotError::Inconsistent` naming the first bad reference.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut known: HashSet<&GroupingId> = self.groupings.iter().map(|g| &g.id).collect();
        if let Some(root) = &self.root {
            known.insert(root);
        }

        for grouping in &self.groupings {
            if !known.contains(&grouping.parent) {
                return Err(SnapshotError::Inconsistent(format!(
                    "grouping {} has unknown parent {}",
                    grouping.id, grouping.parent
                )));
            }
        }
        for account in &self.accounts {
            if let Some(parent) = &account.parent {
                if !known.contains(parent) {
                    return Err(SnapshotError::Inconsistent(format!(
                        "account {} has unknown parent {}",
                        account.id, parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Current parent of `account` in this snapshot
    #[must_use]
    pub fn parent_of(&self, account: &AccountId) -> Option<&GroupingId> {
        self.accounts
            .iter()
            .find(|a| &a.id == account)
            .and_then(|a| a.parent.as_ref())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Directory served from an in-memory snapshot
#[derive(Debug)]
pub struct InMemoryDirectory {
    state: Mutex<DirectorySnapshot>,
    page_size: usize,
}

impl InMemoryDirectory {
    /// Serve `snapshot` with the default page size
    #[inline]
    #[must_use]
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self::with_page_size(snapshot, DEFAULT_PAGE_SIZE)
    }

    /// Serve `snapshot` with `page_size` items per page (minimum 1)
    #[must_use]
    pub fn with_page_size(snapshot: DirectorySnapshot, page_size: usize) -> Self {
        Self {
            state: Mutex::new(snapshot),
            page_size: page_size.max(1),
        }
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.state.lock().clone()
    }

    /// Current parent of `account`
    #[must_use]
    pub fn parent_of(&self, account: &AccountId) -> Option<GroupingId> {
        self.state.lock().parent_of(account).cloned()
    }

    fn paginate<T: Clone>(
        &self,
        operation: &'static str,
        items: &[T],
        page_token: Option<String>,
    ) -> DirectoryResult<Page<T>> {
        let start = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                DirectoryError::permanent(operation, format!("invalid page token: {token}"))
            })?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(items.len());
        let page_items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
        if end < items.len() {
            Ok(Page::with_next(page_items, end.to_string()))
        } else {
            Ok(Page::last(page_items))
        }
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn list_root(&self) -> DirectoryResult<GroupingId> {
        self.state.lock().root.clone().ok_or(DirectoryError::NoRoot)
    }

    async fn list_child_groupings(
        &self,
        parent: &GroupingId,
        page_token: Option<String>,
    ) -> DirectoryResult<Page<Grouping>> {
        let children: Vec<Grouping> = {
            let state = self.state.lock();
            let parent_known = state.root.as_ref() == Some(parent)
                || state.groupings.iter().any(|g| &g.id == parent);
            if !parent_known {
                return Err(DirectoryError::UnknownGrouping(parent.clone()));
            }
            state
                .groupings
                .iter()
                .filter(|g| &g.parent == parent)
                .map(|g| Grouping {
                    id: g.id.clone(),
                    name: g.name.clone(),
                })
                .collect()
        };
        self.paginate("list_child_groupings", &children, page_token)
    }

    async fn list_accounts(&self, page_token: Option<String>) -> DirectoryResult<Page<Account>> {
        let accounts: Vec<Account> = self
            .state
            .lock()
            .accounts
            .iter()
            .map(|a| Account {
                id: a.id.clone(),
                name: a.name.clone(),
                state: a.state.clone(),
            })
            .collect();
        self.paginate("list_accounts", &accounts, page_token)
    }

    async fn list_parent(&self, account: &AccountId) -> DirectoryResult<GroupingId> {
        let state = self.state.lock();
        let entry = state
            .accounts
            .iter()
            .find(|a| &a.id == account)
            .ok_or_else(|| DirectoryError::UnknownAccount(account.clone()))?;
        entry
            .parent
            .clone()
            .ok_or_else(|| DirectoryError::ParentNotFound {
                account: account.clone(),
            })
    }

    async fn move_account(
        &self,
        account: &AccountId,
        source: &GroupingId,
        destination: &GroupingId,
    ) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        let destination_known = state.root.as_ref() == Some(destination)
            || state.groupings.iter().any(|g| &g.id == destination);
        if !destination_known {
            return Err(DirectoryError::UnknownGrouping(destination.clone()));
        }

        let entry = state
            .accounts
            .iter_mut()
            .find(|a| &a.id == account)
            .ok_or_else(|| DirectoryError::UnknownAccount(account.clone()))?;
        let current = entry
            .parent
            .clone()
            .ok_or_else(|| DirectoryError::ParentNotFound {
                account: account.clone(),
            })?;
        if &current != source {
            return Err(DirectoryError::SourceMismatch {
                account: account.clone(),
                source_parent: source.clone(),
                actual: current,
            });
        }
        entry.parent = Some(destination.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{all_accounts, all_child_groupings};

    fn org() -> DirectorySnapshot {
        DirectorySnapshot::with_root("r-root")
            .grouping("ou-a", "A", "r-root")
            .grouping("ou-b", "B", "r-root")
            .grouping("ou-grave", "Graveyard", "ou-b")
            .account("1", "one", AccountState::Active, "ou-a")
            .account("2", "two", AccountState::Suspended, "ou-a")
            .account("3", "three", AccountState::Suspended, "ou-grave")
    }

    #[tokio::test]
    async fn pages_cover_every_account() {
        let directory = InMemoryDirectory::with_page_size(org(), 2);

        let first = directory.list_accounts(None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = directory.list_accounts(first.next_token).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(second.next_token.is_none());

        assert_eq!(all_accounts(&directory).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn children_listed_in_snapshot_order() {
        let directory = InMemoryDirectory::with_page_size(org(), 1);
        let children = all_child_groupings(&directory, &GroupingId::new("r-root"))
            .await
            .unwrap();
        let ids: Vec<_> = children.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["ou-a", "ou-b"]);
    }

    #[tokio::test]
    async fn unknown_parent_listing_fails() {
        let directory = InMemoryDirectory::new(org());
        let result = directory
            .list_child_groupings(&GroupingId::new("ou-missing"), None)
            .await;
        assert!(matches!(result, Err(DirectoryError::UnknownGrouping(_))));
    }

    #[tokio::test]
    async fn move_updates_parent() {
        let directory = InMemoryDirectory::new(org());
        let account = AccountId::new("2");
        directory
            .move_account(&account, &GroupingId::new("ou-a"), &GroupingId::new("ou-grave"))
            .await
            .unwrap();
        assert_eq!(
            directory.list_parent(&account).await.unwrap(),
            GroupingId::new("ou-grave")
        );
    }

    #[tokio::test]
    async fn move_rejects_stale_source() {
        let directory = InMemoryDirectory::new(org());
        let result = directory
            .move_account(
                &AccountId::new("2"),
                &GroupingId::new("ou-b"),
                &GroupingId::new("ou-grave"),
            )
            .await;
        assert!(matches!(result, Err(DirectoryError::SourceMismatch { .. })));
        assert_eq!(
            directory.parent_of(&AccountId::new("2")),
            Some(GroupingId::new("ou-a"))
        );
    }

    #[tokio::test]
    async fn oversized_page_token_yields_empty_last_page() {
        let directory = InMemoryDirectory::with_page_size(org(), 2);
        let page = directory
            .list_accounts(Some(usize::MAX.to_string()))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn orphan_account_has_no_parent() {
        let snapshot = org().orphan_account("9", "orphan", AccountState::Suspended);
        let directory = InMemoryDirectory::new(snapshot);
        let result = directory.list_parent(&AccountId::new("9")).await;
        assert!(matches!(result, Err(DirectoryError::ParentNotFound { .. })));
    }

    #[tokio::test]
    async fn missing_root() {
        let directory = InMemoryDirectory::new(DirectorySnapshot::default());
        assert!(matches!(
            directory.list_root().await,
            Err(DirectoryError::NoRoot)
        ));
    }

    #[test]
    fn validate_rejects_dangling_parent() {
        let snapshot = org().grouping("ou-x", "X", "ou-nowhere");
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    #[test]
    fn snapshot_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("org.json");
        org().save(&json_path).unwrap();
        assert_eq!(DirectorySnapshot::load(&json_path).unwrap(), org());

        let yaml_path = dir.path().join("org.yaml");
        org().save(&yaml_path).unwrap();
        assert_eq!(DirectorySnapshot::load(&yaml_path).unwrap(), org());
    }
}
