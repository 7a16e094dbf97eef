//! Directory client boundary
//!
//! The organization directory (root, groupings, accounts) is an external
//! service. The job talks to it only through [`DirectoryClient`]; the
//! in-memory implementation backs rehearsal runs and tests.

mod memory;

pub use memory::{
    DirectorySnapshot, InMemoryDirectory, SnapshotAccount, SnapshotError, SnapshotGrouping,
    DEFAULT_PAGE_SIZE,
};

use crate::error::DirectoryResult;
use crate::types::{Account, AccountId, Grouping, GroupingId, Page};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the job consumes from the organization directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Identifier of the organization's single root
    async fn list_root(&self) -> DirectoryResult<GroupingId>;

    /// One page of the immediate child groupings of `parent`
    async fn list_child_groupings(
        &self,
        parent: &GroupingId,
        page_token: Option<String>,
    ) -> DirectoryResult<Page<Grouping>>;

    /// One page of all accounts in the organization
    async fn list_accounts(&self, page_token: Option<String>) -> DirectoryResult<Page<Account>>;

    /// Current parent grouping of `account`
    ///
    /// # Errors
    /// - `DirectoryError::ParentNotFound` if the account has no parent
    async fn list_parent(&self, account: &AccountId) -> DirectoryResult<GroupingId>;

    /// Move `account` from `source` to `destination`
    async fn move_account(
        &self,
        account: &AccountId,
        source: &GroupingId,
        destination: &GroupingId,
    ) -> DirectoryResult<()>;
}

#[async_trait]
impl<T: DirectoryClient + ?Sized> DirectoryClient for Arc<T> {
    async fn list_root(&self) -> DirectoryResult<GroupingId> {
        (**self).list_root().await
    }

    async fn list_child_groupings(
        &self,
        parent: &GroupingId,
        page_token: Option<String>,
    ) -> DirectoryResult<Page<Grouping>> {
        (**self).list_child_groupings(parent, page_token).await
    }

    async fn list_accounts(&self, page_token: Option<String>) -> DirectoryResult<Page<Account>> {
        (**self).list_accounts(page_token).await
    }

    async fn list_parent(&self, account: &AccountId) -> DirectoryResult<GroupingId> {
        (**self).list_parent(account).await
    }

    async fn move_account(
        &self,
        account: &AccountId,
        source: &GroupingId,
        destination: &GroupingId,
    ) -> DirectoryResult<()> {
        (**self).move_account(account, source, destination).await
    }
}

/// Every child grouping of `parent`, across all pages
pub async fn all_child_groupings<D: DirectoryClient + ?Sized>(
    directory: &D,
    parent: &GroupingId,
) -> DirectoryResult<Vec<Grouping>> {
    let mut children = Vec::new();
    let mut token = None;
    loop {
        let page = directory.list_child_groupings(parent, token).await?;
        children.extend(page.items);
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Ok(children),
        }
    }
}

/// Every account in the organization, across all pages
pub async fn all_accounts<D: DirectoryClient + ?Sized>(
    directory: &D,
) -> DirectoryResult<Vec<Account>> {
    let mut accounts = Vec::new();
    let mut token = None;
    loop {
        let page = directory.list_accounts(token).await?;
        accounts.extend(page.items);
        match page.next_token {
            Some(next) => token = Some(next),
            None => return Ok(accounts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::types::AccountState;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn child_listing_follows_tokens() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_child_groupings()
            .with(eq(GroupingId::new("r-1")), eq(None))
            .times(1)
            .returning(|_, _| Ok(Page::with_next(vec![Grouping::new("ou-a", "A")], "t1")));
        mock.expect_list_child_groupings()
            .with(eq(GroupingId::new("r-1")), eq(Some("t1".to_string())))
            .times(1)
            .returning(|_, _| Ok(Page::last(vec![Grouping::new("ou-b", "B")])));

        let children = all_child_groupings(&mock, &GroupingId::new("r-1"))
            .await
            .unwrap();
        let names: Vec<_> = children.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn account_listing_stops_on_error() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_accounts()
            .with(eq(None))
            .times(1)
            .returning(|_| {
                Ok(Page::with_next(
                    vec![Account::new("1", "one", AccountState::Active)],
                    "t1",
                ))
            });
        mock.expect_list_accounts()
            .with(eq(Some("t1".to_string())))
            .times(1)
            .returning(|_| Err(DirectoryError::transient("list_accounts", "throttled")));

        let result = all_accounts(&mock).await;
        assert!(matches!(result, Err(DirectoryError::Service { .. })));
    }
}
