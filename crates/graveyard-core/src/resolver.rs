//! Grouping resolution
//!
//! Finds a grouping by exact name anywhere under the organization root.
//! The walk is depth-first with an explicit stack, so tree depth never
//! turns into call-stack depth.

use crate::directory::{all_child_groupings, DirectoryClient};
use crate::error::JobError;
use crate::types::GroupingId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Resolves grouping names to identifiers
#[derive(Debug, Clone)]
pub struct GroupingResolver<D: ?Sized> {
    directory: Arc<D>,
}

impl<D: DirectoryClient + ?Sized> GroupingResolver<D> {
    /// Create a resolver over `directory`
    #[inline]
    #[must_use]
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Identifier of the grouping named exactly `name`
    ///
    /// Each grouping's children are listed in full (every page) and matched
    /// in listing order before any of them is descended into. The first
    /// match wins; siblings' subtrees are visited in listing order.
    /// A match among a node's children beats a deeper match under an
    /// earlier sibling.
    ///
    /// # Errors
    /// - `JobError::GroupingNotFound` if no grouping in the tree has that name
    /// - `JobError::Resolution` if a directory listing fails
    pub async fn resolve(&self, name: &str) -> Result<GroupingId, JobError> {
        info!(
            action = "resolve_grouping",
            grouping_name = name,
            "Searching for organizational unit by name"
        );

        let root = self
            .directory
            .list_root()
            .await
            .map_err(JobError::Resolution)?;

        let mut pending = vec![root];
        let mut visited = HashSet::new();

        while let Some(parent) = pending.pop() {
            if !visited.insert(parent.clone()) {
                continue;
            }

            let children = all_child_groupings(self.directory.as_ref(), &parent)
                .await
                .map_err(JobError::Resolution)?;

            if let Some(found) = children.iter().find(|child| child.name == name) {
                debug!(
                    action = "resolve_grouping",
                    grouping_name = name,
                    grouping_id = %found.id,
                    "Found organizational unit"
                );
                return Ok(found.id.clone());
            }

            // Reversed so the first-listed child is popped next.
            pending.extend(children.into_iter().rev().map(|child| child.id));
        }

        error!(
            action = "resolve_grouping",
            grouping_name = name,
            "Organizational unit not found"
        );
        Err(JobError::GroupingNotFound {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectorySnapshot, InMemoryDirectory, MockDirectoryClient};
    use crate::error::DirectoryError;
    use crate::types::{Grouping, Page};
    use mockall::predicate::eq;

    fn resolver(snapshot: DirectorySnapshot, page_size: usize) -> GroupingResolver<InMemoryDirectory> {
        GroupingResolver::new(Arc::new(InMemoryDirectory::with_page_size(
            snapshot, page_size,
        )))
    }

    #[tokio::test]
    async fn resolves_root_level_grouping() {
        let snapshot = DirectorySnapshot::with_root("r-abcd")
            .grouping("ou-graveyard", "Graveyard", "r-abcd")
            .grouping("ou-engineering", "Engineering", "r-abcd");

        let id = resolver(snapshot, 20).resolve("Graveyard").await.unwrap();
        assert_eq!(id, GroupingId::new("ou-graveyard"));
    }

    #[tokio::test]
    async fn resolves_nested_grouping_across_pages() {
        let snapshot = DirectorySnapshot::with_root("r-root")
            .grouping("ou-a", "A", "r-root")
            .grouping("ou-b", "B", "r-root")
            .grouping("ou-c", "C", "r-root")
            .grouping("ou-b1", "B1", "ou-b")
            .grouping("ou-b2", "B2", "ou-b")
            .grouping("ou-deep", "Graveyard", "ou-b2");

        let id = resolver(snapshot, 1).resolve("Graveyard").await.unwrap();
        assert_eq!(id, GroupingId::new("ou-deep"));
    }

    #[tokio::test]
    async fn match_is_case_sensitive() {
        let snapshot =
            DirectorySnapshot::with_root("r-root").grouping("ou-g", "graveyard", "r-root");

        let err = resolver(snapshot, 20).resolve("Graveyard").await.unwrap_err();
        assert!(matches!(err, JobError::GroupingNotFound { ref name } if name == "Graveyard"));
    }

    #[tokio::test]
    async fn earlier_subtree_wins_over_later_sibling() {
        let snapshot = DirectorySnapshot::with_root("r-root")
            .grouping("ou-a", "A", "r-root")
            .grouping("ou-b", "B", "r-root")
            .grouping("ou-a-grave", "Graveyard", "ou-a")
            .grouping("ou-b-grave", "Graveyard", "ou-b");

        let id = resolver(snapshot, 20).resolve("Graveyard").await.unwrap();
        assert_eq!(id, GroupingId::new("ou-a-grave"));
    }

    #[tokio::test]
    async fn sibling_match_beats_nested_match_under_earlier_child() {
        let snapshot = DirectorySnapshot::with_root("r-root")
            .grouping("ou-a", "A", "r-root")
            .grouping("ou-top-grave", "Graveyard", "r-root")
            .grouping("ou-nested-grave", "Graveyard", "ou-a");

        let id = resolver(snapshot, 20).resolve("Graveyard").await.unwrap();
        assert_eq!(id, GroupingId::new("ou-top-grave"));
    }

    #[tokio::test]
    async fn empty_tree_is_not_found() {
        let err = resolver(DirectorySnapshot::with_root("r-root"), 20)
            .resolve("Graveyard")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_retry() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_root()
            .times(1)
            .returning(|| Ok(GroupingId::new("r-root")));
        mock.expect_list_child_groupings()
            .with(eq(GroupingId::new("r-root")), eq(None))
            .times(1)
            .returning(|_, _| Ok(Page::last(vec![Grouping::new("ou-a", "A")])));
        mock.expect_list_child_groupings()
            .with(eq(GroupingId::new("ou-a")), eq(None))
            .times(1)
            .returning(|_, _| Err(DirectoryError::transient("list_child_groupings", "throttled")));

        let err = GroupingResolver::new(Arc::new(mock))
            .resolve("Graveyard")
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Resolution(DirectoryError::Service { .. })));
    }

    #[tokio::test]
    async fn root_failure_is_resolution_error() {
        let mut mock = MockDirectoryClient::new();
        mock.expect_list_root()
            .times(1)
            .returning(|| Err(DirectoryError::NoRoot));

        let err = GroupingResolver::new(Arc::new(mock))
            .resolve("Graveyard")
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Resolution(DirectoryError::NoRoot)));
    }
}
