//! Testing utilities for the graveyard workspace
//!
//! Shared fixtures, a directory with scripted faults, and a recording notifier.

#![allow(missing_docs)]

use async_trait::async_trait;
use graveyard_core::directory::DirectoryClient;
use graveyard_core::{
    Account, AccountId, AccountState, DirectoryError, DirectoryResult, DirectorySnapshot,
    Grouping, GroupingId, InMemoryDirectory, InvocationContext, Notifier, NotifyError, Page,
    RelocationSummary,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

pub const ROOT_ID: &str = "r-abcd";
pub const GRAVEYARD_ID: &str = "ou-graveyard";
pub const GRAVEYARD_NAME: &str = "Graveyard";

/// root -> {A, B}, B -> {Graveyard}; account 1 active under A, 2 suspended
/// under A, 3 suspended under Graveyard
pub fn sample_organization() -> DirectorySnapshot {
    DirectorySnapshot::with_root(ROOT_ID)
        .grouping("ou-a", "A", ROOT_ID)
        .grouping("ou-b", "B", ROOT_ID)
        .grouping(GRAVEYARD_ID, GRAVEYARD_NAME, "ou-b")
        .account("1", "production", AccountState::Active, "ou-a")
        .account("2", "closed-account", AccountState::Suspended, "ou-a")
        .account("3", "already-buried", AccountState::Suspended, GRAVEYARD_ID)
}

/// Organization with `count` suspended accounts under `ou-a`, ids `100..`
pub fn closed_accounts_organization(count: usize) -> DirectorySnapshot {
    let mut snapshot = DirectorySnapshot::with_root(ROOT_ID)
        .grouping("ou-a", "A", ROOT_ID)
        .grouping(GRAVEYARD_ID, GRAVEYARD_NAME, ROOT_ID);
    for i in 0..count {
        snapshot = snapshot.account(
            account_id(i).0,
            format!("closed-{i}"),
            AccountState::Suspended,
            "ou-a",
        );
    }
    snapshot
}

/// Identifier used by [`closed_accounts_organization`] for index `i`
pub fn account_id(i: usize) -> AccountId {
    AccountId::new(format!("{}", 100 + i))
}

pub fn test_context() -> InvocationContext {
    InvocationContext::new("test-request-id-12345")
}

/// Which call a scripted fault applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    ListRoot,
    ListChildren(GroupingId),
    ListAccounts,
    ListParent(AccountId),
    Move(AccountId),
}

#[derive(Debug, Default)]
struct Script {
    faults: HashMap<Call, VecDeque<DirectoryError>>,
    always: HashMap<Call, DirectoryError>,
    log: Vec<Call>,
}

/// In-memory directory with injectable failures and a call log
///
/// Queued faults are consumed one per matching call; persistent faults
/// apply to every matching call. Calls without a fault go to the
/// underlying [`InMemoryDirectory`].
#[derive(Debug)]
pub struct ScriptedDirectory {
    inner: InMemoryDirectory,
    script: Mutex<Script>,
}

impl ScriptedDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self::with_page_size(snapshot, graveyard_core::directory::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(snapshot: DirectorySnapshot, page_size: usize) -> Self {
        Self {
            inner: InMemoryDirectory::with_page_size(snapshot, page_size),
            script: Mutex::new(Script::default()),
        }
    }

    /// Fail the next `times` matching calls with `error`
    pub fn fail_next(&self, call: Call, times: usize, error: DirectoryError) -> &Self {
        let mut script = self.script.lock();
        let queue = script.faults.entry(call).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
        self
    }

    /// Fail every matching call with `error`
    pub fn fail_always(&self, call: Call, error: DirectoryError) -> &Self {
        self.script.lock().always.insert(call, error);
        self
    }

    /// Number of recorded calls equal to `call`
    pub fn calls(&self, call: &Call) -> usize {
        self.script.lock().log.iter().filter(|c| *c == call).count()
    }

    /// Number of move calls for `account`, failed or not
    pub fn move_calls(&self, account: &AccountId) -> usize {
        self.calls(&Call::Move(account.clone()))
    }

    /// Every move call in order
    pub fn move_log(&self) -> Vec<AccountId> {
        self.script
            .lock()
            .log
            .iter()
            .filter_map(|c| match c {
                Call::Move(account) => Some(account.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn parent_of(&self, account: &AccountId) -> Option<GroupingId> {
        self.inner.parent_of(account)
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        self.inner.snapshot()
    }

    fn intercept(&self, call: Call) -> DirectoryResult<()> {
        let mut script = self.script.lock();
        script.log.push(call.clone());
        if let Some(error) = script.faults.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        match script.always.get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DirectoryClient for ScriptedDirectory {
    async fn list_root(&self) -> DirectoryResult<GroupingId> {
        self.intercept(Call::ListRoot)?;
        self.inner.list_root().await
    }

    async fn list_child_groupings(
        &self,
        parent: &GroupingId,
        page_token: Option<String>,
    ) -> DirectoryResult<Page<Grouping>> {
        self.intercept(Call::ListChildren(parent.clone()))?;
        self.inner.list_child_groupings(parent, page_token).await
    }

    async fn list_accounts(&self, page_token: Option<String>) -> DirectoryResult<Page<Account>> {
        self.intercept(Call::ListAccounts)?;
        self.inner.list_accounts(page_token).await
    }

    async fn list_parent(&self, account: &AccountId) -> DirectoryResult<GroupingId> {
        self.intercept(Call::ListParent(account.clone()))?;
        self.inner.list_parent(account).await
    }

    async fn move_account(
        &self,
        account: &AccountId,
        source: &GroupingId,
        destination: &GroupingId,
    ) -> DirectoryResult<()> {
        self.intercept(Call::Move(account.clone()))?;
        self.inner.move_account(account, source, destination).await
    }
}

/// Notifier that keeps every summary it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<(RelocationSummary, InvocationContext)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(RelocationSummary, InvocationContext)> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_failures(
        &self,
        summary: &RelocationSummary,
        ctx: &InvocationContext,
    ) -> Result<(), NotifyError> {
        self.received.lock().push((summary.clone(), ctx.clone()));
        Ok(())
    }
}

pub fn throttled(operation: &'static str) -> DirectoryError {
    DirectoryError::transient(operation, "Rate exceeded")
}
