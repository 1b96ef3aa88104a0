use std::sync::Arc;
use std::time::Duration;

use boothbook_store::{ObjectStore, StoreError, StoreResult};
use boothbook_types::ObjectHash;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::transaction::CommitTransaction;

/// How the coordinator treats an unavailable store.
///
/// Only the inert steps (tip, tree, new tree, new commit) are ever re-run.
/// The branch advance is never retried, and neither is a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts at steps 1–4 after `Unavailable`. Zero disables retry.
    pub unavailable_retries: u32,
    /// Delay before the first retry; doubles for each further attempt.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            unavailable_retries: 0,
            backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// A commit built on a known tip but not yet published.
struct Staged {
    parent: ObjectHash,
    commit: ObjectHash,
}

/// Publishes [`CommitTransaction`]s atomically on a branch.
#[derive(Clone)]
pub struct CommitCoordinator {
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
}

impl CommitCoordinator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Publish `tx` on `branch` and return the new commit hash.
    ///
    /// Per-file hashes observed at read time are not compared here. When the
    /// transaction is based on the commit its documents were read at, that
    /// commit is the parent; otherwise the tip read in step 1 is. Either way a
    /// branch that moved past the parent before step 5 is refused by the store
    /// as a non-fast-forward and reported as [`LedgerError::Conflict`].
    pub async fn commit(&self, branch: &str, tx: &CommitTransaction) -> LedgerResult<ObjectHash> {
        if tx.is_empty() {
            return Err(LedgerError::EmptyTransaction);
        }

        let staged = self.stage_with_retry(branch, tx).await?;

        match self.store.advance_branch(branch, &staged.commit, false).await {
            Ok(()) => {
                tracing::info!(
                    branch,
                    parent = staged.parent.short(),
                    commit = staged.commit.short(),
                    files = tx.len(),
                    message = tx.message(),
                    "branch advanced"
                );
                Ok(staged.commit)
            }
            Err(StoreError::Rejected { .. }) => {
                tracing::warn!(
                    branch,
                    parent = staged.parent.short(),
                    commit = staged.commit.short(),
                    "branch moved under transaction, abandoning"
                );
                Err(LedgerError::Conflict {
                    branch: branch.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn stage_with_retry(&self, branch: &str, tx: &CommitTransaction) -> LedgerResult<Staged> {
        let mut attempt = 0;
        loop {
            match self.stage(branch, tx).await {
                Ok(staged) => return Ok(staged),
                Err(StoreError::Unavailable(reason)) if attempt < self.retry.unavailable_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(branch, attempt, %reason, ?delay, "store unavailable while staging commit, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Steps 1–4: nothing here is visible to readers of the branch.
    async fn stage(&self, branch: &str, tx: &CommitTransaction) -> StoreResult<Staged> {
        let parent = match tx.base() {
            Some(base) => base.clone(),
            None => self.store.branch_tip(branch).await?,
        };
        let base_tree = self.store.read_commit_tree(&parent).await?;
        tracing::debug!(branch, tip = parent.short(), base_tree = base_tree.short(), "staging commit");

        let tree = self.store.commit_tree(&base_tree, tx.files()).await?;
        let commit = self.store.create_commit(tx.message(), &tree, &parent).await?;
        tracing::debug!(tree = tree.short(), commit = commit.short(), "commit staged");

        Ok(Staged { parent, commit })
    }
}

impl std::fmt::Debug for CommitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitCoordinator").field("retry", &self.retry).finish()
    }
}
