use std::sync::Arc;

use async_trait::async_trait;
use boothbook_types::ObjectHash;

use crate::error::StoreResult;

/// A file read at a branch tip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
    /// Decoded UTF-8 file body.
    pub content: String,
    /// Blob hash of the body as the store reports it.
    pub hash: ObjectHash,
}

/// A path and its full replacement content, supplied as literal text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeFile {
    pub path: String,
    pub content: String,
}

impl TreeFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Request/response access to one remote repository.
///
/// Implementations must be thread-safe and must enforce fast-forward-only
/// branch updates in `advance_branch` when `force` is `false`. That check is
/// the only concurrency guard boothbook has.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read `path` at `reference`: a branch name (its current tip) or a
    /// commit hash.
    ///
    /// Returns `NotFound` if the reference or the path does not exist.
    async fn fetch_file(&self, reference: &str, path: &str) -> StoreResult<FileContent>;

    /// Commit hash `branch` currently points at.
    async fn branch_tip(&self, branch: &str) -> StoreResult<ObjectHash>;

    /// Tree hash recorded in `commit`.
    async fn read_commit_tree(&self, commit: &ObjectHash) -> StoreResult<ObjectHash>;

    /// Build a tree from `base_tree` with each of `files` replacing its path.
    ///
    /// Paths not named in `files` keep their base content.
    async fn commit_tree(&self, base_tree: &ObjectHash, files: &[TreeFile]) -> StoreResult<ObjectHash>;

    /// Create a commit of `tree` whose sole parent is `parent`.
    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectHash,
        parent: &ObjectHash,
    ) -> StoreResult<ObjectHash>;

    /// Point `branch` at `commit`.
    ///
    /// Without `force` the store refuses anything but a fast-forward from the
    /// current tip and returns `Rejected`.
    async fn advance_branch(&self, branch: &str, commit: &ObjectHash, force: bool) -> StoreResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn fetch_file(&self, reference: &str, path: &str) -> StoreResult<FileContent> {
        (**self).fetch_file(reference, path).await
    }

    async fn branch_tip(&self, branch: &str) -> StoreResult<ObjectHash> {
        (**self).branch_tip(branch).await
    }

    async fn read_commit_tree(&self, commit: &ObjectHash) -> StoreResult<ObjectHash> {
        (**self).read_commit_tree(commit).await
    }

    async fn commit_tree(&self, base_tree: &ObjectHash, files: &[TreeFile]) -> StoreResult<ObjectHash> {
        (**self).commit_tree(base_tree, files).await
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &ObjectHash,
        parent: &ObjectHash,
    ) -> StoreResult<ObjectHash> {
        (**self).create_commit(message, tree, parent).await
    }

    async fn advance_branch(&self, branch: &str, commit: &ObjectHash, force: bool) -> StoreResult<()> {
        (**self).advance_branch(branch, commit, force).await
    }
}
