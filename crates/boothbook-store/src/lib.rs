//! Object store client for boothbook.
//!
//! boothbook keeps its state as files in a remote git repository and never
//! talks to a database. This crate is the only place that knows how to reach
//! that repository. It has no idea what the files mean.
//!
//! # Operations
//!
//! Every backend implements [`ObjectStore`]:
//!
//! - `fetch_file`: decoded file content plus its blob hash at a branch tip
//! - `branch_tip`: commit hash a branch currently points at
//! - `read_commit_tree`: tree hash of a commit
//! - `commit_tree`: new tree from a base tree plus literal file contents
//! - `create_commit`: new commit object with a single parent
//! - `advance_branch`: move a branch, fast-forward only unless forced
//!
//! Blobs, trees and commits are inert until a branch points at them, so only
//! `advance_branch` has an externally visible effect. The remote rejects a
//! non-fast-forward advance, which is how concurrent writers are detected.
//!
//! # Backends
//!
//! - [`GitHubStore`]: the GitHub Git Data and Contents REST APIs
//! - [`InMemoryStore`]: content-addressed in-process store for tests
//!
//! No call here is retried. Retry policy belongs to the caller.

pub mod config;
pub mod error;
pub mod github;
pub mod memory;
pub mod traits;

pub use config::RepoConfig;
pub use error::{StoreError, StoreResult};
pub use github::GitHubStore;
pub use memory::{CommitObject, InMemoryStore};
pub use traits::{FileContent, ObjectStore, TreeFile};
