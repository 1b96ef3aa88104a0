//! Transactional commit layer for boothbook.
//!
//! The remote repository has exactly one atomic primitive: moving a branch
//! from commit A to commit B, refused unless B descends from A. This crate
//! builds multi-document, all-or-nothing writes on top of it.
//!
//! # Read side
//!
//! [`DocumentRepository`] fetches a named JSON document at the branch tip and
//! decodes it into a typed collection. The blob hash it was read at travels
//! with the [`Document`] for logging only. A [`Snapshot`] pins one commit so
//! every document of a read-modify-write comes from the same state.
//!
//! # Write side
//!
//! [`CommitCoordinator::commit`] takes a [`CommitTransaction`] and runs:
//!
//! 1. read the branch tip, or take the transaction's base commit
//! 2. read the tip's tree
//! 3. build a new tree with each file replacing its path
//! 4. create a commit of that tree with the tip as sole parent
//! 5. advance the branch, fast-forward only
//!
//! Steps 1–4 only create inert content-addressed objects. Step 5 either
//! publishes the whole transaction or fails with [`LedgerError::Conflict`],
//! in which case the caller must re-read and redo its work.

pub mod coordinator;
pub mod documents;
pub mod error;
pub mod transaction;

pub use coordinator::{CommitCoordinator, RetryPolicy};
pub use documents::{Document, DocumentName, DocumentPaths, DocumentRepository, Snapshot};
pub use error::{LedgerError, LedgerResult};
pub use transaction::CommitTransaction;
