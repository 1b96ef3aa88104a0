use boothbook_store::StoreError;
use thiserror::Error;

use crate::documents::DocumentName;

/// Errors from the commit layer.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Another writer advanced the branch first. Nothing was published.
    #[error("commit conflict on branch {branch}: tip moved since the transaction was built")]
    Conflict { branch: String },

    /// A transaction with no files was submitted.
    #[error("transaction has no files")]
    EmptyTransaction,

    /// A document is absent at the branch tip.
    #[error("{document} document missing at {path}")]
    MissingDocument { document: DocumentName, path: String },

    /// A document exists but is not the expected JSON shape.
    #[error("cannot decode {document} document: {reason}")]
    Decode { document: DocumentName, reason: String },

    /// A document could not be serialized.
    #[error("cannot encode {document} document: {reason}")]
    Encode { document: DocumentName, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
