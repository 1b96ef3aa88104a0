use thiserror::Error;

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path or ref does not exist at the requested revision.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Transport failure, timeout, or a 5xx from the remote.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The credential was missing, wrong, or lacks permission (401/403).
    #[error("authentication failed ({status}): {body}")]
    AuthFailure { status: u16, body: String },

    /// A non-fast-forward branch update was refused.
    #[error("branch update rejected for {branch}: not a fast-forward")]
    Rejected { branch: String },

    /// The remote answered with a status this client does not understand.
    #[error("unexpected response ({status}): {body}")]
    Unexpected { status: u16, body: String },

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
