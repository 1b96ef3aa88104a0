use boothbook_ledger::LedgerError;
use boothbook_store::StoreError;
use boothbook_types::TypeError;
use chrono::NaiveDate;
use thiserror::Error;

/// Outcome taxonomy of the booth operations.
///
/// Domain variants are detected before anything is written. Store variants
/// mean the request reached the repository and failed there.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown vendor {vendor_id}")]
    UnknownVendor { vendor_id: String },

    #[error("no booking for vendor {vendor_id} on {date}")]
    RecordNotFound { vendor_id: String, date: NaiveDate },

    #[error("vendor {vendor_name} ({vendor_id}) is already booked at {booth_location} on {date}")]
    VendorAlreadyBooked {
        vendor_id: String,
        vendor_name: String,
        date: NaiveDate,
        booth_location: String,
    },

    #[error("booth {booth_location} is already taken by {vendor_name} on {date}")]
    BoothAlreadyTaken {
        booth_location: String,
        date: NaiveDate,
        vendor_name: String,
    },

    #[error("vendor {vendor_id} is already at {booth_location} on {date}")]
    NoOpRelocation {
        vendor_id: String,
        date: NaiveDate,
        booth_location: String,
    },

    /// The branch moved while the request was in flight. Nothing was written.
    #[error("the schedule changed while this request was processed on branch {branch}; retry")]
    StoreConflict { branch: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store rejected credentials: {0}")]
    AuthFailure(String),

    /// A document is missing or is not the expected JSON shape.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// True when the same request may succeed if simply sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict { .. })
    }

    /// Rejected by a uniqueness rule.
    pub fn is_domain_conflict(&self) -> bool {
        matches!(self, Self::VendorAlreadyBooked { .. } | Self::BoothAlreadyTaken { .. })
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Rejected { branch } => Self::StoreConflict { branch },
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            e @ StoreError::AuthFailure { .. } => Self::AuthFailure(e.to_string()),
            e @ StoreError::NotFound { .. } => Self::Corrupt(e.to_string()),
            e @ StoreError::Decode(_) => Self::Corrupt(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Conflict { branch } => Self::StoreConflict { branch },
            LedgerError::Store(e) => e.into(),
            e @ (LedgerError::MissingDocument { .. } | LedgerError::Decode { .. }) => Self::Corrupt(e.to_string()),
            e @ (LedgerError::Encode { .. } | LedgerError::EmptyTransaction) => Self::Internal(e.to_string()),
        }
    }
}

impl From<TypeError> for ServiceError {
    fn from(e: TypeError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
