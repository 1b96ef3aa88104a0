//! Booth registration rules for boothbook.
//!
//! Three operations run on top of the commit layer in `boothbook-ledger`:
//!
//! - [`RegistrationService::register`]: book a vendor into a booth for a day
//! - [`RegistrationService::relocate`]: move an existing booking to another booth
//! - [`RetentionService::purge`]: drop bookings older than the retention window
//!
//! Each call is a stateless read-validate-write cycle over documents read at
//! one pinned commit. All domain checks run before anything is written, so a
//! rejected request never leaves a partial commit. If another writer moves
//! the branch past that commit before this call publishes, the call fails
//! with [`ServiceError::StoreConflict`] and must be repeated from scratch;
//! nothing here retries on its own.
//!
//! Uniqueness invariants enforced at write time:
//!
//! - at most one schedule record per `(vendor_id, date)`
//! - at most one schedule record per `(booth_location, date)`

pub mod clock;
pub mod error;
pub mod registration;
pub mod retention;
pub mod services;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use error::{ServiceError, ServiceResult};
pub use registration::{Registration, RegistrationService, Relocation};
pub use retention::{PurgeReport, RetentionPolicy, RetentionService};
pub use services::BoothServices;

#[cfg(test)]
pub(crate) mod testing;
