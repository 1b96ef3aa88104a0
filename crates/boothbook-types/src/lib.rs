//! Foundation types for boothbook.
//!
//! Every record boothbook persists lives in one of three JSON documents inside
//! a remote, content-addressed repository. This crate defines the shapes of
//! those records and the identifiers used to talk about repository objects.
//!
//! # Key Types
//!
//! - [`Vendor`]: a registered vendor (read-only from boothbook's perspective)
//! - [`Booth`]: a booth location, created implicitly on first reference
//! - [`ScheduleRecord`]: one vendor occupying one booth on one day
//! - [`ObjectHash`]: hex identifier of a blob, tree, or commit in the store
//! - [`parse_schedule_date`]: strict `YYYY-MM-DD` parsing of request input
//! - [`ScheduleDate`]: a stored record date, tolerant of legacy text

pub mod date;
pub mod error;
pub mod hash;
pub mod model;

pub use date::{months_before, parse_schedule_date, rolled_date, ScheduleDate, DATE_FORMAT};
pub use error::TypeError;
pub use hash::ObjectHash;
pub use model::{Booth, ScheduleRecord, Vendor};
