//! Records stored in the `vendors`, `booths`, and `schedule` documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::date::ScheduleDate;

/// Keys a record carries beyond the ones boothbook reads.
///
/// Kept so that rewriting a document never drops data other tools put there.
pub type ExtraFields = Map<String, Value>;

/// A vendor allowed to register for booths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub vendor_name: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Vendor {
    pub fn new(vendor_id: impl Into<String>, vendor_name: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            vendor_name: vendor_name.into(),
            extra: ExtraFields::new(),
        }
    }
}

/// A booth location.
///
/// `booth_location` is the unique key. Booths created implicitly use the raw
/// location string as their display name too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booth {
    pub booth_location: String,
    pub booth_name: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Booth {
    pub fn new(booth_location: impl Into<String>, booth_name: impl Into<String>) -> Self {
        Self {
            booth_location: booth_location.into(),
            booth_name: booth_name.into(),
            extra: ExtraFields::new(),
        }
    }

    /// A booth first seen as a bare location string.
    ///
    /// No case or whitespace normalization: `"A1"` and `"a1"` are different
    /// booths.
    pub fn at_location(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            booth_name: location.clone(),
            booth_location: location,
            extra: ExtraFields::new(),
        }
    }
}

/// One vendor occupying one booth on one day.
///
/// `vendor_name` and `booth_name` are copied at write time and never
/// refreshed, so renaming a vendor does not rewrite its past records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub vendor_id: String,
    pub vendor_name: String,
    pub booth_location: String,
    pub booth_name: String,
    pub date: ScheduleDate,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ScheduleRecord {
    /// Build a fresh record for `vendor` at `booth` on `date`.
    pub fn new(vendor: &Vendor, booth: &Booth, date: NaiveDate, submitted_at: DateTime<Utc>) -> Self {
        Self {
            vendor_id: vendor.vendor_id.clone(),
            vendor_name: vendor.vendor_name.clone(),
            booth_location: booth.booth_location.clone(),
            booth_name: booth.booth_name.clone(),
            date: date.into(),
            submitted_at,
            updated_at: None,
            extra: ExtraFields::new(),
        }
    }

    /// Returns `true` if this record books `vendor_id` on `date`.
    pub fn books_vendor(&self, vendor_id: &str, date: NaiveDate) -> bool {
        self.vendor_id == vendor_id && self.date == date
    }

    /// Returns `true` if this record occupies `location` on `date`.
    pub fn occupies(&self, location: &str, date: NaiveDate) -> bool {
        self.booth_location == location && self.date == date
    }

    /// Move this record to `booth`, stamping `updated_at`.
    ///
    /// Vendor fields, date, `submitted_at` and extra keys are left untouched.
    pub fn move_to(&mut self, booth: &Booth, at: DateTime<Utc>) {
        self.booth_location = booth.booth_location.clone();
        self.booth_name = booth.booth_name.clone();
        self.updated_at = Some(at);
    }
}
