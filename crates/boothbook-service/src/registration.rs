//! Booking and moving vendors between booths.

use std::sync::Arc;

use boothbook_ledger::{CommitCoordinator, CommitTransaction, Document, DocumentRepository};
use boothbook_types::{parse_schedule_date, Booth, ObjectHash, ScheduleRecord};
use serde::Serialize;

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};

/// A booking that has been published.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Registration {
    pub record: ScheduleRecord,
    /// Set when the booth did not exist and was created with this booking.
    pub new_booth: Option<Booth>,
    pub commit: ObjectHash,
}

/// A move that has been published.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Relocation {
    pub record: ScheduleRecord,
    pub previous_location: String,
    pub new_booth: Option<Booth>,
    pub commit: ObjectHash,
}

/// Runs `register` and `relocate` against a snapshot of the branch tip.
///
/// Each write is parented on the commit its documents were read at, so a
/// rival write landing in between turns into a conflict instead of being
/// overwritten.
#[derive(Clone)]
pub struct RegistrationService {
    documents: DocumentRepository,
    coordinator: CommitCoordinator,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    pub fn new(documents: DocumentRepository, coordinator: CommitCoordinator, clock: Arc<dyn Clock>) -> Self {
        Self {
            documents,
            coordinator,
            clock,
        }
    }

    /// Book `vendor_id` into `booth_location` on `date`.
    ///
    /// An unknown location is added to the booth list in the same commit.
    pub async fn register(&self, vendor_id: &str, booth_location: &str, date: &str) -> ServiceResult<Registration> {
        let vendor_id = required("vendor_id", vendor_id)?;
        let booth_location = required("booth_location", booth_location)?;
        let date = parse_schedule_date(date)?;

        let snapshot = self.documents.snapshot().await?;
        let (vendors, mut booths, mut schedule) =
            tokio::try_join!(snapshot.vendors(), snapshot.booths(), snapshot.schedule())?;

        let vendor = vendors
            .items
            .iter()
            .find(|v| v.vendor_id == vendor_id)
            .ok_or_else(|| {
                rejected(ServiceError::UnknownVendor {
                    vendor_id: vendor_id.to_string(),
                })
            })?;

        let (booth, new_booth) = resolve_booth(&mut booths, booth_location);

        if let Some(existing) = schedule.items.iter().find(|r| r.books_vendor(vendor_id, date)) {
            return Err(rejected(ServiceError::VendorAlreadyBooked {
                vendor_id: vendor_id.to_string(),
                vendor_name: vendor.vendor_name.clone(),
                date,
                booth_location: existing.booth_location.clone(),
            }));
        }
        if let Some(holder) = schedule.items.iter().find(|r| r.occupies(booth_location, date)) {
            return Err(rejected(ServiceError::BoothAlreadyTaken {
                booth_location: booth_location.to_string(),
                date,
                vendor_name: holder.vendor_name.clone(),
            }));
        }

        let record = ScheduleRecord::new(vendor, &booth, date, self.clock.now());
        schedule.items.push(record.clone());

        let message = format!("register: {} - {booth_location} ({date})", vendor.vendor_name);
        let commit = self
            .publish(message, snapshot.commit(), &schedule, new_booth.is_some().then_some(&booths))
            .await?;
        tracing::info!(
            vendor_id,
            booth_location,
            %date,
            new_booth = new_booth.is_some(),
            commit = commit.short(),
            "vendor registered"
        );

        Ok(Registration {
            record,
            new_booth,
            commit,
        })
    }

    /// Move the booking of `vendor_id` on `date` to `new_location`.
    pub async fn relocate(&self, vendor_id: &str, date: &str, new_location: &str) -> ServiceResult<Relocation> {
        let vendor_id = required("vendor_id", vendor_id)?;
        let new_location = required("new_booth_location", new_location)?;
        let date = parse_schedule_date(date)?;

        let snapshot = self.documents.snapshot().await?;
        let (mut booths, mut schedule) = tokio::try_join!(snapshot.booths(), snapshot.schedule())?;

        let index = schedule
            .items
            .iter()
            .position(|r| r.books_vendor(vendor_id, date))
            .ok_or_else(|| {
                rejected(ServiceError::RecordNotFound {
                    vendor_id: vendor_id.to_string(),
                    date,
                })
            })?;

        let previous_location = schedule.items[index].booth_location.clone();
        if previous_location == new_location {
            return Err(rejected(ServiceError::NoOpRelocation {
                vendor_id: vendor_id.to_string(),
                date,
                booth_location: previous_location,
            }));
        }
        if let Some(holder) = schedule
            .items
            .iter()
            .find(|r| r.vendor_id != vendor_id && r.occupies(new_location, date))
        {
            return Err(rejected(ServiceError::BoothAlreadyTaken {
                booth_location: new_location.to_string(),
                date,
                vendor_name: holder.vendor_name.clone(),
            }));
        }

        let (booth, new_booth) = resolve_booth(&mut booths, new_location);
        let record = &mut schedule.items[index];
        record.move_to(&booth, self.clock.now());
        let record = record.clone();

        let message = format!(
            "relocate: {} ({date}) {previous_location} -> {new_location}",
            record.vendor_name
        );
        let commit = self
            .publish(message, snapshot.commit(), &schedule, new_booth.is_some().then_some(&booths))
            .await?;
        tracing::info!(
            vendor_id,
            %date,
            from = %previous_location,
            to = new_location,
            new_booth = new_booth.is_some(),
            commit = commit.short(),
            "vendor relocated"
        );

        Ok(Relocation {
            record,
            previous_location,
            new_booth,
            commit,
        })
    }

    async fn publish(
        &self,
        message: String,
        read_at: &ObjectHash,
        schedule: &Document<ScheduleRecord>,
        booths: Option<&Document<Booth>>,
    ) -> ServiceResult<ObjectHash> {
        let mut tx = CommitTransaction::new(message)
            .based_on(read_at.clone())
            .with_file(schedule.to_file()?);
        if let Some(booths) = booths {
            tx.push(booths.to_file()?);
        }
        Ok(self.coordinator.commit(self.documents.branch(), &tx).await?)
    }
}

impl std::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationService")
            .field("documents", &self.documents)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

/// Look up `location`, appending `Booth(location, location)` when absent.
fn resolve_booth(booths: &mut Document<Booth>, location: &str) -> (Booth, Option<Booth>) {
    match booths.items.iter().find(|b| b.booth_location == location) {
        Some(booth) => (booth.clone(), None),
        None => {
            let booth = Booth::at_location(location);
            booths.items.push(booth.clone());
            (booth.clone(), Some(booth))
        }
    }
}

/// Values are taken verbatim; only the empty string is refused.
fn required<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    if value.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
}

fn rejected(err: ServiceError) -> ServiceError {
    tracing::info!(error = %err, "request rejected");
    err
}
