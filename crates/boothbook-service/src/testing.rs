//! Shared fixtures for the service tests.

use std::sync::Arc;
use std::time::Duration;

use boothbook_ledger::DocumentPaths;
use boothbook_store::{InMemoryStore, ObjectStore};
use boothbook_types::ScheduleRecord;
use chrono::{TimeZone, Utc};

use crate::clock::SimulatedClock;
use crate::services::BoothServices;

pub const VENDORS_PATH: &str = "data/vendors.json";
pub const BOOTHS_PATH: &str = "data/booths.json";
pub const SCHEDULE_PATH: &str = "data/schedule.json";

pub const VENDORS_JSON: &str = r#"[
  {"vendor_id": "V1", "vendor_name": "Noodle Stand"},
  {"vendor_id": "V2", "vendor_name": "Tea House"},
  {"vendor_id": "V3", "vendor_name": "Taco Cart"}
]"#;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub services: BoothServices,
}

pub fn seeded_store(booths: &str, schedule: &str) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .seed(
            "main",
            &[(VENDORS_PATH, VENDORS_JSON), (BOOTHS_PATH, booths), (SCHEDULE_PATH, schedule)],
        )
        .unwrap();
    store
}

/// Services on `main` with a clock that starts 2024-03-01 09:00 UTC and
/// moves one second per reading.
pub fn services_over(store: Arc<dyn ObjectStore>) -> BoothServices {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    BoothServices::new(store, "main", DocumentPaths::default())
        .with_clock(Arc::new(SimulatedClock::stepping(start, Duration::from_secs(1))))
}

pub fn fixture(booths: &str, schedule: &str) -> Fixture {
    let store = seeded_store(booths, schedule);
    let services = services_over(store.clone());
    Fixture { store, services }
}

pub fn read_schedule(store: &InMemoryStore) -> Vec<ScheduleRecord> {
    let raw = store.read_path("main", SCHEDULE_PATH).unwrap().unwrap();
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(&raw).unwrap()
}

pub fn record_json(vendor_id: &str, location: &str, date: &str) -> String {
    serde_json::json!({
        "vendor_id": vendor_id,
        "vendor_name": "Noodle Stand",
        "booth_location": location,
        "booth_name": location,
        "date": date,
        "submitted_at": "2024-01-01T08:00:00Z",
    })
    .to_string()
}
