use std::sync::Arc;

use boothbook_ledger::{CommitCoordinator, DocumentPaths, DocumentRepository, RetryPolicy};
use boothbook_store::ObjectStore;
use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::error::ServiceResult;
use crate::registration::{Registration, RegistrationService, Relocation};
use crate::retention::{PurgeReport, RetentionPolicy, RetentionService};

/// Entry point for the three booth operations on one branch.
#[derive(Clone)]
pub struct BoothServices {
    documents: DocumentRepository,
    coordinator: CommitCoordinator,
    clock: Arc<dyn Clock>,
    retention: RetentionPolicy,
}

impl BoothServices {
    pub fn new(store: Arc<dyn ObjectStore>, branch: impl Into<String>, paths: DocumentPaths) -> Self {
        Self {
            documents: DocumentRepository::new(store.clone(), branch, paths),
            coordinator: CommitCoordinator::new(store),
            clock: Arc::new(SystemClock),
            retention: RetentionPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.coordinator = self.coordinator.with_retry(retry);
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn documents(&self) -> &DocumentRepository {
        &self.documents
    }

    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(self.documents.clone(), self.coordinator.clone(), self.clock.clone())
    }

    pub fn retention(&self) -> RetentionService {
        RetentionService::new(self.documents.clone(), self.coordinator.clone(), self.retention)
    }

    pub async fn register(&self, vendor_id: &str, booth_location: &str, date: &str) -> ServiceResult<Registration> {
        self.registration().register(vendor_id, booth_location, date).await
    }

    pub async fn relocate(&self, vendor_id: &str, date: &str, new_location: &str) -> ServiceResult<Relocation> {
        self.registration().relocate(vendor_id, date, new_location).await
    }

    pub async fn purge(&self, today: NaiveDate) -> ServiceResult<PurgeReport> {
        self.retention().purge(today).await
    }

    /// Purge with "today" taken from the configured clock.
    pub async fn purge_now(&self) -> ServiceResult<PurgeReport> {
        self.purge(self.clock.today()).await
    }
}

impl std::fmt::Debug for BoothServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoothServices")
            .field("documents", &self.documents)
            .field("coordinator", &self.coordinator)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}
