//! Dropping bookings that fell out of the retention window.

use boothbook_ledger::{CommitCoordinator, CommitTransaction, DocumentRepository};
use boothbook_types::{months_before, ObjectHash};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// How long bookings are kept, in calendar months.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub months: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { months: 1 }
    }
}

impl RetentionPolicy {
    pub fn months(months: u32) -> Self {
        Self { months }
    }

    /// Oldest date still kept on `today`.
    ///
    /// The day of month is kept and overflow rolls forward, as the scheduled
    /// cleanup has always computed it: one month before 2024-03-31 is
    /// 2024-03-02, not 2024-02-29.
    pub fn cutoff(&self, today: NaiveDate) -> ServiceResult<NaiveDate> {
        months_before(today, self.months).ok_or_else(|| {
            ServiceError::InvalidInput(format!("retention of {} months reaches before the calendar", self.months))
        })
    }
}

/// Result of a purge run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub cutoff: NaiveDate,
    pub dropped: usize,
    pub kept: usize,
    /// `None` when nothing was old enough to drop.
    pub commit: Option<ObjectHash>,
}

/// Runs `purge`.
#[derive(Clone, Debug)]
pub struct RetentionService {
    documents: DocumentRepository,
    coordinator: CommitCoordinator,
    policy: RetentionPolicy,
}

impl RetentionService {
    pub fn new(documents: DocumentRepository, coordinator: CommitCoordinator, policy: RetentionPolicy) -> Self {
        Self {
            documents,
            coordinator,
            policy,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Remove every booking dated before the cutoff for `today`.
    pub async fn purge(&self, today: NaiveDate) -> ServiceResult<PurgeReport> {
        let cutoff = self.policy.cutoff(today)?;
        let snapshot = self.documents.snapshot().await?;
        let mut schedule = snapshot.schedule().await?;

        let before = schedule.items.len();
        schedule.items.retain(|r| match r.date.effective_day() {
            Some(day) => day >= cutoff,
            None => {
                tracing::warn!(date = %r.date, vendor_id = %r.vendor_id, "dropping record with unreadable date");
                false
            }
        });
        let kept = schedule.items.len();
        let dropped = before - kept;

        if dropped == 0 {
            tracing::info!(%today, %cutoff, kept, "nothing to purge");
            return Ok(PurgeReport {
                cutoff,
                dropped,
                kept,
                commit: None,
            });
        }

        let message = format!(
            "purge: removed {dropped} records older than {} month(s)",
            self.policy.months
        );
        let tx = CommitTransaction::new(message)
            .based_on(snapshot.commit().clone())
            .with_file(schedule.to_file()?);
        let commit = self.coordinator.commit(self.documents.branch(), &tx).await?;
        tracing::info!(%today, %cutoff, dropped, kept, commit = commit.short(), "schedule purged");

        Ok(PurgeReport {
            cutoff,
            dropped,
            kept,
            commit: Some(commit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, read_schedule, record_json, Fixture, SCHEDULE_PATH};

    fn day(s: &str) -> NaiveDate {
        boothbook_types::parse_schedule_date(s).unwrap()
    }

    fn schedule_of(dates: &[&str]) -> String {
        let records: Vec<String> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| record_json("V1", &format!("A{i}"), d))
            .collect();
        format!("[{}]", records.join(","))
    }

    #[test]
    fn cutoff_keeps_day_of_month_and_rolls_over() {
        let one = RetentionPolicy::default();
        assert_eq!(one.cutoff(day("2024-03-15")).unwrap(), day("2024-02-15"));
        assert_eq!(one.cutoff(day("2024-03-31")).unwrap(), day("2024-03-02"));
        assert_eq!(one.cutoff(day("2024-03-30")).unwrap(), day("2024-03-01"));
        assert_eq!(one.cutoff(day("2024-01-10")).unwrap(), day("2023-12-10"));
        assert_eq!(RetentionPolicy::months(3).cutoff(day("2024-05-31")).unwrap(), day("2024-03-02"));
        assert_eq!(RetentionPolicy::months(0).cutoff(day("2024-05-31")).unwrap(), day("2024-05-31"));
    }

    #[tokio::test]
    async fn drops_only_records_before_cutoff() {
        let schedule = schedule_of(&["2024-02-14", "2024-02-15", "2024-03-20", "2023-11-01"]);
        let Fixture { store, services } = fixture("[]", &schedule);

        let report = services.purge(day("2024-03-15")).await.unwrap();
        assert_eq!(report.cutoff, day("2024-02-15"));
        assert_eq!(report.dropped, 2);
        assert_eq!(report.kept, 2);
        let commit = report.commit.unwrap();

        let dates: Vec<_> = read_schedule(&store).iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-02-15", "2024-03-20"]);
        assert_eq!(store.changed_paths(&commit).unwrap(), vec![SCHEDULE_PATH.to_string()]);
        assert_eq!(
            store.tip_commit("main").unwrap().message,
            "purge: removed 2 records older than 1 month(s)"
        );
    }

    #[tokio::test]
    async fn record_exactly_one_month_old_is_kept() {
        let Fixture { store, services } = fixture("[]", &schedule_of(&["2024-02-15"]));
        let report = services.purge(day("2024-03-15")).await.unwrap();
        assert_eq!((report.dropped, report.kept, report.commit), (0, 1, None));
        assert_eq!(store.advance_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn purge_is_idempotent() {
        let Fixture { store, services } = fixture("[]", &schedule_of(&["2024-01-01", "2024-03-14"]));
        let today = day("2024-03-15");

        let first = services.purge(today).await.unwrap();
        assert_eq!(first.dropped, 1);
        let after_first = read_schedule(&store);

        let second = services.purge(today).await.unwrap();
        assert_eq!(second.dropped, 0);
        assert_eq!(second.commit, None);
        assert_eq!(read_schedule(&store), after_first);
        assert_eq!(store.advance_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn end_of_month_cutoff_rolls_into_current_month() {
        let schedule = schedule_of(&["2024-02-29", "2024-03-01", "2024-03-02"]);
        let Fixture { store, services } = fixture("[]", &schedule);

        let report = services.purge(day("2024-03-31")).await.unwrap();
        assert_eq!(report.cutoff, day("2024-03-02"));
        assert_eq!((report.dropped, report.kept), (2, 1));
        assert_eq!(read_schedule(&store)[0].date, day("2024-03-02"));
    }

    #[tokio::test]
    async fn legacy_dates_are_judged_by_their_rolled_day() {
        // 2024-02-30 falls on 2024-03-01; 2024-02-31 on 2024-03-02.
        let schedule = schedule_of(&["2024-02-30", "2024-02-31", "someday"]);
        let Fixture { store, services } = fixture("[]", &schedule);

        let report = services.purge(day("2024-04-02")).await.unwrap();
        assert_eq!((report.dropped, report.kept), (2, 1));
        let kept = read_schedule(&store);
        assert_eq!(kept[0].date.to_string(), "2024-02-31");
        let raw = store.read_path("main", SCHEDULE_PATH).unwrap().unwrap();
        assert!(raw.contains("\"date\": \"2024-02-31\""));
    }

    #[tokio::test]
    async fn empty_schedule_purges_nothing() {
        let Fixture { store, services } = fixture("[]", "");
        let report = services.purge(day("2024-03-15")).await.unwrap();
        assert_eq!((report.dropped, report.kept), (0, 0));
        assert_eq!(store.advance_count().unwrap(), 0);
    }
}
