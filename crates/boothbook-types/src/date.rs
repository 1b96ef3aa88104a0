use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Wire format of a schedule date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a schedule date.
///
/// The input must be exactly `YYYY-MM-DD` (zero-padded, ten characters) and
/// name a real calendar day. chrono alone would accept `2024-3-1`.
pub fn parse_schedule_date(input: &str) -> Result<NaiveDate, TypeError> {
    let invalid = || TypeError::InvalidDate {
        input: input.to_string(),
    };

    let bytes = input.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| invalid())
}

/// Build `year-month-day`, letting a day past the end of the month run into
/// the following month the way a JavaScript `Date` does: February 31st 2024
/// is March 2nd.
///
/// `month` is 1-based. Returns `None` for a month outside 1..=12 or a day
/// outside 1..=31.
pub fn rolled_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day - 1)))
}

/// `today` moved back `months` months, keeping the day of month and rolling
/// any overflow forward: one month before 2024-03-31 is 2024-03-02.
pub fn months_before(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    let index = i64::from(today.year()) * 12 + i64::from(today.month0()) - i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    rolled_date(year, month, today.day())
}

/// The `date` of a schedule record as stored.
///
/// New records always hold a real day. Files written by older clients may
/// hold `YYYY-MM-DD` text that names no calendar day (`2024-02-30`), or
/// something else entirely; such text is kept verbatim so rewriting the
/// document does not alter it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScheduleDate {
    Day(NaiveDate),
    Unchecked(String),
}

impl ScheduleDate {
    pub fn parse(input: &str) -> Self {
        match parse_schedule_date(input) {
            Ok(day) => Self::Day(day),
            Err(_) => Self::Unchecked(input.to_string()),
        }
    }

    /// The exact day, if the stored text names one.
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            Self::Day(day) => Some(*day),
            Self::Unchecked(_) => None,
        }
    }

    /// The day this date falls on once an out-of-range day of month has
    /// rolled into the next month. `None` if the text is not `YYYY-MM-DD`.
    pub fn effective_day(&self) -> Option<NaiveDate> {
        match self {
            Self::Day(day) => Some(*day),
            Self::Unchecked(text) => {
                let bytes = text.as_bytes();
                if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
                    return None;
                }
                let year = text.get(0..4)?.parse().ok()?;
                let month = text.get(5..7)?.parse().ok()?;
                let day = text.get(8..10)?.parse().ok()?;
                rolled_date(year, month, day)
            }
        }
    }
}

impl From<NaiveDate> for ScheduleDate {
    fn from(day: NaiveDate) -> Self {
        Self::Day(day)
    }
}

impl PartialEq<NaiveDate> for ScheduleDate {
    fn eq(&self, other: &NaiveDate) -> bool {
        matches!(self, Self::Day(day) if day == other)
    }
}

impl fmt::Display for ScheduleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(day) => write!(f, "{}", day.format(DATE_FORMAT)),
            Self::Unchecked(text) => f.write_str(text),
        }
    }
}

impl Serialize for ScheduleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScheduleDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_dates() {
        let d = parse_schedule_date("2024-03-01").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(parse_schedule_date("2024-02-29").is_ok());
    }

    #[test]
    fn rejects_bad_shape() {
        for input in ["2024-3-1", "20240301", "2024/03/01", "2024-03-01T00:00", " 2024-03-01", ""] {
            assert!(
                matches!(parse_schedule_date(input), Err(TypeError::InvalidDate { .. })),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn rejects_impossible_days() {
        assert!(parse_schedule_date("2023-02-29").is_err());
        assert!(parse_schedule_date("2024-13-01").is_err());
        assert!(parse_schedule_date("2024-04-31").is_err());
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rolled_date_overflows_into_next_month() {
        assert_eq!(rolled_date(2024, 2, 31), Some(ymd(2024, 3, 2)));
        assert_eq!(rolled_date(2023, 2, 30), Some(ymd(2023, 3, 2)));
        assert_eq!(rolled_date(2024, 4, 31), Some(ymd(2024, 5, 1)));
        assert_eq!(rolled_date(2024, 4, 30), Some(ymd(2024, 4, 30)));
        assert_eq!(rolled_date(2024, 13, 1), None);
        assert_eq!(rolled_date(2024, 1, 0), None);
    }

    #[test]
    fn months_before_keeps_day_and_rolls_over() {
        assert_eq!(months_before(ymd(2024, 3, 15), 1), Some(ymd(2024, 2, 15)));
        assert_eq!(months_before(ymd(2024, 3, 31), 1), Some(ymd(2024, 3, 2)));
        assert_eq!(months_before(ymd(2023, 3, 29), 1), Some(ymd(2023, 3, 1)));
        assert_eq!(months_before(ymd(2024, 1, 10), 1), Some(ymd(2023, 12, 10)));
        assert_eq!(months_before(ymd(2024, 5, 31), 3), Some(ymd(2024, 3, 2)));
        assert_eq!(months_before(ymd(2024, 5, 31), 0), Some(ymd(2024, 5, 31)));
        assert_eq!(months_before(ymd(2024, 5, 31), 25), Some(ymd(2022, 5, 1)));
    }

    #[test]
    fn schedule_date_keeps_legacy_text_verbatim() {
        let real: ScheduleDate = serde_json::from_str("\"2024-03-01\"").unwrap();
        assert_eq!(real, ymd(2024, 3, 1));
        assert_eq!(serde_json::to_string(&real).unwrap(), "\"2024-03-01\"");

        let legacy: ScheduleDate = serde_json::from_str("\"2024-02-30\"").unwrap();
        assert_eq!(legacy, ScheduleDate::Unchecked("2024-02-30".into()));
        assert_eq!(legacy.day(), None);
        assert_eq!(legacy.effective_day(), Some(ymd(2024, 3, 1)));
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"2024-02-30\"");
        assert_ne!(legacy, ymd(2024, 3, 1));

        assert_eq!(ScheduleDate::parse("next week").effective_day(), None);
        assert_eq!(ScheduleDate::parse("2024-3-01").effective_day(), None);
    }

    proptest::proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(input in "\\PC{0,16}") {
            let _ = parse_schedule_date(&input);
        }

        #[test]
        fn accepts_every_real_day(days in 0u64..200_000) {
            let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Days::new(days);
            let text = date.format(DATE_FORMAT).to_string();
            proptest::prop_assume!(text.len() == 10);
            proptest::prop_assert_eq!(parse_schedule_date(&text).unwrap(), date);
        }
    }
}
