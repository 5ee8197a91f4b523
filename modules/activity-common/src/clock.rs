use chrono::{DateTime, Days, NaiveDate, TimeZone, Timelike, Utc};

/// The UTC day and hour a score run works against.
///
/// Passed into the aggregator explicitly so that the backward walk never
/// consults the wall clock on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWindow {
    pub date: NaiveDate,
    pub current_hour: u32,
}

impl ScoreWindow {
    pub fn new(date: NaiveDate, current_hour: u32) -> Self {
        Self { date, current_hour }
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date: instant.date_naive(),
            current_hour: instant.hour(),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// The last hour of `date` that has fully elapsed, or `None` during hour 0.
    pub fn last_complete_hour(&self) -> Option<u32> {
        self.current_hour.checked_sub(1)
    }

    /// When this day's buckets and summary expire.
    pub fn expires_at(&self) -> DateTime<Utc> {
        next_midnight(self.date)
    }
}

/// 00:00:00 UTC on the day after `date`.
pub fn next_midnight(date: NaiveDate) -> DateTime<Utc> {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap_or_default())
}
