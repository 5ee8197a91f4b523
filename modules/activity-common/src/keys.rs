//! Store key naming. Every key lives under one fixed namespace, and every
//! function here is a pure function of its arguments.

use chrono::NaiveDate;

pub const NAMESPACE: &str = "github-events";

fn key(suffix: &str) -> String {
    format!("{NAMESPACE}:{suffix}")
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The bounded stream every accepted event is appended to.
pub fn stream_key() -> String {
    key("event-stream")
}

/// Per-event dedup marker.
pub fn log_key(event_id: &str) -> String {
    key(&format!("event-log:{event_id}"))
}

/// Timestamp of the first successful ingest run. Written once.
pub fn created_at_key() -> String {
    key("first-inserted-at")
}

pub fn hourly_score_key(date: NaiveDate, hour: u32) -> String {
    key(&format!("contributor-score:{}:{hour}", day(date)))
}

pub fn daily_summary_key(date: NaiveDate) -> String {
    key(&format!("contributor-score:{}:sum", day(date)))
}

/// Hourly keys for hours `0..=last_hour`, ascending.
pub fn hourly_score_keys(date: NaiveDate, last_hour: u32) -> Vec<String> {
    (0..=last_hour)
        .map(|hour| hourly_score_key(date, hour))
        .collect()
}

/// Lease held by the score aggregator while it writes a day's buckets.
pub fn score_run_lease_key(date: NaiveDate) -> String {
    key(&format!("contributor-score:{}:lease", day(date)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    #[test]
    fn fixed_keys() {
        assert_eq!(stream_key(), "github-events:event-stream");
        assert_eq!(created_at_key(), "github-events:first-inserted-at");
        assert_eq!(log_key("123"), "github-events:event-log:123");
    }

    #[test]
    fn score_keys_pad_date_but_not_hour() {
        assert_eq!(
            hourly_score_key(date(), 7),
            "github-events:contributor-score:2025-01-09:7"
        );
        assert_eq!(
            daily_summary_key(date()),
            "github-events:contributor-score:2025-01-09:sum"
        );
        assert_eq!(
            score_run_lease_key(date()),
            "github-events:contributor-score:2025-01-09:lease"
        );
    }

    #[test]
    fn hourly_keys_span_inclusive_range() {
        let keys = hourly_score_keys(date(), 2);
        assert_eq!(
            keys,
            vec![
                "github-events:contributor-score:2025-01-09:0",
                "github-events:contributor-score:2025-01-09:1",
                "github-events:contributor-score:2025-01-09:2",
            ]
        );
    }
}
