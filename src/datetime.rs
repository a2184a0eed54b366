//! Date/time utilities for HNTLDR.
//!
//! Timestamps are stored as fixed-width UTC text (`2025-03-07T05:00:00.000Z`)
//! so that SQL range filters and `ORDER BY` on the raw column are
//! chronological.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::ranking::TimeWindow;
use crate::{HntldrError, Result};

const DB_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a UTC datetime for storage.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format, any RFC3339 string and the plain SQLite
/// `YYYY-MM-DD HH:MM:SS` form (assumed UTC).
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a timestamp read back from a column, treating garbage as corruption.
pub fn parse_stored_timestamp(column: &str, s: &str) -> Result<DateTime<Utc>> {
    parse_db_timestamp(s)
        .ok_or_else(|| HntldrError::Database(format!("invalid {column} timestamp: {s}")))
}

/// Drop sub-millisecond precision so a timestamp survives a storage round trip.
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() - dt.nanosecond() % 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

/// Parse a user-supplied RFC3339 timestamp.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| HntldrError::Validation(format!("invalid timestamp '{s}': {e}")))
}

/// Format a UTC datetime in the given timezone, falling back to UTC when the
/// timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => dt.with_timezone(&tz).format(format).to_string(),
        Err(_) => dt.format(format).to_string(),
    }
}

/// The 24 hours leading up to `now`.
pub fn daily_window(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow {
        start: now - Duration::hours(24),
        end: now,
    }
}

/// The most recent complete Friday-to-Thursday week in `timezone`.
///
/// The window starts at Friday 00:00 local time and ends at the following
/// Friday 00:00 (exclusive). On a Friday the week that ended at midnight is
/// returned.
pub fn weekly_window(now: DateTime<Utc>, timezone: &str) -> Result<TimeWindow> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| HntldrError::Config(format!("unknown timezone: {timezone}")))?;

    let today = now.with_timezone(&tz).date_naive();
    let weekday = today.weekday().num_days_from_sunday() as i64;
    let days_back = (weekday + 2) % 7 + 7;
    let friday = today - Duration::days(days_back);

    let start = local_midnight(&tz, friday)?;
    let end = local_midnight(&tz, friday + Duration::days(7))?;
    TimeWindow::new(start, end)
}

fn local_midnight(tz: &Tz, date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| HntldrError::Validation(format!("invalid date: {date}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| HntldrError::Validation(format!("no local midnight on {date}")))
}

/// 1-based week of the year that `start` falls in, counted from January 1st
/// in `timezone`. Partial weeks round up, so a start exactly seven days after
/// January 1st is still week 1.
pub fn week_number(start: &DateTime<Utc>, timezone: &str) -> u32 {
    let local = match timezone.parse::<Tz>() {
        Ok(tz) => start.with_timezone(&tz).naive_local(),
        Err(_) => start.naive_utc(),
    };
    let Some(year_start) =
        NaiveDate::from_yo_opt(local.year(), 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return 1;
    };

    let elapsed_ms = (local - year_start).num_milliseconds();
    let week_ms = Duration::weeks(1).num_milliseconds();
    let weeks = (elapsed_ms + week_ms - 1) / week_ms;
    // Midnight on January 1st would otherwise be week 0
    weeks.max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_timestamp_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let b = a + Duration::milliseconds(7);
        assert_eq!(to_db_timestamp(&a), "2025-01-02T03:04:05.000Z");
        assert_eq!(to_db_timestamp(&b), "2025-01-02T03:04:05.007Z");
        assert!(to_db_timestamp(&a) < to_db_timestamp(&b));
    }

    #[test]
    fn test_parse_db_timestamp_round_trip() {
        let dt = truncate_to_millis(Utc::now());
        assert_eq!(parse_db_timestamp(&to_db_timestamp(&dt)), Some(dt));
    }

    #[test]
    fn test_parse_db_timestamp_sqlite_format() {
        let dt = parse_db_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert!(parse_db_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_truncate_to_millis() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
            + Duration::nanoseconds(1_234_567);
        let truncated = truncate_to_millis(dt);
        assert_eq!(truncated.nanosecond(), 1_000_000);
    }

    #[test]
    fn test_parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339("2025-03-01T00:00:00Z").is_ok());
        assert!(matches!(
            parse_rfc3339("March 1st"),
            Err(HntldrError::Validation(_))
        ));
    }

    #[test]
    fn test_format_utc_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            format_utc_datetime(&dt, "America/New_York", "%Y/%m/%d %H:%M"),
            "2024/01/15 05:30"
        );
        assert_eq!(
            format_utc_datetime(&dt, "Invalid/Zone", "%Y/%m/%d %H:%M"),
            "2024/01/15 10:30"
        );
    }

    #[test]
    fn test_daily_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let window = daily_window(now);
        assert_eq!(window.end, now);
        assert_eq!(window.start, now - Duration::hours(24));
    }

    #[test]
    fn test_weekly_window_mid_week() {
        // Wednesday 2025-03-12 15:00 UTC (11:00 EDT)
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 15, 0, 0).unwrap();
        let window = weekly_window(now, "America/New_York").unwrap();

        // Friday 2025-02-28 00:00 EST = 05:00 UTC
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2025, 2, 28, 5, 0, 0).unwrap()
        );
        // Friday 2025-03-07 00:00 EST = 05:00 UTC
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 7, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_window_on_friday() {
        // Friday 2025-03-07 14:00 UTC (09:00 EST)
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 14, 0, 0).unwrap();
        let window = weekly_window(now, "America/New_York").unwrap();

        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2025, 2, 28, 5, 0, 0).unwrap()
        );
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 7, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_window_across_dst_change() {
        // Saturday 2025-03-15; DST started Sunday 2025-03-09
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 16, 0, 0).unwrap();
        let window = weekly_window(now, "America/New_York").unwrap();

        // Friday 2025-03-07 00:00 EST
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 7, 5, 0, 0).unwrap());
        // Friday 2025-03-14 00:00 EDT
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 14, 4, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_window_unknown_timezone() {
        let now = Utc::now();
        assert!(matches!(
            weekly_window(now, "Nowhere/Special"),
            Err(HntldrError::Config(_))
        ));
    }

    #[test]
    fn test_week_number() {
        let jan_first = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(week_number(&jan_first, "UTC"), 1);

        let feb_28 = Utc.with_ymd_and_hms(2025, 2, 28, 5, 0, 0).unwrap();
        // Day 59 of the year in New York
        assert_eq!(week_number(&feb_28, "America/New_York"), 9);

        let jan_8 = Utc.with_ymd_and_hms(2025, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(week_number(&jan_8, "UTC"), 1);
        assert_eq!(week_number(&(jan_8 + Duration::hours(1)), "UTC"), 2);

        let new_year = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(week_number(&new_year, "UTC"), 1);

        // Friday Jan 3 2025 00:00 in New York
        let first_friday = Utc.with_ymd_and_hms(2025, 1, 3, 5, 0, 0).unwrap();
        assert_eq!(week_number(&first_friday, "America/New_York"), 1);
    }
}
