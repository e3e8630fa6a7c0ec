//! Wall-clock time for log timestamps
//!
//! # Mock Time for Development
//!
//! In debug builds, the `SYSLOGGER_MOCK_TIME` environment variable can be set
//! to override the system time used for log timestamps. The mock clock
//! advances from the given instant at the same rate as real time.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Timelike};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "SYSLOGGER_MOCK_TIME";

/// Cached mock time offset from the real time when the process started.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => {
                        if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                            let offset = mock_dt.signed_duration_since(Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Get the current local time, respecting mock time settings in debug builds.
pub fn now() -> DateTime<Local> {
    let real_now = Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format the timestamp that prefixes every log line:
/// `<Weekday> <YYYY-MM-DD> <HH:MM:SS>:<mmm>`.
///
/// Milliseconds are always three digits, zero-padded.
pub fn format_log_timestamp(dt: &DateTime<Local>) -> String {
    // Leap seconds report nanos >= 1e9; clamp so the field stays 3 digits.
    let millis = (dt.nanosecond() / 1_000_000).min(999);
    format!("{}:{:03}", dt.format("%A %Y-%m-%d %H:%M:%S"), millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<Local> {
        let naive = chrono::NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap();
        Local.from_local_datetime(&naive).single().unwrap()
    }

    #[test]
    fn timestamp_has_weekday_date_time_and_millis() {
        let dt = local(2025, 12, 25, 14, 30, 5, 42);
        assert_eq!(format_log_timestamp(&dt), "Thursday 2025-12-25 14:30:05:042");
    }

    #[test]
    fn millis_are_zero_padded() {
        let dt = local(2024, 1, 1, 0, 0, 0, 7);
        assert!(format_log_timestamp(&dt).ends_with(":00:00:007"));
    }

    #[test]
    fn now_is_close_to_real_time() {
        // No mock time is configured in the test environment
        let diff = (now() - Local::now()).num_seconds().abs();
        assert!(diff < 5);
    }
}
