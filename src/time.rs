//! Parsing of backend timestamps and human-readable durations.

use crate::error::{ArchiveError, Result};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;

fn datetime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{1,2})[:_-](\d{2})(?:[:_-](\d{2}))?$")
            .expect("Invalid regex")
    })
}

/// Parse a wall-clock timestamp such as `2025-04-06 23:50:00` in `tz`.
///
/// Hour, minute and second may be separated by `:`, `_` or `-`; seconds are
/// optional. A time falling into a DST gap is rejected, a time inside a DST
/// fold resolves to the earlier instant.
pub fn parse_local_datetime(s: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let caps = datetime_pattern()
        .captures(s.trim())
        .ok_or_else(|| ArchiveError::Format(format!("Unrecognized date-time '{s}'")))?;

    let field = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let year = caps[1]
        .parse::<i32>()
        .map_err(|e| ArchiveError::Format(format!("Invalid year in '{s}': {e}")))?;

    let date = NaiveDate::from_ymd_opt(year, field(2), field(3))
        .ok_or_else(|| ArchiveError::Format(format!("Invalid date in '{s}'")))?;
    let time = NaiveTime::from_hms_opt(field(4), field(5), field(6))
        .ok_or_else(|| ArchiveError::Format(format!("Invalid time in '{s}'")))?;

    match tz.from_local_datetime(&NaiveDateTime::new(date, time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(ArchiveError::Format(format!(
            "'{s}' does not exist in timezone {tz}"
        ))),
    }
}

/// Render seconds as `[Dd ]HH:MM:SS[.mmm]`.
///
/// Non-positive and non-finite input renders as zero.
pub fn format_duration(total_seconds: f64) -> String {
    let total_millis = if total_seconds.is_finite() && total_seconds > 0.0 {
        (total_seconds * 1000.0).round() as u64
    } else {
        0
    };

    let millis = total_millis % 1000;
    let mut secs = total_millis / 1000;

    let days = secs / 86_400;
    secs %= 86_400;
    let hours = secs / 3600;
    secs %= 3600;
    let minutes = secs / 60;
    secs %= 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{secs:02}"));
    if millis > 0 {
        out.push_str(&format!(".{millis:03}"));
    }
    out
}
