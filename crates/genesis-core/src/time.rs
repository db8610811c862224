//! Timestamp helpers and the injectable clock.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use regex::Regex;

fn stamp_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}-\d{6}$").expect("valid regex"))
}

/// Source of "now". A fixed clock makes metadata and generated ids reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    fixed_now: Option<DateTime<FixedOffset>>,
}

impl Clock {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn fixed(now: DateTime<FixedOffset>) -> Self {
        Self {
            fixed_now: Some(now),
        }
    }

    /// Current time in the local offset (or the fixed instant in its own offset).
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.fixed_now
            .unwrap_or_else(|| chrono::Local::now().fixed_offset())
    }

    pub fn now_iso(&self) -> String {
        to_iso(self.now())
    }

    pub fn now_stamp(&self) -> String {
        to_stamp(self.now())
    }

    pub fn unix_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// `2025-01-02T03:04:05.006Z`
pub fn to_iso(dt: DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `YYYYMMDD-HHMMSS` in the offset carried by `dt`.
pub fn to_stamp(dt: DateTime<FixedOffset>) -> String {
    dt.format("%Y%m%d-%H%M%S").to_string()
}

pub fn parse_iso(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s.trim()).ok()
}

/// Stamp of a stored ISO timestamp, rendered in the clock's local offset.
pub fn stamp_from_iso(s: &str, clock: &Clock) -> Option<String> {
    let dt = parse_iso(s)?;
    let offset = *clock.now().offset();
    Some(to_stamp(dt.with_timezone(&offset)))
}

pub fn is_stamp(s: &str) -> bool {
    stamp_regex().is_match(s)
}

/// Calendar date (`YYYY-MM-DD`) of an ISO timestamp, UTC.
pub fn iso_date(s: &str) -> Option<String> {
    let dt = parse_iso(s)?;
    Some(dt.with_timezone(&Utc).format("%Y-%m-%d").to_string())
}
