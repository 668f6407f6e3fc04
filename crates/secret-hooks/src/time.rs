//! Time utilities for secret-hooks.
//!
//! Stored timestamps are Unix epoch microseconds (u64); values written into
//! secrets and trigger records are RFC 3339 strings in UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    Utc::now().timestamp_micros().max(0) as u64
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = DateTime::from_timestamp(secs, nsecs).unwrap_or(DateTime::UNIX_EPOCH);
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current Unix time in whole seconds.
pub fn now_unix_secs() -> i64 {
    Utc::now().timestamp()
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Whole years elapsed between `birth` and `on`.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i32 {
    use chrono::Datelike;

    let mut years = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}
