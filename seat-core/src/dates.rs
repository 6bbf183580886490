use crate::common::error::{CoreError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Date format produced by the form's date-of-birth input
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Format the backend expects for the `date` query on available slots
pub const QUERY_DATE_FORMAT: &str = "%d-%m-%Y";

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

fn parse_naive_timestamp(value: &str) -> Option<NaiveDateTime> {
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = parse_naive_timestamp(value) {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, DOB_FORMAT).ok()
}

/// Format an ISO date or timestamp as `DD-MM-YYYY`.
pub fn format_iso_to_ddmmyyyy(iso: &str) -> Result<String> {
    parse_iso_date(iso)
        .map(|d| d.format(QUERY_DATE_FORMAT).to_string())
        .ok_or_else(|| CoreError::Date {
            value: iso.to_string(),
            reason: "expected an ISO-8601 date or timestamp".to_string(),
        })
}

/// `HH:MM` for a timestamp or time of day; unrecognised input is returned as-is.
pub fn clock_time(value: &str) -> String {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format("%H:%M").to_string();
    }
    if let Some(dt) = parse_naive_timestamp(value) {
        return dt.format("%H:%M").to_string();
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(value, fmt) {
            return t.format("%H:%M").to_string();
        }
    }
    value.to_string()
}

pub fn parse_dob(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DOB_FORMAT).map_err(|e| CoreError::Date {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Whole years elapsed between `dob` and `today`. Negative for future dates.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}
