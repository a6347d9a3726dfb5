//! Parsing of `since` windows: either an absolute date or a relative span such as
//! `"1y 2m 3d 5h 4min 2s ago"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::TimeParseError;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Seconds per unit. Months are 30 days and years 365 days.
fn unit_seconds(unit: &str) -> Option<i64> {
    match unit {
        "y" => Some(365 * DAY),
        "m" => Some(30 * DAY),
        "d" => Some(DAY),
        "h" => Some(HOUR),
        "min" => Some(MINUTE),
        "s" => Some(1),
        _ => None,
    }
}

/// Parses a whitespace-separated list of `<n><unit>` tokens, optionally followed by `ago`.
pub fn parse_time_window(expr: &str) -> Result<Duration, TimeParseError> {
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    let mut total: i64 = 0;
    let mut terms = 0;

    for (idx, token) in tokens.iter().enumerate() {
        if token.eq_ignore_ascii_case("ago") {
            if idx + 1 != tokens.len() {
                return Err(TimeParseError::MisplacedAgo);
            }
            continue;
        }

        let split = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        let (digits, unit) = token.split_at(split);
        if digits.is_empty() {
            return Err(TimeParseError::MalformedNumber(token.to_string()));
        }
        let amount: i64 = digits
            .parse()
            .map_err(|_| TimeParseError::MalformedNumber(token.to_string()))?;
        let per_unit =
            unit_seconds(unit).ok_or_else(|| TimeParseError::UnknownUnit(token.to_string()))?;

        total = amount
            .checked_mul(per_unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| TimeParseError::MalformedNumber(token.to_string()))?;
        terms += 1;
    }

    if terms == 0 {
        return Err(TimeParseError::Empty);
    }
    Duration::try_seconds(total).ok_or_else(|| TimeParseError::MalformedNumber(expr.to_string()))
}

/// Resolves a `since` expression to an absolute UTC cutoff.
///
/// Dates are recognised by a `-` separator (`2014-1-4`, `2014-01-04 12:30:00`) and read
/// as UTC. Anything else is a relative window subtracted from `now`.
pub fn parse_since(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError::Empty);
    }

    if trimmed.contains('-') {
        return parse_date(trimmed);
    }

    let window = parse_time_window(trimmed)?;
    now.checked_sub_signed(window)
        .ok_or_else(|| TimeParseError::InvalidDate(trimmed.to_string()))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimeParseError::InvalidDate(raw.to_string()))
}
