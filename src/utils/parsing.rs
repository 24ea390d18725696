//! Lenient parsing of loosely typed JSON request fields.

use crate::entities::ConsultantType;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Hourly price from a number or numeric string.
///
/// Falsy input (`null`, `false`, `0`, `""`) yields `Ok(None)` so callers can
/// fall back to a stored or required value. The string `"0"` is not falsy.
pub fn parse_hourly_price(value: Option<&Value>) -> AppResult<Option<f64>> {
    let invalid = || AppError::ValidationError("hourly_price must be a non-negative number".into());

    let price = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
        Some(Value::Number(n)) => {
            let n = n.as_f64().ok_or_else(invalid)?;
            if n == 0.0 {
                return Ok(None);
            }
            n
        }
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if !price.is_finite() || price < 0.0 {
        return Err(invalid());
    }
    Ok(Some(price))
}

/// Consultant type; blank input yields `Ok(None)`.
pub fn parse_consultant_type(value: Option<&str>) -> AppResult<Option<ConsultantType>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("individual") => Ok(Some(ConsultantType::Individual)),
        Some(s) if s.eq_ignore_ascii_case("enterprise") => Ok(Some(ConsultantType::Enterprise)),
        Some(s) => Err(AppError::ValidationError(format!(
            "Unknown consultant type: {s}"
        ))),
    }
}

/// Positive integer id from a number or numeric string; blank yields `Ok(None)`.
pub fn parse_id(value: Option<&Value>, field: &str) -> AppResult<Option<i64>> {
    let invalid = || AppError::ValidationError(format!("{field} must be a positive integer"));

    let id = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid)?,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if id <= 0 {
        return Err(invalid());
    }
    Ok(Some(id))
}

/// Booking date as `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_booking_date(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
        .ok_or_else(|| AppError::ValidationError("Invalid date format".to_string()))
}
