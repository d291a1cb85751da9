//! Chart payload parsing.
//!
//! The top-level object must parse; points inside it are parsed one at a
//! time so a single bad point only costs itself.

use super::error::PayloadError;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

const SERIES_KEY: &str = "dataSerie";

/// One (timestamp, value) point from a chart series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDataPoint {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub value: Decimal,
}

impl ChartDataPoint {
    /// Calendar date of the timestamp in `tz`.
    ///
    /// The source emits local-midnight timestamps, so this is exact.
    pub fn date_in(&self, tz: Tz) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
            .map(|utc| utc.with_timezone(&tz).date_naive())
    }
}

/// Points parsed from one payload plus how many were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSeries {
    pub points: Vec<ChartDataPoint>,
    pub skipped: usize,
}

/// Parse a chart payload of the form `{"dataSerie":[{"x":..,"y":..}, ..]}`.
///
/// # Errors
///
/// Returns `PayloadError::Malformed` when the body is not JSON, is not an
/// object, or holds a `dataSerie` that is not an array. Malformed points are
/// counted in `skipped` instead.
///
/// # Examples
///
/// ```
/// use chart_harvest::ingest::parse_chart_payload;
///
/// let series = parse_chart_payload(
///     r#"{"dataSerie":[{"x":1771369200000,"y":457.83},{"x":1770678000000,"y":{"parsedValue":465}}]}"#,
/// ).unwrap();
///
/// assert_eq!(series.points.len(), 1);
/// assert_eq!(series.skipped, 1);
/// ```
pub fn parse_chart_payload(body: &str) -> Result<ParsedSeries, PayloadError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| PayloadError::Malformed(e.to_string()))?;
    let Value::Object(fields) = payload else {
        return Err(PayloadError::Malformed(
            "top-level value is not an object".to_string(),
        ));
    };

    let points = match fields.get(SERIES_KEY) {
        None => return Ok(ParsedSeries::default()),
        Some(Value::Array(points)) => points,
        Some(_) => {
            return Err(PayloadError::Malformed(format!(
                "{} is not an array",
                SERIES_KEY
            )))
        }
    };

    let mut series = ParsedSeries::default();
    for raw in points {
        match parse_point(raw) {
            Some(point) => series.points.push(point),
            None => series.skipped += 1,
        }
    }
    Ok(series)
}

/// Parse one point; `None` unless `x` is an integral number and `y` a plain
/// number.
pub fn parse_point(raw: &Value) -> Option<ChartDataPoint> {
    let timestamp_ms = parse_timestamp(raw.get("x")?)?;
    let value = parse_decimal(raw.get("y")?)?;
    Some(ChartDataPoint {
        timestamp_ms,
        value,
    })
}

fn parse_timestamp(x: &Value) -> Option<i64> {
    if let Some(ms) = x.as_i64() {
        return Some(ms);
    }
    x.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

fn parse_decimal(y: &Value) -> Option<Decimal> {
    let Value::Number(number) = y else {
        return None;
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
