//! Column time-series extraction from SEMS payloads.
//!
//! The `GetInverterDataByColumn` endpoint does not return a stable shape: the
//! data list moves between keys and records name their fields differently
//! depending on region and firmware. Every location and field name is probed
//! from an ordered candidate list, first match wins. Records that cannot be
//! read are dropped, never reported as errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use tracing::trace;

use crate::table::{Sample, Series};

/// Keys probed inside `payload["data"]` when it is an object.
const NESTED_LIST_KEYS: &[&str] = &[
    "column1", "column2", "column3", "items", "list", "datas", "result",
];

/// Keys probed at the top level when nothing was found under `data`.
const TOP_LEVEL_LIST_KEYS: &[&str] = &["data", "items", "list", "result", "datas"];

const TIME_KEYS: &[&str] = &["time", "date", "collectTime", "cTime", "tm"];

const VALUE_KEYS: &[&str] = &["value", "v", "val", "column"];

/// Formats tried first, year-first and US month-first.
const GENERIC_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const GENERIC_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Day-first retry formats.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Epoch values above this are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Extracts the `(timestamp, value)` series for `column` from one raw payload.
///
/// Returns an empty series when no data list can be located or when no
/// record survives parsing.
pub fn parse_column_series(payload: &Value, column: &str) -> Series {
    let Some(items) = locate_items(payload) else {
        return Series::empty(column);
    };

    let samples: Vec<Sample> = items
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(|record| parse_record(record, column))
        .collect();

    trace!(column, found = items.len(), kept = samples.len(), "Column parsed");

    Series::new(column, samples)
}

/// Finds the record list, or `None` when the payload carries no usable list.
fn locate_items(payload: &Value) -> Option<&Vec<Value>> {
    let root = payload.as_object()?;

    let nested = root
        .get("data")
        .and_then(Value::as_object)
        .and_then(|data| first_list(data, NESTED_LIST_KEYS));

    match nested {
        Some(items) if !items.is_empty() => Some(items),
        _ => first_list(root, TOP_LEVEL_LIST_KEYS).filter(|items| !items.is_empty()),
    }
}

fn first_list<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_array))
}

fn parse_record(record: &Map<String, Value>, column: &str) -> Option<Sample> {
    let raw_time = first_present(record, TIME_KEYS)?;

    // A key named after the column takes precedence even when it holds null.
    let raw_value = match record.get(column) {
        Some(v) => non_null(v)?,
        None => first_present(record, VALUE_KEYS)?,
    };

    let time = parse_timestamp(raw_time)?;
    let value = parse_number(raw_value)?;

    Some(Sample { time, value })
}

fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k).and_then(non_null))
}

fn non_null(v: &Value) -> Option<&Value> {
    (!v.is_null()).then_some(v)
}

/// Parses a timestamp from a string or an epoch number.
///
/// Strings carrying an offset keep their local wall clock; epoch numbers are
/// read as UTC. Generic formats are tried before day-first ones.
pub fn parse_timestamp(raw: &Value) -> Option<NaiveDateTime> {
    match raw {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            let dt = if epoch.unsigned_abs() > EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            };
            dt.map(|d| d.naive_utc())
        }
        _ => None,
    }
}

pub fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    parse_with(s, GENERIC_FORMATS, GENERIC_DATE_FORMATS)
        .or_else(|| parse_with(s, DAY_FIRST_FORMATS, DAY_FIRST_DATE_FORMATS))
}

fn parse_with(s: &str, datetime_formats: &[&str], date_formats: &[&str]) -> Option<NaiveDateTime> {
    datetime_formats
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            date_formats
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a numeric value, accepting a decimal comma (`"12,5"` is `12.5`).
///
/// NaN and non-scalar values are rejected.
pub fn parse_number(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    (!value.is_nan()).then_some(value)
}
