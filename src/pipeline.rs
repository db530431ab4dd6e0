//! Login → per-column fetch → extract → align, for one device and day.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::parser::parse_column_series;
use crate::services::{Credentials, SemsApi, SemsError};
use crate::summary::{DailySummary, summarize};
use crate::table::{AlignedTable, align};

/// Columns requested when the caller does not choose any.
pub const DEFAULT_COLUMNS: &[&str] = &["Pac", "Eday", "Cbattery1"];

/// A requested column that produced no samples, with the payload SEMS sent.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDiagnostic {
    pub column: String,
    pub raw: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchOutcome {
    pub table: AlignedTable,
    /// Columns that came back without any parsable sample, in request order.
    pub empty_columns: Vec<ColumnDiagnostic>,
}

impl FetchOutcome {
    pub fn summary(&self) -> Option<DailySummary> {
        summarize(&self.table)
    }
}

/// Date string SEMS expects: local midnight of `date`.
pub fn request_date_string(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Fetches every requested column and aligns the non-empty ones.
///
/// Calls run one after another: one login, then one call per column in
/// request order. Login and transport failures abort the whole fetch. A
/// column without samples is not an error; it is logged and reported in
/// [`FetchOutcome::empty_columns`].
#[tracing::instrument(skip(api, credentials, date, columns), fields(date = %date, columns = columns.len()))]
pub async fn fetch_daily_table<A: SemsApi + ?Sized>(
    api: &A,
    credentials: &Credentials,
    device_id: &str,
    date: NaiveDate,
    columns: &[String],
) -> Result<FetchOutcome, SemsError> {
    let token = api.login(credentials).await?;
    let date_str = request_date_string(date);

    let mut series = Vec::new();
    let mut empty_columns = Vec::new();

    for column in unique_columns(columns) {
        let raw = api
            .fetch_column(&token, device_id, column, &date_str, credentials.data_region)
            .await?;

        let parsed = parse_column_series(&raw, column);
        if parsed.is_empty() {
            warn!(column, "No samples parsed; SEMS payload shape may have changed");
            debug!(column, raw = %raw, "Raw column payload");
            empty_columns.push(ColumnDiagnostic {
                column: column.to_string(),
                raw,
            });
        } else {
            info!(column, samples = parsed.len(), "Column parsed");
            series.push(parsed);
        }
    }

    let table = align(series);
    info!(rows = table.len(), empty = empty_columns.len(), "Daily table built");

    Ok(FetchOutcome {
        table,
        empty_columns,
    })
}

/// Requested columns with repeats removed, first occurrence kept.
fn unique_columns(columns: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(columns.len());
    for c in columns {
        let c = c.trim();
        if c.is_empty() || seen.contains(&c) {
            continue;
        }
        seen.push(c);
    }
    seen
}

/// Splits a comma separated column list, falling back to [`DEFAULT_COLUMNS`].
pub fn parse_column_list(raw: Option<&str>) -> Vec<String> {
    let columns: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        columns
    }
}
