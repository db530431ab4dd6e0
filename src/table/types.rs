//! Data types shared by the extraction, alignment and summary stages.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// One parsed `(timestamp, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Cleaned samples for exactly one requested column.
///
/// Samples keep the order they had in the upstream payload. Duplicate
/// timestamps are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub column: String,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(column: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            column: column.into(),
            samples,
        }
    }

    pub fn empty(column: impl Into<String>) -> Self {
        Self::new(column, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stable ascending sort by timestamp.
    pub fn sort_by_time(&mut self) {
        self.samples.sort_by_key(|s| s.time);
    }
}

/// One table row: a timestamp and one optional value per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub time: NaiveDateTime,
    pub values: Vec<Option<f64>>,
}

/// Several series merged onto the timeline of the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl AlignedTable {
    /// Builds a table from explicit rows.
    ///
    /// Every row must carry exactly one value slot per column; short rows are
    /// padded with nulls and long rows truncated.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.values.resize(width, None);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_series(series: Series) -> Self {
        let rows = series
            .samples
            .into_iter()
            .map(|s| Row {
                time: s.time,
                values: vec![Some(s.value)],
            })
            .collect();
        Self {
            columns: vec![series.column],
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates `(time, value)` for one column in row order, nulls included.
    ///
    /// Returns `None` when the column is not part of the table.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = (NaiveDateTime, Option<f64>)> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| (r.time, r.values[idx])))
    }

    pub(crate) fn sort_by_time(&mut self) {
        self.rows.sort_by_key(|r| r.time);
    }

    pub(crate) fn push_column(&mut self, name: String, values: Vec<Option<f64>>) {
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(value);
        }
    }

    /// Keeps only the rows matching `keep`.
    pub fn retain_rows(&mut self, keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(keep);
    }
}

/// Serializes a row as a flat object: `{"time": ..., "<column>": value|null}`.
pub struct RowView<'a> {
    columns: &'a [String],
    row: &'a Row,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry("time", &self.row.time)?;
        for (name, value) in self.columns.iter().zip(&self.row.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl AlignedTable {
    pub fn row_views(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|row| RowView {
            columns: &self.columns,
            row,
        })
    }
}

impl Serialize for AlignedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<RowView<'_>> = self.row_views().collect();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("columns", &self.columns)?;
        map.serialize_entry("rows", &rows)?;
        map.end()
    }
}
