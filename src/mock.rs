//! Loader for the persisted mock document used by the demo mode and the
//! `/status` endpoint.
//!
//! The document is already tabular:
//! ```json
//! {
//!   "plant_id": "...", "inverter_sn": "...", "date": "2025-08-12",
//!   "timezone": "America/Sao_Paulo", "units": {"Pac": "W"},
//!   "data": [{"time": "2025-08-12T08:00:00", "Pac": 120, "Eday": 0.1}]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::parser::{parse_number, parse_timestamp};
use crate::table::{AlignedTable, Row};

const TIME_FIELD: &str = "time";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MockMeta {
    pub plant_id: Option<String>,
    pub inverter_sn: Option<String>,
    pub date: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub units: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockDocument {
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
    #[serde(flatten)]
    pub meta: MockMeta,
}

impl MockDocument {
    /// Reads the document at `path`. A missing file is an empty document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Mock file not found");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mock file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("invalid mock file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Converts the rows into an aligned table.
    ///
    /// Rows without a parsable `time` are dropped. Columns appear in the order
    /// their keys are first seen; missing or non-numeric cells are null.
    pub fn into_table(self) -> AlignedTable {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.data {
            for key in row.keys() {
                if key != TIME_FIELD && !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows: Vec<Row> = self
            .data
            .iter()
            .filter_map(|row| {
                let time = row.get(TIME_FIELD).and_then(parse_timestamp)?;
                let values = columns
                    .iter()
                    .map(|c| row.get(c).and_then(parse_number))
                    .collect();
                Some(Row { time, values })
            })
            .collect();

        let dropped = self.data.len() - rows.len();
        if dropped > 0 {
            debug!(dropped, "Mock rows without a usable time were dropped");
        }

        AlignedTable::from_rows(columns, rows)
    }
}

/// Keeps only rows whose timestamp falls on `date`.
pub fn filter_date(table: &mut AlignedTable, date: NaiveDate) {
    table.retain_rows(|row| row.time.date() == date);
}
