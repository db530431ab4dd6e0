//! Daily headline metrics computed from an aligned table.

use chrono::{NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::table::AlignedTable;
use crate::table::utility::{argmax, first_value, last_value};

/// Daily energy column.
pub const ENERGY_COLUMN: &str = "Eday";
/// AC output power column.
pub const POWER_COLUMN: &str = "Pac";
/// Battery state-of-charge column.
pub const SOC_COLUMN: &str = "Cbattery1";

/// Consumption columns in lookup order; the first one holding data is used.
pub const CONSUMPTION_COLUMNS: &[&str] = &[
    "EloadDay",
    "LoadEday",
    "EhouseDay",
    "EHomeDay",
    "LoadEnergyDay",
    "LoadEnergy",
    "Eload",
];

/// Power above which the inverter is reported as on.
pub const ON_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ligado,
    Desligado,
}

/// Headline metrics for one device-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub energia_dia: f64,
    pub consumo_dia: Option<f64>,
    pub pico_potencia: f64,
    pub hora_pico: Option<NaiveDateTime>,
    pub soc_ini: Option<i64>,
    pub soc_fim: Option<i64>,
    pub status: Status,
    pub atualizado_em: String,
}

impl DailySummary {
    /// Computes the summary, or `None` for a table without rows.
    ///
    /// Each field falls back on its own when its column is missing or
    /// all-null; one absent column never prevents the others.
    pub fn from_table(table: &AlignedTable) -> Option<Self> {
        if table.is_empty() {
            return None;
        }

        let energia_dia = last_value(table, ENERGY_COLUMN).unwrap_or(0.0);

        let (hora_pico, pico_potencia) = match argmax(table, POWER_COLUMN) {
            Some((t, v)) => (Some(t), v),
            None => (None, 0.0),
        };

        let soc_ini = first_value(table, SOC_COLUMN).map(truncate);
        let soc_fim = last_value(table, SOC_COLUMN).map(truncate);

        let consumo_dia = CONSUMPTION_COLUMNS
            .iter()
            .find_map(|c| last_value(table, c));

        let status = match last_value(table, POWER_COLUMN) {
            Some(p) if p > ON_THRESHOLD => Status::Ligado,
            _ => Status::Desligado,
        };

        Some(Self {
            energia_dia,
            consumo_dia,
            pico_potencia,
            hora_pico,
            soc_ini,
            soc_fim,
            status,
            atualizado_em: generated_at(),
        })
    }
}

/// Shorthand for [`DailySummary::from_table`].
pub fn summarize(table: &AlignedTable) -> Option<DailySummary> {
    DailySummary::from_table(table)
}

fn truncate(v: f64) -> i64 {
    v.trunc() as i64
}

/// Current UTC instant, ISO-8601 with a literal `Z`.
fn generated_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
