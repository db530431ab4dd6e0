//! Output formatting and persistence for daily summaries and tables.
//!
//! Supports JSON rendering, a pt-BR text report, CSV export of the aligned
//! table and CSV append of summary history.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::summary::{DailySummary, Status};
use crate::table::AlignedTable;

/// JSON form of a summary; no summary renders as `{}`.
pub fn summary_json(summary: Option<&DailySummary>) -> Value {
    summary
        .and_then(|s| serde_json::to_value(s).ok())
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// Logs a summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &DailySummary) {
    debug!("{:#?}", summary);
}

/// Writes the summary to stdout as pretty JSON.
pub fn print_json(summary: Option<&DailySummary>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&summary_json(summary))?);
    Ok(())
}

/// One line of the summary history CSV.
#[derive(Debug, Serialize)]
struct SummaryRecord<'a> {
    device_id: &'a str,
    date: NaiveDate,
    energia_dia: f64,
    consumo_dia: Option<f64>,
    pico_potencia: f64,
    hora_pico: Option<String>,
    soc_ini: Option<i64>,
    soc_fim: Option<i64>,
    status: Status,
    atualizado_em: &'a str,
}

/// Appends a summary as a row to a CSV history file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary(path: &str, device_id: &str, date: NaiveDate, summary: &DailySummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending summary record");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {path}"))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(SummaryRecord {
        device_id,
        date,
        energia_dia: summary.energia_dia,
        consumo_dia: summary.consumo_dia,
        pico_potencia: summary.pico_potencia,
        hora_pico: summary.hora_pico.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        soc_ini: summary.soc_ini,
        soc_fim: summary.soc_fim,
        status: summary.status,
        atualizado_em: &summary.atualizado_em,
    })?;
    writer.flush()?;

    Ok(())
}

/// Exports the aligned table as CSV (`time` plus one column per series).
///
/// Null cells are written empty. With `gzip` the file is gzip-compressed.
pub fn write_table_csv(path: &str, table: &AlignedTable, gzip: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_table(&mut encoder, table)?;
        encoder.finish()?;
    } else {
        let mut file = file;
        write_table(&mut file, table)?;
    }

    info!(path, rows = table.len(), gzip, "Table exported");
    Ok(())
}

fn write_table<W: Write>(out: W, table: &AlignedTable) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(out);

    let mut header = vec!["time".to_string()];
    header.extend(table.columns().iter().cloned());
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.time.format("%Y-%m-%d %H:%M:%S").to_string()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Formats a number pt-BR style: `.` for thousands, `,` for decimals.
fn format_br(x: f64) -> String {
    let fixed = format!("{:.2}", x.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*d);
    }

    let sign = if x < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

pub fn format_kwh(x: f64) -> String {
    format!("{} kWh", format_br(x))
}

pub fn format_kw(x: f64) -> String {
    format!("{} kW", format_br(x))
}

/// Human-readable report of the headline metrics, in Portuguese.
///
/// Peak power is reported in kW; `Pac` is in watts.
pub fn render_report(summary: Option<&DailySummary>) -> String {
    let Some(s) = summary else {
        return "Nenhum dado disponível.".to_string();
    };

    let pico = match s.hora_pico {
        Some(t) => format!("{} às {}", format_kw(s.pico_potencia / 1000.0), t.format("%H:%M")),
        None => "—".to_string(),
    };
    let soc = match (s.soc_ini, s.soc_fim) {
        (Some(a), Some(b)) => format!("{a}% → {b}%"),
        _ => "—".to_string(),
    };
    let consumo = s.consumo_dia.map(format_kwh).unwrap_or_else(|| "—".to_string());
    let status = match s.status {
        Status::Ligado => "ligado",
        Status::Desligado => "desligado",
    };

    format!(
        "Energia do dia: {}\nConsumo do dia: {consumo}\nPico de potência: {pico}\nBateria (início → fim): {soc}\nStatus: {status}\nAtualizado em: {}",
        format_kwh(s.energia_dia),
        s.atualizado_em,
    )
}
