//! Tabular form of the telemetry: per-column series and the aligned table.
//!
//! Series come out of the parser one column at a time; [`align`] merges them
//! onto one timeline that the summary stage reads from.

pub mod align;
pub mod types;
pub mod utility;

pub use align::align;
pub use types::{AlignedTable, Row, Sample, Series};
