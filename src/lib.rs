use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod charts;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod sample;
pub mod schema;
pub mod table;

pub use error::{ReportError, Result};

/// How series are drawn.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartStyle {
    /// Grouped bars, one per Config at each batch size.
    #[default]
    Bar,
    /// Connected lines with markers; compiled runs are dashed.
    Line,
}
