//! Derived columns: compile-mode labels, MFU and FLOPs per second.

use crate::error::{ReportError, Result};
use crate::table::ResultTable;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Theoretical bf16 dense peak of the reference accelerator (A100), ops/s.
pub const DEFAULT_PEAK_FLOPS: f64 = 312e12;

/// Normalized compile flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileMode {
    #[serde(rename = "Compile")]
    Compile,
    #[serde(rename = "No Compile")]
    NoCompile,
}

impl CompileMode {
    /// `Compile` iff the raw flag text contains `--compile`.
    pub fn from_raw(raw: &str) -> Self {
        if raw.contains("--compile") {
            CompileMode::Compile
        } else {
            CompileMode::NoCompile
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompileMode::Compile => "Compile",
            CompileMode::NoCompile => "No Compile",
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to fill the MFU column when some cells are missing.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MfuPolicy {
    /// Any gap causes every row's MFU to be recomputed from FLOPs and time.
    #[default]
    RecomputeAll,
    /// Only missing cells are computed; measured values are kept.
    FillMissing,
}

/// A fully populated row, ready for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub batch_size: u64,
    pub config: String,
    pub compile: CompileMode,
    pub total_flops: f64,
    pub elapsed_s: f64,
    pub mfu: f64,
    pub flops_per_second: f64,
}

/// Immutable snapshot consumed by the chart builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTable {
    pub rows: Vec<DerivedRecord>,
}

impl DerivedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, mode: CompileMode) -> usize {
        self.rows.iter().filter(|r| r.compile == mode).count()
    }
}

/// Bookkeeping from [`derive_metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriveOutcome {
    /// Rows whose MFU was computed rather than taken from the input.
    pub mfu_recomputed: usize,
    /// Rows dropped for a zero, negative or non-finite elapsed time.
    pub skipped_rows: usize,
}

pub fn mfu(total_flops: f64, elapsed_s: f64, peak_flops: f64) -> f64 {
    total_flops / (elapsed_s * peak_flops)
}

pub fn flops_per_second(total_flops: f64, elapsed_s: f64) -> f64 {
    total_flops / elapsed_s
}

/// Normalize flags and compute MFU and FLOPs/s for every usable row.
///
/// MFU already present for every row is kept as is. Otherwise `policy`
/// decides whether the whole column or only the gaps are computed.
/// FLOPs/s is always recomputed.
pub fn derive_metrics(
    table: &ResultTable,
    peak_flops: f64,
    policy: MfuPolicy,
) -> Result<(DerivedTable, DeriveOutcome)> {
    if !(peak_flops.is_finite() && peak_flops > 0.0) {
        return Err(ReportError::InvalidConfig(format!(
            "peak FLOPs must be a positive number, got {peak_flops}"
        )));
    }

    let recompute = !table.mfu_complete();
    let mut outcome = DeriveOutcome::default();
    let mut rows = Vec::with_capacity(table.len());

    for rec in &table.records {
        if !(rec.elapsed_s.is_finite() && rec.elapsed_s > 0.0) {
            tracing::warn!(
                line = rec.line,
                elapsed_s = rec.elapsed_s,
                "skipping row with non-positive elapsed time"
            );
            outcome.skipped_rows += 1;
            continue;
        }

        let computed = mfu(rec.total_flops, rec.elapsed_s, peak_flops);
        let value = match (recompute, policy, rec.mfu) {
            (false, _, Some(v)) | (true, MfuPolicy::FillMissing, Some(v)) => v,
            _ => {
                outcome.mfu_recomputed += 1;
                computed
            }
        };

        rows.push(DerivedRecord {
            batch_size: rec.batch_size,
            config: rec.config.clone(),
            compile: CompileMode::from_raw(&rec.compile_flag),
            total_flops: rec.total_flops,
            elapsed_s: rec.elapsed_s,
            mfu: value,
            flops_per_second: flops_per_second(rec.total_flops, rec.elapsed_s),
        });
    }

    if outcome.mfu_recomputed > 0 {
        tracing::info!(
            rows = outcome.mfu_recomputed,
            peak_flops,
            ?policy,
            "computed MFU"
        );
    }

    Ok((DerivedTable { rows }, outcome))
}

/// Drop every `Compile` row. Returns how many were removed.
pub fn filter_compiled(table: &mut DerivedTable) -> usize {
    let before = table.rows.len();
    table.rows.retain(|r| r.compile == CompileMode::NoCompile);
    before - table.rows.len()
}
