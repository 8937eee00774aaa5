//! Deterministic synthetic results files.
//!
//! Produces a `results.csv` shaped like real benchmark output (every config
//! at every batch size, with and without `--compile`) so the renderer can be
//! exercised without running a benchmark. Values follow a simple saturating
//! utilization curve with seeded jitter; they are plausible, not measured.

use crate::error::{ReportError, Result};
use crate::metrics::{self, DEFAULT_PEAK_FLOPS};
use crate::table::{
    COL_BATCH_SIZE, COL_COMPILE_FLAG, COL_CONFIG, COL_ELAPSED, COL_MFU, COL_TOTAL_FLOPS,
};
use csv::Writer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Configuration for sample generation.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Config labels, one series each.
    pub configs: Vec<String>,
    pub batch_sizes: Vec<u64>,
    /// Random seed for deterministic jitter.
    pub seed: u64,
    /// Write an `MFU` column with measured-looking values.
    pub with_mfu: bool,
    pub peak_flops: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            configs: vec!["gpt2-124m".to_string(), "gpt2-350m".to_string()],
            batch_sizes: vec![4, 8, 16, 32],
            seed: 42,
            with_mfu: false,
            peak_flops: DEFAULT_PEAK_FLOPS,
        }
    }
}

/// One generated row, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub batch_size: u64,
    pub config: String,
    pub compile_flag: &'static str,
    pub total_flops: f64,
    pub elapsed_s: f64,
}

const COMPILE_FLAGS: [&str; 2] = ["--compile", ""];

/// Generate rows in config, batch size, flag order.
pub fn generate_rows(cfg: &SampleConfig) -> Vec<SampleRow> {
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let mut rows = Vec::with_capacity(cfg.configs.len() * cfg.batch_sizes.len() * 2);

    for (ci, config) in cfg.configs.iter().enumerate() {
        // Larger configs do more work per sample.
        let flops_per_sample = 6.0e12 * (ci as f64 + 1.0);
        for &batch in &cfg.batch_sizes {
            let b = batch as f64;
            let base_util = 0.55 * b / (b + 8.0);
            for flag in COMPILE_FLAGS {
                let speedup = if flag.is_empty() { 1.0 } else { 1.25 };
                let jitter: f64 = rng.gen_range(0.95..1.05);
                let util = (base_util * speedup * jitter).min(0.95);

                let total_flops = flops_per_sample * b * 100.0;
                let elapsed_s = total_flops / (util * cfg.peak_flops);
                rows.push(SampleRow {
                    batch_size: batch,
                    config: config.clone(),
                    compile_flag: flag,
                    total_flops,
                    elapsed_s,
                });
            }
        }
    }

    rows
}

/// Write generated rows as CSV to `writer`.
pub fn write_sample_to<W: Write>(writer: W, cfg: &SampleConfig) -> Result<usize> {
    let rows = generate_rows(cfg);
    let mut wtr = Writer::from_writer(writer);

    let mut header = vec![COL_BATCH_SIZE, COL_CONFIG, COL_COMPILE_FLAG, COL_TOTAL_FLOPS, COL_ELAPSED];
    if cfg.with_mfu {
        header.push(COL_MFU);
    }
    wtr.write_record(&header)?;

    for row in &rows {
        let mut fields = vec![
            row.batch_size.to_string(),
            row.config.clone(),
            row.compile_flag.to_string(),
            format!("{:e}", row.total_flops),
            format!("{:.6}", row.elapsed_s),
        ];
        if cfg.with_mfu {
            let mfu = metrics::mfu(row.total_flops, row.elapsed_s, cfg.peak_flops);
            fields.push(format!("{mfu:.6}"));
        }
        wtr.write_record(&fields)?;
    }

    wtr.flush().map_err(|e| ReportError::Csv(e.into()))?;
    Ok(rows.len())
}

/// Write a sample results file to `path`, replacing any existing file.
pub fn write_sample<P: AsRef<Path>>(path: P, cfg: &SampleConfig) -> Result<usize> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    let rows = write_sample_to(&mut buf, cfg)?;
    fs::write(path, buf).map_err(|e| ReportError::io(path, e))?;
    Ok(rows)
}
