//! Benchmark results table and its CSV loader.
//!
//! The loader locates columns by header name, so column order in the file does
//! not matter and unrelated columns are ignored:
//!
//! ```text
//! Batch Size,Config,Compile Flag,Total FLOPs,Elapsed Time (s),MFU
//! 8,base,--compile,3.12e14,1.0,
//! ```
//!
//! `MFU` is optional, and so are its individual cells. A stale
//! `FLOPs per Second` column is never read; it is always derived.

use crate::error::{ReportError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub const COL_BATCH_SIZE: &str = "Batch Size";
pub const COL_CONFIG: &str = "Config";
pub const COL_COMPILE_FLAG: &str = "Compile Flag";
pub const COL_TOTAL_FLOPS: &str = "Total FLOPs";
pub const COL_ELAPSED: &str = "Elapsed Time (s)";
pub const COL_MFU: &str = "MFU";

/// One benchmark run as read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub batch_size: u64,
    pub config: String,
    /// Raw flag text; see [`crate::metrics::CompileMode::from_raw`].
    pub compile_flag: String,
    pub total_flops: f64,
    pub elapsed_s: f64,
    /// `None` when the column is absent or the cell is empty.
    pub mfu: Option<f64>,
    /// Source line, for diagnostics.
    pub line: u64,
}

/// Ordered rows of a results file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub records: Vec<ResultRecord>,
    /// Whether the header row carried an `MFU` column.
    pub has_mfu_column: bool,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when MFU is present for every row.
    pub fn mfu_complete(&self) -> bool {
        self.has_mfu_column && self.records.iter().all(|r| r.mfu.is_some())
    }
}

struct ColumnIndex {
    batch_size: usize,
    config: usize,
    compile_flag: usize,
    total_flops: usize,
    elapsed: usize,
    mfu: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ReportError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            batch_size: require(COL_BATCH_SIZE)?,
            config: require(COL_CONFIG)?,
            compile_flag: require(COL_COMPILE_FLAG)?,
            total_flops: require(COL_TOTAL_FLOPS)?,
            elapsed: require(COL_ELAPSED)?,
            mfu: find(COL_MFU),
        })
    }
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

fn invalid(line: u64, column: &str, value: &str) -> ReportError {
    ReportError::InvalidValue {
        line,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_f64(record: &StringRecord, idx: usize, line: u64, column: &str) -> Result<f64> {
    let raw = field(record, idx);
    raw.parse::<f64>().map_err(|_| invalid(line, column, raw))
}

fn parse_optional_f64(record: &StringRecord, idx: usize, line: u64, column: &str) -> Result<Option<f64>> {
    let raw = field(record, idx);
    if raw.is_empty() {
        return Ok(None);
    }
    let v = raw.parse::<f64>().map_err(|_| invalid(line, column, raw))?;
    Ok(if v.is_nan() { None } else { Some(v) })
}

/// Read a results table from any CSV source.
pub fn read_results<R: Read>(reader: R) -> Result<ResultTable> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let cols = ColumnIndex::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let raw_batch = field(&row, cols.batch_size);
        let batch_size = raw_batch
            .parse::<u64>()
            .map_err(|_| invalid(line, COL_BATCH_SIZE, raw_batch))?;

        let mfu = match cols.mfu {
            Some(idx) => parse_optional_f64(&row, idx, line, COL_MFU)?,
            None => None,
        };

        records.push(ResultRecord {
            batch_size,
            config: field(&row, cols.config).to_string(),
            compile_flag: field(&row, cols.compile_flag).to_string(),
            total_flops: parse_f64(&row, cols.total_flops, line, COL_TOTAL_FLOPS)?,
            elapsed_s: parse_f64(&row, cols.elapsed, line, COL_ELAPSED)?,
            mfu,
            line,
        });
    }

    Ok(ResultTable {
        records,
        has_mfu_column: cols.mfu.is_some(),
    })
}

/// Load a results table from a CSV file.
pub fn load_results<P: AsRef<Path>>(path: P) -> Result<ResultTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReportError::io(path, e))?;
    let table = read_results(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), rows = table.len(), "loaded results");
    Ok(table)
}
