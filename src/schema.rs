use crate::charts::ChartData;
use crate::harness::{ReportConfig, ReportOutput};
use crate::metrics::{CompileMode, DeriveOutcome};
use crate::table::ResultTable;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SCHEMA_VERSION: u32 = 1;

/// Environment variables consulted, in order, for the source revision.
const REVISION_VARS: [&str; 2] = ["GIT_SHA", "GITHUB_SHA"];
const REVISION_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub tool_version: String,
    /// Seconds since the Unix epoch when the summary was produced.
    pub generated_at_unix: u64,
    /// Abbreviated source revision, when the build environment exports one.
    pub git_sha: Option<String>,
    pub config: ReportConfig,
}

impl RunMeta {
    /// Metadata for a run of this build with `config`, stamped now.
    pub fn new(config: ReportConfig) -> Self {
        let revision = REVISION_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok());
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            git_sha: abbreviate_revision(revision.as_deref()),
            config,
        }
    }
}

fn abbreviate_revision(raw: Option<&str>) -> Option<String> {
    let sha = raw?.trim();
    if sha.is_empty() {
        return None;
    }
    Some(sha.chars().take(REVISION_LEN).collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCounts {
    pub loaded: usize,
    pub charted: usize,
    pub compile_dropped: usize,
    #[serde(flatten)]
    pub derive: DeriveOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSummary {
    pub path: String,
    #[serde(flatten)]
    pub data: ChartData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run: RunMeta,
    pub rows: RowCounts,
    pub charts: Vec<ChartSummary>,
}

impl ReportSummary {
    pub fn new(run: RunMeta, output: &ReportOutput) -> Self {
        let prepared = &output.prepared;
        Self {
            run,
            rows: RowCounts {
                loaded: prepared.rows_loaded,
                charted: prepared.table.len(),
                compile_dropped: prepared.compile_rows_dropped,
                derive: prepared.derive,
            },
            charts: output
                .charts
                .iter()
                .map(|c| ChartSummary {
                    path: c.path.to_string_lossy().to_string(),
                    data: c.data.clone(),
                })
                .collect(),
        }
    }
}

/// Shape of a results file, as printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOverview {
    pub rows: usize,
    pub configs: Vec<String>,
    pub batch_sizes: Vec<u64>,
    pub compile_rows: usize,
    pub no_compile_rows: usize,
    pub has_mfu_column: bool,
    pub mfu_complete: bool,
    pub non_positive_elapsed: usize,
}

impl TableOverview {
    pub fn of(table: &ResultTable) -> Self {
        let mut configs: Vec<String> = Vec::new();
        let mut batch_sizes: Vec<u64> = Vec::new();
        let mut compile_rows = 0;

        for r in &table.records {
            if !configs.contains(&r.config) {
                configs.push(r.config.clone());
            }
            if !batch_sizes.contains(&r.batch_size) {
                batch_sizes.push(r.batch_size);
            }
            if CompileMode::from_raw(&r.compile_flag) == CompileMode::Compile {
                compile_rows += 1;
            }
        }
        batch_sizes.sort_unstable();

        Self {
            rows: table.len(),
            configs,
            batch_sizes,
            compile_rows,
            no_compile_rows: table.len() - compile_rows,
            has_mfu_column: table.has_mfu_column,
            mfu_complete: table.mfu_complete(),
            non_positive_elapsed: table
                .records
                .iter()
                .filter(|r| !(r.elapsed_s.is_finite() && r.elapsed_s > 0.0))
                .count(),
        }
    }
}
