use crate::charts::{build_chart_data, render_chart, ChartData, Metric};
use crate::error::{ReportError, Result};
use crate::metrics::{self, derive_metrics, DeriveOutcome, DerivedTable, MfuPolicy};
use crate::table::load_results;
use crate::ChartStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "results.csv";
pub const DEFAULT_MFU_FILE: &str = "mfu_vs_batch_size.png";
pub const DEFAULT_THROUGHPUT_FILE: &str = "flops_per_second_vs_batch_size.png";
/// 12x8 figure units at 100 px per unit.
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (1200, 800);

/// Everything a report run needs; the defaults reproduce the classic
/// `results.csv` -> two PNGs behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub peak_flops: f64,
    pub exclude_compile: bool,
    pub style: ChartStyle,
    pub mfu_policy: MfuPolicy,
    pub mfu_file: String,
    pub throughput_file: String,
    pub figure_size: (u32, u32),
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from("."),
            peak_flops: metrics::DEFAULT_PEAK_FLOPS,
            exclude_compile: true,
            style: ChartStyle::Bar,
            mfu_policy: MfuPolicy::RecomputeAll,
            mfu_file: DEFAULT_MFU_FILE.to_string(),
            throughput_file: DEFAULT_THROUGHPUT_FILE.to_string(),
            figure_size: DEFAULT_FIGURE_SIZE,
        }
    }
}

impl ReportConfig {
    pub fn mfu_path(&self) -> PathBuf {
        self.output_dir.join(&self.mfu_file)
    }

    pub fn throughput_path(&self) -> PathBuf {
        self.output_dir.join(&self.throughput_file)
    }

    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.figure_size;
        if w == 0 || h == 0 {
            return Err(ReportError::InvalidConfig(format!(
                "figure size must be non-zero, got {w}x{h}"
            )));
        }
        if self.mfu_file == self.throughput_file {
            return Err(ReportError::InvalidConfig(format!(
                "both charts would be written to '{}'",
                self.mfu_file
            )));
        }
        Ok(())
    }
}

/// Derived snapshot plus the counts gathered while producing it.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub table: DerivedTable,
    pub rows_loaded: usize,
    pub derive: DeriveOutcome,
    pub compile_rows_dropped: usize,
}

/// A rendered chart.
#[derive(Clone, Debug)]
pub struct RenderedChart {
    pub path: PathBuf,
    pub data: ChartData,
}

#[derive(Clone, Debug)]
pub struct ReportOutput {
    pub prepared: Prepared,
    pub charts: Vec<RenderedChart>,
}

/// Load, derive and filter. No output is written.
pub fn prepare(cfg: &ReportConfig) -> Result<Prepared> {
    let raw = load_results(&cfg.input)?;
    let rows_loaded = raw.len();
    let (mut table, derive) = derive_metrics(&raw, cfg.peak_flops, cfg.mfu_policy)?;

    let compile_rows_dropped = if cfg.exclude_compile {
        metrics::filter_compiled(&mut table)
    } else {
        0
    };

    tracing::info!(
        input = %cfg.input.display(),
        rows_loaded,
        rows_kept = table.len(),
        compile_rows_dropped,
        skipped = derive.skipped_rows,
        "prepared results"
    );

    Ok(Prepared {
        table,
        rows_loaded,
        derive,
        compile_rows_dropped,
    })
}

/// Run the whole pipeline: load, derive, filter, render both charts.
///
/// Chart data for both charts is built before anything is written, so a
/// run that fails on bad input leaves no images behind.
pub fn run(cfg: &ReportConfig) -> Result<ReportOutput> {
    cfg.validate()?;
    let prepared = prepare(cfg)?;

    let mfu = build_chart_data(&prepared.table, Metric::Mfu, cfg.style)?;
    let throughput = build_chart_data(&prepared.table, Metric::FlopsPerSecond, cfg.style)?;

    fs::create_dir_all(&cfg.output_dir).map_err(|e| ReportError::io(&cfg.output_dir, e))?;

    let mut charts = Vec::with_capacity(2);
    for (data, path) in [(mfu, cfg.mfu_path()), (throughput, cfg.throughput_path())] {
        render_chart(&data, &path, cfg.figure_size)?;
        charts.push(RenderedChart { path, data });
    }

    Ok(ReportOutput { prepared, charts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CompileMode;
    use crate::sample::{write_sample, SampleConfig};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_twelve_rows(path: &Path) {
        let mut f = fs::File::create(path).unwrap();
        writeln!(f, "Batch Size,Config,Compile Flag,Total FLOPs,Elapsed Time (s)").unwrap();
        for (config, flops) in [("gpt-small", 1.0e14), ("gpt-large", 4.0e14)] {
            for batch in [8, 16, 32] {
                for flag in ["--compile", ""] {
                    let elapsed = batch as f64 / 8.0;
                    writeln!(f, "{batch},{config},{flag},{},{elapsed}", flops * batch as f64).unwrap();
                }
            }
        }
    }

    fn config_in(dir: &Path) -> ReportConfig {
        ReportConfig {
            input: dir.join("results.csv"),
            output_dir: dir.join("out"),
            figure_size: (600, 400),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = ReportConfig::default();
        assert_eq!(cfg.input, PathBuf::from("results.csv"));
        assert_eq!(cfg.peak_flops, 312e12);
        assert!(cfg.exclude_compile);
        assert_eq!(cfg.mfu_path(), PathBuf::from("./mfu_vs_batch_size.png"));
        assert_eq!(
            cfg.throughput_path(),
            PathBuf::from("./flops_per_second_vs_batch_size.png")
        );
        assert_eq!(cfg.figure_size.0 * 2, cfg.figure_size.1 * 3);
    }

    #[test]
    fn test_validate_rejects_same_file() {
        let cfg = ReportConfig {
            throughput_file: DEFAULT_MFU_FILE.to_string(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ReportError::InvalidConfig(_))));
    }

    #[test]
    fn test_prepare_filters_compiled_rows() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_twelve_rows(&cfg.input);

        let prepared = prepare(&cfg).unwrap();

        assert_eq!(prepared.rows_loaded, 12);
        assert_eq!(prepared.compile_rows_dropped, 6);
        assert_eq!(prepared.table.len(), 6);
        assert_eq!(prepared.table.count(CompileMode::Compile), 0);
        assert_eq!(prepared.derive.mfu_recomputed, 12);
    }

    #[test]
    fn test_run_twelve_rows_produces_two_pngs() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_twelve_rows(&cfg.input);

        let out = run(&cfg).unwrap();

        assert_eq!(out.charts.len(), 2);
        for chart in &out.charts {
            assert!(chart.path.exists());
            assert_eq!(chart.data.series.len(), 2);
            assert_eq!(chart.data.point_count(), 6);
        }
        assert!(cfg.mfu_path().exists());
        assert!(cfg.throughput_path().exists());
    }

    #[test]
    fn test_run_line_style_keeps_compile_series() {
        let dir = tempdir().unwrap();
        let cfg = ReportConfig {
            style: ChartStyle::Line,
            exclude_compile: false,
            ..config_in(dir.path())
        };
        write_twelve_rows(&cfg.input);

        let out = run(&cfg).unwrap();

        assert_eq!(out.charts[0].data.series.len(), 4);
        assert_eq!(out.charts[0].data.point_count(), 12);
    }

    #[test]
    fn test_run_missing_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());

        let err = run(&cfg).unwrap_err();

        assert!(err.is_not_found());
        assert!(!cfg.mfu_path().exists());
        assert!(!cfg.throughput_path().exists());
    }

    #[test]
    fn test_run_only_compiled_rows_is_no_data() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::write(
            &cfg.input,
            "Batch Size,Config,Compile Flag,Total FLOPs,Elapsed Time (s)\n8,a,--compile,1e12,1.0\n",
        )
        .unwrap();

        let err = run(&cfg).unwrap_err();

        assert!(matches!(err, ReportError::NoData { .. }));
        assert!(!cfg.mfu_path().exists());
    }

    #[test]
    fn test_run_on_generated_sample() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        write_sample(&cfg.input, &SampleConfig::default()).unwrap();

        let out = run(&cfg).unwrap();
        let configs = SampleConfig::default().configs.len();
        assert_eq!(out.charts[0].data.series.len(), configs);
    }
}
