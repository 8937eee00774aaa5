use clap::{Args as ClapArgs, Parser, Subcommand};
use mfu_report::harness::{
    self, ReportConfig, DEFAULT_FIGURE_SIZE, DEFAULT_INPUT, DEFAULT_MFU_FILE, DEFAULT_THROUGHPUT_FILE,
};
use mfu_report::metrics::{MfuPolicy, DEFAULT_PEAK_FLOPS};
use mfu_report::sample::{self, SampleConfig};
use mfu_report::schema::{ReportSummary, RunMeta, TableOverview};
use mfu_report::table::load_results;
use mfu_report::{ChartStyle, ReportError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(ClapArgs, Debug)]
struct PlotArgs {
    /// Benchmark results CSV.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Directory the PNG files are written to (created if missing).
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Theoretical peak operations/second used to derive MFU.
    #[arg(long, value_name = "FLOPS", default_value_t = DEFAULT_PEAK_FLOPS)]
    peak_flops: f64,

    #[arg(long, value_enum, default_value_t = ChartStyle::Bar)]
    style: ChartStyle,

    /// Drop `--compile` runs before charting (default for bar charts).
    #[arg(long, conflicts_with = "include_compile")]
    exclude_compile: bool,

    /// Keep `--compile` runs (default for line charts).
    #[arg(long)]
    include_compile: bool,

    /// What to do when the MFU column has gaps.
    #[arg(long, value_enum, default_value_t = MfuPolicy::RecomputeAll)]
    mfu_policy: MfuPolicy,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_MFU_FILE)]
    mfu_file: String,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_THROUGHPUT_FILE)]
    throughput_file: String,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = DEFAULT_FIGURE_SIZE.0)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = DEFAULT_FIGURE_SIZE.1)]
    height: u32,
}

impl PlotArgs {
    fn exclude_compile(&self) -> bool {
        match (self.exclude_compile, self.include_compile) {
            (true, _) => true,
            (_, true) => false,
            _ => self.style == ChartStyle::Bar,
        }
    }

    fn into_config(self) -> ReportConfig {
        ReportConfig {
            exclude_compile: self.exclude_compile(),
            input: self.input,
            output_dir: self.output_dir,
            peak_flops: self.peak_flops,
            style: self.style,
            mfu_policy: self.mfu_policy,
            mfu_file: self.mfu_file,
            throughput_file: self.throughput_file,
            figure_size: (self.width, self.height),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a results file without rendering anything.
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Write a deterministic synthetic results CSV for trying out the charts.
    GenerateSample {
        #[arg(long, short = 'o', value_name = "FILE", default_value = DEFAULT_INPUT)]
        output: PathBuf,

        /// Random seed for deterministic generation.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Config label. Can be provided multiple times.
        #[arg(long = "config", value_name = "NAME", action = clap::ArgAction::Append)]
        configs: Vec<String>,

        /// Comma-separated batch sizes.
        #[arg(long, value_delimiter = ',')]
        batch_sizes: Vec<u64>,

        /// Include a populated MFU column.
        #[arg(long, default_value_t = false)]
        with_mfu: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "mfu-report")]
#[command(about = "Render MFU and FLOPs/s vs. batch size charts from benchmark results")]
struct Args {
    /// Where to write the JSON run summary.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(flatten)]
    plot: PlotArgs,

    #[command(subcommand)]
    cmd: Option<Command>,
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn run(args: Args) -> Result<(), ReportError> {
    match args.cmd {
        Some(Command::Inspect { path }) => {
            let overview = TableOverview::of(&load_results(&path)?);
            eprintln!("Results: {}", path.display());
            eprintln!("  Rows: {}", overview.rows);
            eprintln!("  Configs: {}", overview.configs.join(", "));
            eprintln!(
                "  Batch sizes: {}",
                overview
                    .batch_sizes
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            eprintln!(
                "  Compile / No Compile: {} / {}",
                overview.compile_rows, overview.no_compile_rows
            );
            eprintln!(
                "  MFU column: {}",
                match (overview.has_mfu_column, overview.mfu_complete) {
                    (false, _) => "absent",
                    (true, false) => "has gaps",
                    (true, true) => "complete",
                }
            );
            if overview.non_positive_elapsed > 0 {
                eprintln!(
                    "  Rows with non-positive elapsed time: {}",
                    overview.non_positive_elapsed
                );
            }

            if let Some(path) = args.out {
                write_json(&overview, &path)?;
            }
            Ok(())
        }
        Some(Command::GenerateSample {
            output,
            seed,
            configs,
            batch_sizes,
            with_mfu,
        }) => {
            let defaults = SampleConfig::default();
            let cfg = SampleConfig {
                configs: if configs.is_empty() { defaults.configs } else { configs },
                batch_sizes: if batch_sizes.is_empty() {
                    defaults.batch_sizes
                } else {
                    batch_sizes
                },
                seed,
                with_mfu,
                peak_flops: args.plot.peak_flops,
            };

            let rows = sample::write_sample(&output, &cfg)?;
            eprintln!("Wrote {} rows to {} (seed={})", rows, output.display(), seed);
            Ok(())
        }
        None => {
            let cfg = args.plot.into_config();
            let output = harness::run(&cfg)?;
            for chart in &output.charts {
                eprintln!("Generated: {}", chart.path.display());
            }

            if let Some(path) = args.out {
                write_json(&ReportSummary::new(RunMeta::new(cfg), &output), &path)?;
                eprintln!("Summary: {}", path.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("mfu_report=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
