//! Chart data preparation and rendering.
//!
//! [`build_chart_data`] turns a [`DerivedTable`] snapshot into plot-ready
//! series without touching the file system; [`render_chart`] draws them.

mod render;

pub use render::{render_chart, render_to_backend};

use crate::error::{ReportError, Result};
use crate::metrics::{CompileMode, DerivedRecord, DerivedTable};
use crate::ChartStyle;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// seaborn "Set1".
const SET1: &[RGBColor] = &[
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(255, 255, 51),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

/// seaborn "Set2".
const SET2: &[RGBColor] = &[
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

/// Value plotted on the y axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Mfu,
    FlopsPerSecond,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Mfu => "MFU",
            Metric::FlopsPerSecond => "FLOPs per Second",
        }
    }

    pub fn title(&self) -> String {
        format!("{} vs. Batch Size", self.label())
    }

    pub fn value(&self, row: &DerivedRecord) -> f64 {
        match self {
            Metric::Mfu => row.mfu,
            Metric::FlopsPerSecond => row.flops_per_second,
        }
    }

    pub(crate) fn palette(&self) -> &'static [RGBColor] {
        match self {
            Metric::Mfu => SET1,
            Metric::FlopsPerSecond => SET2,
        }
    }

    pub(crate) fn format_tick(&self, v: f64) -> String {
        match self {
            Metric::Mfu => format!("{v:.2}"),
            Metric::FlopsPerSecond => format!("{v:.2e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub batch_size: u64,
    /// Mean over all rows sharing this series and batch size.
    pub value: f64,
    pub samples: usize,
}

/// One legend entry: a Config, optionally split by compile mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub config: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile: Option<CompileMode>,
    /// Sorted by batch size.
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn label(&self) -> String {
        match self.compile {
            Some(mode) => format!("{} ({mode})", self.config),
            None => self.config.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub metric: Metric,
    pub style: ChartStyle,
    /// Distinct batch sizes, ascending. One x tick each.
    pub batch_sizes: Vec<u64>,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Distinct configs in series order; indexes the colour palette.
    pub fn configs(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for s in &self.series {
            if !out.contains(&s.config.as_str()) {
                out.push(&s.config);
            }
        }
        out
    }

    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.value))
            .fold(0.0_f64, f64::max)
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Group rows into series and average repeated (series, batch size) cells.
///
/// Series appear in the order their Config (and, for line charts, compile
/// mode) is first seen.
pub fn build_chart_data(table: &DerivedTable, metric: Metric, style: ChartStyle) -> Result<ChartData> {
    if table.is_empty() {
        return Err(ReportError::NoData {
            chart: metric.title(),
        });
    }

    type Key<'a> = (&'a str, Option<CompileMode>);
    let mut groups: Vec<(Key<'_>, BTreeMap<u64, (f64, usize)>)> = Vec::new();
    let mut batch_sizes: Vec<u64> = Vec::new();

    for row in &table.rows {
        let compile = match style {
            ChartStyle::Bar => None,
            ChartStyle::Line => Some(row.compile),
        };
        let key = (row.config.as_str(), compile);

        let idx = match groups.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                groups.push((key, BTreeMap::new()));
                groups.len() - 1
            }
        };
        let cell = groups[idx].1.entry(row.batch_size).or_insert((0.0, 0));
        cell.0 += metric.value(row);
        cell.1 += 1;

        if !batch_sizes.contains(&row.batch_size) {
            batch_sizes.push(row.batch_size);
        }
    }
    batch_sizes.sort_unstable();

    let series = groups
        .into_iter()
        .map(|((config, compile), cells)| Series {
            config: config.to_string(),
            compile,
            points: cells
                .into_iter()
                .map(|(batch_size, (sum, n))| SeriesPoint {
                    batch_size,
                    value: sum / n as f64,
                    samples: n,
                })
                .collect(),
        })
        .collect();

    Ok(ChartData {
        metric,
        style,
        batch_sizes,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(batch_size: u64, config: &str, compile: CompileMode, mfu: f64) -> DerivedRecord {
        DerivedRecord {
            batch_size,
            config: config.to_string(),
            compile,
            total_flops: mfu * 1e12,
            elapsed_s: 1.0,
            mfu,
            flops_per_second: mfu * 1e12,
        }
    }

    fn twelve_rows() -> DerivedTable {
        let mut rows = Vec::new();
        for config in ["small", "large"] {
            for batch in [32, 8, 16] {
                rows.push(row(batch, config, CompileMode::Compile, 0.6));
                rows.push(row(batch, config, CompileMode::NoCompile, 0.3));
            }
        }
        DerivedTable { rows }
    }

    #[test]
    fn test_bar_groups_by_config_only() {
        let data = build_chart_data(&twelve_rows(), Metric::Mfu, ChartStyle::Bar).unwrap();

        assert_eq!(data.batch_sizes, vec![8, 16, 32]);
        assert_eq!(data.configs(), vec!["small", "large"]);
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.point_count(), 6);

        // Both compile modes collapse into a mean.
        let p = &data.series[0].points[0];
        assert_eq!(p.batch_size, 8);
        assert_eq!(p.samples, 2);
        assert!((p.value - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_line_splits_by_compile_mode() {
        let data = build_chart_data(&twelve_rows(), Metric::Mfu, ChartStyle::Line).unwrap();

        assert_eq!(data.series.len(), 4);
        assert_eq!(data.configs(), vec!["small", "large"]);
        assert_eq!(data.series[0].label(), "small (Compile)");
        assert_eq!(data.series[1].label(), "small (No Compile)");
        assert!(data.series.iter().all(|s| s.points.len() == 3));
        assert_eq!(data.series[1].points[2].value, 0.3);
    }

    #[test]
    fn test_throughput_metric() {
        let data =
            build_chart_data(&twelve_rows(), Metric::FlopsPerSecond, ChartStyle::Line).unwrap();
        assert_eq!(data.series[0].points[0].value, 0.6 * 1e12);
        assert_eq!(data.max_value(), 0.6 * 1e12);
        assert_eq!(data.metric.title(), "FLOPs per Second vs. Batch Size");
    }

    #[test]
    fn test_sparse_series_keep_own_batches() {
        let table = DerivedTable {
            rows: vec![
                row(8, "a", CompileMode::NoCompile, 0.1),
                row(64, "b", CompileMode::NoCompile, 0.2),
            ],
        };
        let data = build_chart_data(&table, Metric::Mfu, ChartStyle::Bar).unwrap();

        assert_eq!(data.batch_sizes, vec![8, 64]);
        assert_eq!(data.series[0].points.len(), 1);
        assert_eq!(data.series[1].points[0].batch_size, 64);
    }

    #[test]
    fn test_empty_table_is_no_data() {
        let err = build_chart_data(&DerivedTable::default(), Metric::Mfu, ChartStyle::Bar)
            .unwrap_err();
        match err {
            ReportError::NoData { chart } => assert_eq!(chart, "MFU vs. Batch Size"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
