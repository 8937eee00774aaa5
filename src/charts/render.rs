use super::{ChartData, Series};
use crate::error::{ReportError, Result};
use crate::metrics::CompileMode;
use crate::ChartStyle;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::Path;

const TITLE_FONT_SIZE: u32 = 30;
const AXIS_LABEL_FONT_SIZE: u32 = 22;
const TICK_LABEL_FONT_SIZE: u32 = 16;
const LEGEND_FONT_SIZE: u32 = 16;

const GROUP_WIDTH: f64 = 0.8;
const HEADROOM: f64 = 1.10;
const MARKER_SIZE: u32 = 5;

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Render `data` as a PNG of `size` pixels, overwriting `path`.
pub fn render_chart(data: &ChartData, path: &Path, size: (u32, u32)) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    render_to_backend(&root, data)
        .and_then(|_| root.present())
        .map_err(|e| ReportError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!(path = %path.display(), series = data.series.len(), "wrote chart");
    Ok(())
}

/// Upper y bound: the tallest value plus headroom, or 1 for an empty chart.
fn y_axis_max(data_max: f64) -> f64 {
    let y_max = data_max * HEADROOM;
    if y_max.is_finite() && y_max > 0.0 {
        y_max
    } else {
        1.0
    }
}

/// Draw `data` onto an arbitrary plotters drawing area.
pub fn render_to_backend<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &ChartData) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let metric = data.metric;
    let batch_sizes = &data.batch_sizes;
    let n_ticks = batch_sizes.len();
    let y_max = y_axis_max(data.max_value());

    let mut chart = ChartBuilder::on(root)
        .caption(metric.title(), ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d(-0.5..(n_ticks as f64 - 0.5), 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_labels(n_ticks)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx >= 0.0 && (x - idx).abs() < 0.3 {
                batch_sizes
                    .get(idx as usize)
                    .map(|b| b.to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_label_formatter(&|y| metric.format_tick(*y))
        .x_desc("Batch Size")
        .y_desc(metric.label())
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(WHITE)
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    let configs = data.configs();
    let palette = metric.palette();
    let color_of = |s: &Series| {
        let idx = configs.iter().position(|c| *c == s.config).unwrap_or(0);
        palette[idx % palette.len()]
    };
    let x_of = |batch: u64| batch_sizes.binary_search(&batch).unwrap_or(0) as f64;

    match data.style {
        ChartStyle::Bar => {
            let bar_width = GROUP_WIDTH / data.series.len().max(1) as f64;
            let n_series = data.series.len() as f64;

            for (i, series) in data.series.iter().enumerate() {
                let color = color_of(series);
                let offset = (i as f64 - (n_series - 1.0) / 2.0) * bar_width;

                chart
                    .draw_series(series.points.iter().map(|p| {
                        let center = x_of(p.batch_size) + offset;
                        Rectangle::new(
                            [
                                (center - bar_width / 2.0 + 0.01, 0.0),
                                (center + bar_width / 2.0 - 0.01, p.value),
                            ],
                            color.filled(),
                        )
                    }))?
                    .label(series.label())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
            }
        }
        ChartStyle::Line => {
            for series in &data.series {
                let color = color_of(series);
                let style = color.stroke_width(2);
                let points: Vec<(f64, f64)> = series
                    .points
                    .iter()
                    .map(|p| (x_of(p.batch_size), p.value))
                    .collect();

                if series.compile == Some(CompileMode::Compile) {
                    chart
                        .draw_series(DashedLineSeries::new(points.clone(), 10, 6, style))?
                        .label(series.label())
                        .legend(move |(x, y)| {
                            EmptyElement::at((x, y))
                                + PathElement::new(vec![(0, 0), (7, 0)], style)
                                + PathElement::new(vec![(12, 0), (19, 0)], style)
                        });
                } else {
                    chart
                        .draw_series(LineSeries::new(points.clone(), style))?
                        .label(series.label())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }

                chart.draw_series(PointSeries::of_element(
                    points,
                    MARKER_SIZE,
                    color.filled(),
                    &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
                ))?;
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", LEGEND_FONT_SIZE))
        .draw()?;

    Ok(())
}
