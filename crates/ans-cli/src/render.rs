use anyhow::{Context, Result};
use ans_lib::{
    config::PipelineConfig,
    pipeline::{ActivityReport, Comparison},
    plot::{
        figure_from_beats, figure_from_comparison, figure_from_ibi, figure_from_sdrr,
        figure_from_spectrum, BarSeries, Figure, Series,
    },
};
use plotters::prelude::*;
use std::{fs, path::Path};

/// Seconds of filtered signal shown around the middle of each recording.
const BEAT_WINDOW_S: f64 = 5.0;

pub fn render_report(dir: &Path, report: &ActivityReport, cfg: &PipelineConfig) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let label = &report.label;
    let mid = report.filtered.duration() / 2.0;
    let beats = figure_from_beats(report, mid, mid + BEAT_WINDOW_S);
    draw_plotters_figure(&dir.join(format!("{label}_beats.png")), &beats)?;
    if !report.ibi.is_empty() {
        let ibi = figure_from_ibi(label, &report.ibi, &report.resampled);
        draw_plotters_figure(&dir.join(format!("{label}_ibi.png")), &ibi)?;
    }
    if !report.spectrum.is_empty() {
        let spectrum = figure_from_spectrum(label, &report.spectrum, &cfg.lf, &cfg.hf, 0.5);
        draw_plotters_figure(&dir.join(format!("{label}_spectrum.png")), &spectrum)?;
    }
    Ok(())
}

pub fn render_comparison(dir: &Path, comparison: &Comparison) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    draw_plotters_figure(&dir.join("lf_hf.png"), &figure_from_comparison(comparison))?;
    draw_plotters_figure(&dir.join("sdrr.png"), &figure_from_sdrr(comparison))?;
    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        None
    } else if lo == hi {
        Some((lo - 0.5, hi + 0.5))
    } else {
        Some((lo, hi))
    }
}

fn rgb(color: ans_lib::plot::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    if let Some(bars) = fig.series.iter().find_map(|s| match s {
        Series::Bars(b) => Some(b),
        _ => None,
    }) {
        return draw_bars(path, fig, bars);
    }

    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let points = || {
        fig.series.iter().flat_map(|series| match series {
            Series::Line(line) | Series::Scatter(line) => line.points.iter(),
            Series::Bars(_) => [].iter(),
        })
    };
    let (x_min, x_max) = match fig.x.range {
        Some([lo, hi]) => (lo, hi),
        None => bounds(points().map(|p| p[0])).unwrap_or((0.0, 1.0)),
    };
    let (y_min, y_max) = match fig.y.range {
        Some([lo, hi]) => (lo, hi),
        None => bounds(
            points()
                .filter(|p| p[0] >= x_min && p[0] <= x_max)
                .map(|p| p[1]),
        )
        .unwrap_or((0.0, 1.0)),
    };
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let color = rgb(line.style.color);
                chart
                    .draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        color.stroke_width(line.style.width.round().max(1.0) as u32),
                    ))?
                    .label(line.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            Series::Scatter(line) => {
                let color = rgb(line.style.color);
                let radius = line.style.width.round().max(1.0) as i32;
                chart
                    .draw_series(
                        line.points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), radius, color.filled())),
                    )?
                    .label(line.name.clone())
                    .legend(move |(x, y)| Circle::new((x + 10, y), radius, color.filled()));
            }
            Series::Bars(_) => {}
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

fn draw_bars(path: &Path, fig: &Figure, bars: &BarSeries) -> Result<()> {
    let backend = BitMapBackend::new(path, (640, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let n = bars.values.len().max(1);
    let y_max = bars
        .values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON)
        * 1.1;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..y_max)?;
    let labels = bars.labels.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .x_label_formatter(&|v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;
    chart.draw_series(
        Histogram::vertical(&chart)
            .style(rgb(bars.style.color).filled())
            .margin(20)
            .data(bars.values.iter().copied().enumerate()),
    )?;
    root.present()?;
    Ok(())
}
