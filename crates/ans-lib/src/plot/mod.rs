//! Plain-data figures built from borrowed analysis results. Rendering is left
//! to the caller.

use crate::{
    metrics::spectrum::{FrequencyBand, PowerSpectrum},
    pipeline::{ActivityReport, Comparison},
    signal::{IbiSeries, ResampledSeries},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    pub range: Option<[f64; 2]>,
}

impl Axis {
    fn labelled(label: &str) -> Self {
        Self {
            label: Some(label.into()),
            range: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Scatter(LineSeries),
    Bars(BarSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                range: None,
            },
            y: Axis {
                label: None,
                range: None,
            },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

const OUT_OF_BAND: Color = Color(0x808080);
const LF_COLOR: Color = Color(0x2E8B57);
const HF_COLOR: Color = Color(0xE69500);

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

/// Filtered signal between `start_s` and `end_s` with detected beats marked.
pub fn figure_from_beats(report: &ActivityReport, start_s: f64, end_s: f64) -> Figure {
    let ts = &report.filtered;
    let first = ((start_s * ts.fs).max(0.0) as usize).min(ts.len());
    let last = ((end_s * ts.fs).max(0.0) as usize).min(ts.len());
    let points: Vec<[f64; 2]> = (first..last).map(|i| [ts.time_of(i), ts.data[i]]).collect();
    let beats: Vec<[f64; 2]> = report
        .beats
        .beats
        .iter()
        .filter(|b| b.index >= first && b.index < last)
        .map(|b| [b.time_s, b.amplitude])
        .collect();

    let mut fig = Figure::new(Some(format!("{}: filtered ECG with beats", report.label)));
    fig.x = Axis::labelled("Time (s)");
    fig.y = Axis::labelled("Voltage");
    fig.add_series(Series::Line(LineSeries {
        name: "filtered".into(),
        points: decimate_points(&points, 4096),
        style: Style {
            width: 1.2,
            color: Color(0x1F77B4),
        },
    }));
    fig.add_series(Series::Scatter(LineSeries {
        name: "beats".into(),
        points: beats,
        style: Style {
            width: 3.0,
            color: Color(0xD62728),
        },
    }));
    fig
}

/// Irregular intervals against their uniform-grid interpolation.
pub fn figure_from_ibi(label: &str, ibi: &IbiSeries, resampled: &ResampledSeries) -> Figure {
    let mut fig = Figure::new(Some(format!("{label}: inter-beat intervals")));
    fig.x = Axis::labelled("Time (s)");
    fig.y = Axis::labelled("IBI (s)");
    let grid: Vec<[f64; 2]> = resampled
        .times()
        .into_iter()
        .zip(resampled.values.iter().copied())
        .map(|(t, v)| [t, v])
        .collect();
    fig.add_series(Series::Line(LineSeries {
        name: "resampled".into(),
        points: decimate_points(&grid, 4096),
        style: Style {
            width: 1.4,
            color: Color(0x9467BD),
        },
    }));
    fig.add_series(Series::Scatter(LineSeries {
        name: "IBI".into(),
        points: ibi
            .times
            .iter()
            .zip(&ibi.intervals)
            .map(|(&t, &v)| [t, v])
            .collect(),
        style: Style {
            width: 2.0,
            color: Color(0xFF0077),
        },
    }));
    fig
}

/// Spectrum up to `max_hz`, split into out-of-band, LF and HF segments.
/// The shared edge bin appears in both band segments.
pub fn figure_from_spectrum(
    label: &str,
    spectrum: &PowerSpectrum,
    lf: &FrequencyBand,
    hf: &FrequencyBand,
    max_hz: f64,
) -> Figure {
    let mut fig = Figure::new(Some(format!("{label}: IBI power spectrum")));
    fig.x = Axis {
        label: Some("Frequency (Hz)".into()),
        range: Some([0.0, max_hz]),
    };
    fig.y = Axis::labelled("Power (A.U.)");
    let visible: Vec<[f64; 2]> = spectrum
        .points()
        .filter(|(f, _)| *f <= max_hz)
        .map(|(f, p)| [f, p])
        .collect();
    fig.add_series(Series::Line(LineSeries {
        name: "spectrum".into(),
        points: visible.clone(),
        style: Style {
            width: 1.0,
            color: OUT_OF_BAND,
        },
    }));
    for (band, color) in [(lf, LF_COLOR), (hf, HF_COLOR)] {
        let points: Vec<[f64; 2]> = visible
            .iter()
            .copied()
            .filter(|p| band.selects(p[0]))
            .collect();
        fig.add_series(Series::Line(LineSeries {
            name: band.name.clone(),
            points,
            style: Style { width: 2.5, color },
        }));
    }
    fig
}

/// LF/HF ratio per activity. Non-finite ratios are dropped from the bars.
pub fn figure_from_comparison(comparison: &Comparison) -> Figure {
    let mut fig = Figure::new(Some("LF/HF ratio by activity".to_string()));
    fig.y = Axis::labelled("LF/HF");
    let (labels, values): (Vec<String>, Vec<f64>) = comparison
        .rows
        .iter()
        .filter(|r| r.lf_hf.is_finite())
        .map(|r| (r.label.clone(), r.lf_hf))
        .unzip();
    fig.add_series(Series::Bars(BarSeries {
        name: "LF/HF".into(),
        labels,
        values,
        style: Style {
            width: 1.0,
            color: Color(0xB22222),
        },
    }));
    fig
}

/// SDRR per activity.
pub fn figure_from_sdrr(comparison: &Comparison) -> Figure {
    let mut fig = Figure::new(Some("Heart rate variability (SDRR)".to_string()));
    fig.y = Axis::labelled("SDRR (s)");
    let (labels, values): (Vec<String>, Vec<f64>) = comparison
        .rows
        .iter()
        .filter(|r| r.sdrr.is_finite())
        .map(|r| (r.label.clone(), r.sdrr))
        .unzip();
    fig.add_series(Series::Bars(BarSeries {
        name: "SDRR".into(),
        labels,
        values,
        style: Style {
            width: 1.0,
            color: Color(0x4682B4),
        },
    }));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ActivitySummary;

    fn spectrum() -> PowerSpectrum {
        let freqs: Vec<f64> = (0..=20).map(|k| k as f64 / 20.0).collect();
        let powers = freqs.iter().map(|f| f * 10.0).collect();
        PowerSpectrum {
            df: 0.05,
            freqs,
            powers,
        }
    }

    #[test]
    fn spectrum_figure_shares_edge_bin() {
        let fig = figure_from_spectrum(
            "rest",
            &spectrum(),
            &FrequencyBand::lf(),
            &FrequencyBand::hf(),
            0.5,
        );
        assert_eq!(fig.series.len(), 3);
        let band_points = |i: usize| match &fig.series[i] {
            Series::Line(l) => l.points.clone(),
            _ => unreachable!(),
        };
        let lf = band_points(1);
        let hf = band_points(2);
        assert_eq!(lf.last().unwrap()[0], 0.15);
        assert_eq!(hf.first().unwrap()[0], 0.15);
        assert!(band_points(0).iter().all(|p| p[0] <= 0.5));
    }

    #[test]
    fn comparison_figure_skips_undefined_ratios() {
        let row = |label: &str, lf_hf: f64| ActivitySummary {
            label: label.into(),
            beats: 10,
            mean_hr_bpm: 70.0,
            sdrr: 0.05,
            avg_lf: 1.0,
            avg_hf: 1.0,
            lf_hf,
            degeneracies: Vec::new(),
        };
        let cmp = Comparison {
            rows: vec![row("rest", 1.2), row("physical-stress", f64::INFINITY)],
        };
        match &figure_from_comparison(&cmp).series[0] {
            Series::Bars(b) => {
                assert_eq!(b.labels, vec!["rest".to_string()]);
                assert_eq!(b.values, vec![1.2]);
            }
            _ => panic!("expected bars"),
        }
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..10_000).map(|i| [i as f64, 0.0]).collect();
        assert_eq!(decimate_points(&points, 500).len(), 500);
        assert_eq!(decimate_points(&points[..10], 500).len(), 10);
    }
}
