//! One parameterised run per activity: filter, detect, intervals, SDRR,
//! resample, spectrum, LF/HF.
//!
//! Structural misuse fails the whole call. Data-dependent problems (too few
//! beats, empty bands, zero HF power) are recorded as [`Degeneracy`] entries
//! and surface as NaN or empty outputs so that other activities still run.

use crate::{
    config::{PipelineConfig, Resolution},
    detectors::ecg::detect_beats,
    error::{AnsError, AnsResult, Degeneracy},
    filters::fir::{apply, FilterKernel},
    metrics::{
        hrv::{extract_ibi, sdrr},
        resample::resample_with,
        spectrum::{analyze_bands, lf_hf_ratio, ratio_degeneracy, PowerSpectrum},
    },
    signal::{BeatSequence, IbiSeries, ResampledSeries, TimeSeries},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub label: String,
    pub filtered: TimeSeries,
    pub beats: BeatSequence,
    pub ibi: IbiSeries,
    pub sdrr: f64,
    pub resampled: ResampledSeries,
    /// Normaliser actually used for the spectrum (NaN if never reached).
    pub resolution: f64,
    pub spectrum: PowerSpectrum,
    pub avg_lf: f64,
    pub avg_hf: f64,
    pub lf_hf: f64,
    pub degeneracies: Vec<Degeneracy>,
}

/// Scalar outcome of one activity, suitable for tables and JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub label: String,
    pub beats: usize,
    pub mean_hr_bpm: f64,
    pub sdrr: f64,
    pub avg_lf: f64,
    pub avg_hf: f64,
    pub lf_hf: f64,
    pub degeneracies: Vec<Degeneracy>,
}

impl ActivityReport {
    pub fn summary(&self) -> ActivitySummary {
        let mean_ibi = if self.ibi.is_empty() {
            f64::NAN
        } else {
            self.ibi.intervals.iter().sum::<f64>() / self.ibi.len() as f64
        };
        ActivitySummary {
            label: self.label.clone(),
            beats: self.beats.len(),
            mean_hr_bpm: 60.0 / mean_ibi,
            sdrr: self.sdrr,
            avg_lf: self.avg_lf,
            avg_hf: self.avg_hf,
            lf_hf: self.lf_hf,
            degeneracies: self.degeneracies.clone(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !self.degeneracies.is_empty()
    }
}

pub fn run_activity(
    label: &str,
    signal: &TimeSeries,
    kernel: &FilterKernel,
    cfg: &PipelineConfig,
) -> AnsResult<ActivityReport> {
    cfg.validate()?;
    if (signal.fs - cfg.sample_rate_hz).abs() > f64::EPSILON * cfg.sample_rate_hz {
        return Err(AnsError::invalid(format!(
            "{label}: signal sampled at {} Hz but pipeline configured for {} Hz",
            signal.fs, cfg.sample_rate_hz
        )));
    }

    let filtered = apply(signal, kernel)?;
    let beats = detect_beats(
        &filtered,
        cfg.detector.min_distance_samples,
        cfg.detector.amplitude_threshold,
    )?;
    log::info!("{label}: {} beats in {:.1} s", beats.len(), signal.duration());

    let mut report = ActivityReport {
        label: label.to_string(),
        filtered,
        beats,
        ibi: IbiSeries::default(),
        sdrr: f64::NAN,
        resampled: ResampledSeries {
            dt: cfg.dt_s,
            values: Vec::new(),
        },
        resolution: f64::NAN,
        spectrum: PowerSpectrum::default(),
        avg_lf: f64::NAN,
        avg_hf: f64::NAN,
        lf_hf: f64::NAN,
        degeneracies: Vec::new(),
    };

    match downstream(&mut report, cfg) {
        Ok(()) => {}
        Err(AnsError::InsufficientData(detail)) => {
            log::warn!("{label}: insufficient data, {detail}");
            report.degeneracies.push(Degeneracy::InsufficientData {
                stage: stage_name(&report).into(),
                detail,
            });
        }
        Err(e) => return Err(e),
    }
    Ok(report)
}

fn downstream(report: &mut ActivityReport, cfg: &PipelineConfig) -> AnsResult<()> {
    report.ibi = extract_ibi(&report.beats)?;
    report.sdrr = sdrr(&report.ibi)?;
    report.resampled = resample_with(&report.ibi, cfg.dt_s, cfg.grid)?;

    let resolution = match cfg.resolution {
        Resolution::Fixed(value) => value,
        Resolution::OwnGrid => match report.resampled.last_time() {
            Some(t) if t > 0.0 => t,
            _ => {
                return Err(AnsError::insufficient(
                    "a single grid point has no last-timestamp normaliser",
                ))
            }
        },
    };
    report.resolution = resolution;

    let analysis = analyze_bands(
        &report.resampled.values,
        report.resampled.dt,
        resolution,
        &cfg.lf,
        &cfg.hf,
    )?;
    report.spectrum = analysis.spectrum;
    report.avg_lf = analysis.avg_lf;
    report.avg_hf = analysis.avg_hf;
    report.degeneracies.extend(analysis.degeneracies);

    report.lf_hf = lf_hf_ratio(report.avg_lf, report.avg_hf);
    if let Some(d) = ratio_degeneracy(report.avg_hf) {
        log::warn!("{}: LF/HF undefined (avg HF = {})", report.label, report.avg_hf);
        report.degeneracies.push(d);
    }
    Ok(())
}

fn stage_name(report: &ActivityReport) -> &'static str {
    if report.ibi.is_empty() {
        "intervals"
    } else if report.resampled.is_empty() {
        "resample"
    } else {
        "spectrum"
    }
}

/// Cross-activity table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub rows: Vec<ActivitySummary>,
}

impl Comparison {
    pub fn from_reports(reports: &[ActivityReport]) -> Self {
        Self {
            rows: reports.iter().map(ActivityReport::summary).collect(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&ActivitySummary> {
        self.rows.iter().find(|r| r.label == label)
    }
}

/// Run every `(label, signal)` pair independently with the same kernel and
/// configuration. With `reference` set, that activity is run first and its
/// last grid timestamp becomes the fixed spectrum normaliser for all others.
pub fn compare(
    inputs: &[(String, TimeSeries)],
    kernel: &FilterKernel,
    cfg: &PipelineConfig,
    reference: Option<&str>,
) -> AnsResult<Vec<ActivityReport>> {
    let mut shared = cfg.clone();
    if let Some(reference) = reference {
        let (_, signal) = inputs
            .iter()
            .find(|(label, _)| label == reference)
            .ok_or_else(|| {
                AnsError::invalid(format!("reference activity '{reference}' not in session"))
            })?;
        let own = PipelineConfig {
            resolution: Resolution::OwnGrid,
            ..cfg.clone()
        };
        let report = run_activity(reference, signal, kernel, &own)?;
        if report.resolution.is_finite() {
            shared.resolution = Resolution::Fixed(report.resolution);
        } else {
            log::warn!(
                "reference '{reference}' produced no normaliser, falling back to {:?}",
                cfg.resolution
            );
        }
    }

    inputs
        .iter()
        .map(|(label, signal)| run_activity(label, signal, kernel, &shared))
        .collect()
}
