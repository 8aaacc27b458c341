//! Power spectrum of the resampled IBI series and LF/HF band averages.
//!
//! Band membership is inclusive on both edges (`low <= f <= high`), so a bin
//! sitting exactly on a shared edge (0.15 Hz for the canonical bands) is
//! counted in both LF and HF. This matches the reference analyses the output
//! is compared against and may be an unintended quirk of that behaviour.

use crate::error::{require_positive, AnsError, AnsResult, Degeneracy};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

impl FrequencyBand {
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> AnsResult<Self> {
        if !(low >= 0.0 && low < high) {
            return Err(AnsError::invalid(format!(
                "band edges must satisfy 0 <= low < high, got [{low}, {high}]"
            )));
        }
        Ok(Self {
            name: name.into(),
            low,
            high,
        })
    }

    pub fn lf() -> Self {
        Self {
            name: "LF".into(),
            low: 0.04,
            high: 0.15,
        }
    }

    pub fn hf() -> Self {
        Self {
            name: "HF".into(),
            low: 0.15,
            high: 0.4,
        }
    }

    /// Inclusive on both edges.
    pub fn selects(&self, freq: f64) -> bool {
        freq >= self.low && freq <= self.high
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Bin spacing, `1 / (N * dt)`.
    pub df: f64,
    pub freqs: Vec<f64>,
    pub powers: Vec<f64>,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.freqs.iter().copied().zip(self.powers.iter().copied())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralAnalysis {
    pub spectrum: PowerSpectrum,
    pub avg_lf: f64,
    pub avg_hf: f64,
    pub degeneracies: Vec<Degeneracy>,
}

/// Spectrum plus canonical LF [0.04, 0.15] / HF [0.15, 0.4] averages.
pub fn analyze(values: &[f64], dt: f64, resolution: f64) -> AnsResult<SpectralAnalysis> {
    analyze_bands(values, dt, resolution, &FrequencyBand::lf(), &FrequencyBand::hf())
}

pub fn analyze_bands(
    values: &[f64],
    dt: f64,
    resolution: f64,
    lf: &FrequencyBand,
    hf: &FrequencyBand,
) -> AnsResult<SpectralAnalysis> {
    let spectrum = power_spectrum(values, dt, resolution)?;
    let mut degeneracies = Vec::new();
    let avg_lf = band_average(&spectrum, lf);
    let avg_hf = band_average(&spectrum, hf);
    for (band, avg) in [(lf, avg_lf), (hf, avg_hf)] {
        if avg.is_nan() {
            log::warn!(
                "{} band [{}, {}] Hz selects no bins (df = {:.4} Hz)",
                band.name,
                band.low,
                band.high,
                spectrum.df
            );
            degeneracies.push(Degeneracy::DegenerateBand {
                band: band.name.clone(),
            });
        }
    }
    Ok(SpectralAnalysis {
        spectrum,
        avg_lf,
        avg_hf,
        degeneracies,
    })
}

/// One-sided power spectrum `|X_k|^2 / resolution` over `0..=nyquist`, with
/// the DC bin zeroed.
pub fn power_spectrum(values: &[f64], dt: f64, resolution: f64) -> AnsResult<PowerSpectrum> {
    require_positive("dt", dt)?;
    require_positive("resolution", resolution)?;
    let n = values.len();
    if n == 0 {
        return Err(AnsError::insufficient("cannot transform an empty series"));
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut buffer = values.to_vec();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut buffer, &mut spectrum)
        .map_err(|e| AnsError::Fft(e.to_string()))?;

    let span = n as f64 * dt;
    let freqs: Vec<f64> = (0..spectrum.len()).map(|k| k as f64 / span).collect();
    let mut powers: Vec<f64> = spectrum
        .iter()
        .map(|c| c.norm_sqr() / resolution)
        .collect();
    powers[0] = 0.0;
    Ok(PowerSpectrum {
        df: 1.0 / span,
        freqs,
        powers,
    })
}

/// Mean power over the bins `band` selects; NaN when it selects none.
pub fn band_average(spectrum: &PowerSpectrum, band: &FrequencyBand) -> f64 {
    let (sum, count) = spectrum
        .points()
        .filter(|(f, _)| band.selects(*f))
        .fold((0.0, 0usize), |(s, c), (_, p)| (s + p, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// `avg_lf / avg_hf` with plain float semantics: a zero HF average gives
/// +inf (or NaN for 0/0) rather than an error.
pub fn lf_hf_ratio(avg_lf: f64, avg_hf: f64) -> f64 {
    avg_lf / avg_hf
}

pub fn ratio_degeneracy(avg_hf: f64) -> Option<Degeneracy> {
    (avg_hf == 0.0 || avg_hf.is_nan()).then_some(Degeneracy::UndefinedRatio { avg_hf })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, n: usize, dt: f64, offset: f64) -> Vec<f64> {
        (0..n)
            .map(|k| offset + (2.0 * PI * freq * k as f64 * dt).sin())
            .collect()
    }

    #[test]
    fn axis_spans_zero_to_nyquist() {
        let dt = 0.1;
        let s = power_spectrum(&sine(0.2, 200, dt, 0.0), dt, 19.9).unwrap();
        assert_eq!(s.len(), 101);
        assert_eq!(s.freqs[0], 0.0);
        assert!((s.freqs[100] - 5.0).abs() < 1e-12);
        assert!((s.df - 0.05).abs() < 1e-12);
        assert!(s.freqs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn dc_bin_is_zeroed() {
        let dt = 0.1;
        let values: Vec<f64> = sine(0.1, 64, dt, 0.85);
        let s = power_spectrum(&values, dt, 6.3).unwrap();
        assert_eq!(s.powers[0], 0.0);
        assert!(s.powers.iter().skip(1).any(|&p| p > 0.0));
    }

    #[test]
    fn power_scales_inversely_with_resolution() {
        let dt = 0.1;
        let values = sine(0.1, 100, dt, 0.0);
        let a = power_spectrum(&values, dt, 1.0).unwrap();
        let b = power_spectrum(&values, dt, 4.0).unwrap();
        for (pa, pb) in a.powers.iter().zip(&b.powers) {
            assert!((pa / 4.0 - pb).abs() <= 1e-9 * pa.abs().max(1.0));
        }
    }

    #[test]
    fn bin_on_shared_edge_counts_in_both_bands() {
        // 3 cycles in 20 s puts all the energy in the 0.15 Hz bin
        let dt = 0.1;
        let values = sine(0.15, 200, dt, 0.8);
        let out = analyze(&values, dt, 19.9).unwrap();
        let edge = out
            .spectrum
            .freqs
            .iter()
            .position(|&f| f == 0.15)
            .expect("0.15 Hz bin present");
        let peak = out.spectrum.powers[edge];
        assert!(peak > 0.0);
        // LF selects 0.05, 0.10, 0.15; HF selects 0.15 ..= 0.40 (6 bins)
        assert!((out.avg_lf - peak / 3.0).abs() < 1e-6 * peak);
        assert!((out.avg_hf - peak / 6.0).abs() < 1e-6 * peak);
        assert!(out.degeneracies.is_empty());
    }

    #[test]
    fn empty_band_is_nan_not_error() {
        // df = 1 / (8 * 0.1) = 1.25 Hz, nothing lands in LF or HF
        let dt = 0.1;
        let out = analyze(&sine(1.25, 8, dt, 0.0), dt, 0.7).unwrap();
        assert!(out.avg_lf.is_nan());
        assert!(out.avg_hf.is_nan());
        assert_eq!(out.degeneracies.len(), 2);
    }

    #[test]
    fn zero_hf_gives_infinite_ratio() {
        let ratio = lf_hf_ratio(2.0, 0.0);
        assert!(ratio.is_infinite() && ratio > 0.0);
        assert!(lf_hf_ratio(0.0, 0.0).is_nan());
        assert!(ratio_degeneracy(0.0).is_some());
        assert!(ratio_degeneracy(1.0).is_none());
        assert!((lf_hf_ratio(3.0, 1.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            power_spectrum(&[], 0.1, 1.0),
            Err(AnsError::InsufficientData(_))
        ));
        assert!(matches!(
            power_spectrum(&[1.0, 2.0], 0.0, 1.0),
            Err(AnsError::InvalidParameter(_))
        ));
        assert!(matches!(
            power_spectrum(&[1.0, 2.0], 0.1, 0.0),
            Err(AnsError::InvalidParameter(_))
        ));
        assert!(FrequencyBand::new("bad", 0.4, 0.15).is_err());
    }
}
