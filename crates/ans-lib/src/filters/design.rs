use super::fir::FilterKernel;
use crate::error::{require_positive, AnsError, AnsResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Symmetric taper applied to the ideal bandpass response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Window {
    #[default]
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl Window {
    pub fn coefficients(&self, size: usize) -> Vec<f64> {
        if size == 1 {
            return vec![1.0];
        }
        let denom = (size - 1) as f64;
        (0..size)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / denom;
                match self {
                    Window::Hann => 0.5 - 0.5 * x.cos(),
                    Window::Hamming => 0.54 - 0.46 * x.cos(),
                    Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    Window::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

impl std::str::FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(Window::Hann),
            "hamming" => Ok(Window::Hamming),
            "blackman" => Ok(Window::Blackman),
            "rectangular" | "boxcar" => Ok(Window::Rectangular),
            other => Err(format!(
                "unknown window '{other}', expected hann, hamming, blackman or rectangular"
            )),
        }
    }
}

/// Windowed-sinc linear-phase bandpass kernel with unit gain at the centre
/// of the passband.
pub fn design_bandpass(
    taps: usize,
    low_hz: f64,
    high_hz: f64,
    sample_rate_hz: f64,
    window: Window,
) -> AnsResult<FilterKernel> {
    require_positive("sample rate", sample_rate_hz)?;
    if taps == 0 {
        return Err(AnsError::invalid("kernel needs at least one tap"));
    }
    let nyquist = sample_rate_hz / 2.0;
    if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
        return Err(AnsError::invalid(format!(
            "cutoffs must satisfy 0 < low < high < nyquist ({nyquist} Hz), got [{low_hz}, {high_hz}]"
        )));
    }
    let left = low_hz / nyquist;
    let right = high_hz / nyquist;
    let alpha = 0.5 * (taps as f64 - 1.0);
    let win = window.coefficients(taps);

    let mut h: Vec<f64> = (0..taps)
        .map(|i| {
            let m = i as f64 - alpha;
            (right * sinc(right * m) - left * sinc(left * m)) * win[i]
        })
        .collect();

    let centre = 0.5 * (left + right);
    let gain: f64 = h
        .iter()
        .enumerate()
        .map(|(i, c)| c * (PI * (i as f64 - alpha) * centre).cos())
        .sum();
    if gain.abs() < f64::EPSILON {
        return Err(AnsError::invalid(format!(
            "{taps} taps cannot resolve a [{low_hz}, {high_hz}] Hz passband"
        )));
    }
    for c in h.iter_mut() {
        *c /= gain;
    }
    FilterKernel::new(h)
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Magnitude response of `kernel` at `freq_hz`.
pub fn gain_at(kernel: &FilterKernel, freq_hz: f64, sample_rate_hz: f64) -> f64 {
    let w = 2.0 * PI * freq_hz / sample_rate_hz;
    let (re, im) = kernel
        .taps
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(re, im), (n, c)| {
            (re + c * (w * n as f64).cos(), im - c * (w * n as f64).sin())
        });
    (re * re + im * im).sqrt()
}
