use crate::{
    error::{AnsError, AnsResult},
    signal::TimeSeries,
};
use serde::{Deserialize, Serialize};

/// FIR coefficients, designed elsewhere and applied as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterKernel {
    pub taps: Vec<f64>,
}

impl FilterKernel {
    pub fn new(taps: Vec<f64>) -> AnsResult<Self> {
        if taps.is_empty() {
            return Err(AnsError::invalid("filter kernel must not be empty"));
        }
        Ok(Self { taps })
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Number of output samples at each end that overlap the zero padding.
    pub fn edge_samples(&self) -> usize {
        self.taps.len() / 2
    }
}

/// Same-length (centred) convolution of `signal` with `kernel`.
///
/// The output is the full convolution cropped to `signal.len()` starting at
/// offset `(taps - 1) / 2`. Roughly `taps / 2` samples at either end are
/// affected by the implicit zero padding; see [`FilterKernel::edge_samples`].
pub fn apply(signal: &TimeSeries, kernel: &FilterKernel) -> AnsResult<TimeSeries> {
    let data = convolve_same(&signal.data, &kernel.taps)?;
    log::debug!(
        "filtered {} samples with {}-tap kernel",
        data.len(),
        kernel.len()
    );
    Ok(TimeSeries {
        fs: signal.fs,
        data,
    })
}

pub fn convolve_same(data: &[f64], taps: &[f64]) -> AnsResult<Vec<f64>> {
    if taps.is_empty() {
        return Err(AnsError::invalid("filter kernel must not be empty"));
    }
    if taps.len() > data.len() {
        return Err(AnsError::invalid(format!(
            "filter kernel ({} taps) is longer than the signal ({} samples)",
            taps.len(),
            data.len()
        )));
    }
    let n = data.len();
    let m = taps.len();
    let offset = (m - 1) / 2;
    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        // full[k] = sum_j taps[j] * data[k - j], k = i + offset
        let k = i + offset;
        let j_lo = k.saturating_sub(n - 1);
        let j_hi = k.min(m - 1);
        let mut acc = 0.0;
        for j in j_lo..=j_hi {
            acc += taps[j] * data[k - j];
        }
        *slot = acc;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::design::{design_bandpass, Window};
    use std::f64::consts::PI;

    #[test]
    fn matches_centred_full_convolution() {
        let out = convolve_same(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]).unwrap();
        assert_eq!(out, vec![1.0, 2.5, 4.0]);
        // even-length kernel: offset (4 - 1) / 2 = 1
        let out = convolve_same(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(out, vec![2.0, 3.0, 4.0, 5.0, 0.0]);
    }

    #[test]
    fn zero_signal_stays_zero() {
        let kernel = design_bandpass(101, 0.5, 50.0, 500.0, Window::Hann).unwrap();
        let ts = TimeSeries::new(500.0, vec![0.0; 1000]).unwrap();
        let out = apply(&ts, &kernel).unwrap();
        assert!(out.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn output_length_matches_input() {
        for taps in [1usize, 2, 7, 64, 250] {
            let kernel = FilterKernel::new(vec![0.1; taps]).unwrap();
            let ts = TimeSeries::new(500.0, (0..300).map(|i| i as f64).collect()).unwrap();
            assert_eq!(apply(&ts, &kernel).unwrap().len(), ts.len());
        }
    }

    #[test]
    fn rejects_empty_or_overlong_kernel() {
        assert!(FilterKernel::new(Vec::new()).is_err());
        assert!(matches!(
            convolve_same(&[1.0, 2.0], &[]),
            Err(AnsError::InvalidParameter(_))
        ));
        assert!(matches!(
            convolve_same(&[1.0, 2.0], &[1.0, 1.0, 1.0]),
            Err(AnsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn bandpass_preserves_slow_sine_away_from_edges() {
        let fs = 500.0;
        let data: Vec<f64> = (0..5000)
            .map(|i| (2.0 * PI * 1.0 * i as f64 / fs).sin())
            .collect();
        let ts = TimeSeries::new(fs, data).unwrap();
        let kernel = design_bandpass(2501, 0.5, 50.0, fs, Window::Hann).unwrap();
        let out = apply(&ts, &kernel).unwrap();
        let edge = kernel.edge_samples();
        let rms = |xs: &[f64]| (xs.iter().map(|x| x * x).sum::<f64>() / xs.len() as f64).sqrt();
        let before = rms(&ts.data[edge..ts.len() - edge]);
        let after = rms(&out.data[edge..out.len() - edge]);
        assert!(
            (after / before - 1.0).abs() < 0.05,
            "rms drifted: {before} -> {after}"
        );
    }
}
