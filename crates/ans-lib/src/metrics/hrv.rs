use crate::{
    error::{AnsError, AnsResult},
    signal::{BeatSequence, IbiSeries},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HrvTime {
    pub n: usize,
    pub mean_ibi: f64,
    pub mean_hr_bpm: f64,
    pub sdrr: f64,
}

/// Successive differences of beat times.
pub fn extract_ibi(beats: &BeatSequence) -> AnsResult<IbiSeries> {
    IbiSeries::from_beats(beats)
}

/// Population standard deviation of the interval durations.
pub fn sdrr(ibi: &IbiSeries) -> AnsResult<f64> {
    let n = ibi.intervals.len();
    if n == 0 {
        return Err(AnsError::insufficient("SDRR needs at least one interval"));
    }
    let mean = ibi.intervals.iter().sum::<f64>() / n as f64;
    let var = ibi
        .intervals
        .iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    Ok(var.sqrt())
}

pub fn hrv_time(ibi: &IbiSeries) -> AnsResult<HrvTime> {
    let sdrr = sdrr(ibi)?;
    let n = ibi.len();
    let mean_ibi = ibi.intervals.iter().sum::<f64>() / n as f64;
    let mean_hr_bpm = if mean_ibi > 0.0 {
        60.0 / mean_ibi
    } else {
        f64::NAN
    };
    Ok(HrvTime {
        n,
        mean_ibi,
        mean_hr_bpm,
        sdrr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(times: &[f64]) -> BeatSequence {
        BeatSequence::from_times(times, 500.0).unwrap()
    }

    #[test]
    fn sdrr_matches_hand_computed_value() {
        let ibi = extract_ibi(&beats(&[1.0, 1.8, 2.7, 3.5])).unwrap();
        let value = sdrr(&ibi).unwrap();
        // population sd of [0.8, 0.9, 0.8]
        assert!((value - 0.047140452079103).abs() < 1e-9, "{value}");
    }

    #[test]
    fn constant_spacing_gives_zero() {
        let times: Vec<f64> = (0..50).map(|i| i as f64 * 0.75).collect();
        let ibi = extract_ibi(&beats(&times)).unwrap();
        assert!(sdrr(&ibi).unwrap().abs() < 1e-12);
        let exact = IbiSeries {
            times: vec![1.0, 2.0, 3.0],
            intervals: vec![0.5, 0.5, 0.5],
        };
        assert_eq!(sdrr(&exact).unwrap(), 0.0);
    }

    #[test]
    fn empty_series_is_insufficient() {
        assert!(matches!(
            sdrr(&IbiSeries::default()),
            Err(AnsError::InsufficientData(_))
        ));
    }

    #[test]
    fn summary_reports_heart_rate() {
        let ibi = IbiSeries {
            times: vec![1.0, 1.8],
            intervals: vec![0.8, 0.8],
        };
        let m = hrv_time(&ibi).unwrap();
        assert_eq!(m.n, 2);
        assert!((m.mean_hr_bpm - 75.0).abs() < 1e-9);
    }
}
