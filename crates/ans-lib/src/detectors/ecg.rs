use crate::{
    error::{require_positive, AnsError, AnsResult},
    signal::{Beat, BeatSequence, TimeSeries},
};
use serde::{Deserialize, Serialize};

/// Parameters for thresholded R-peak picking.
///
/// `amplitude_threshold` is expressed in the units of the filtered signal and
/// therefore depends on sensor gain and unit conversion; there is no
/// universally valid default. The provided default (1.7) is tuned for a 10-bit
/// ADC converted to volts and filtered with a 0.5-50 Hz bandpass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum separation between accepted beats, in samples.
    pub min_distance_samples: usize,
    /// Minimum peak height (inclusive).
    pub amplitude_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_distance_samples: 250,
            amplitude_threshold: 1.7,
        }
    }
}

/// Detect beats as local maxima at or above `amplitude_threshold`, pruned so
/// that no two survivors are closer than `min_distance_samples`.
///
/// When two candidates collide the higher one wins. Empty and singleton
/// results are returned as-is.
pub fn detect_beats(
    ts: &TimeSeries,
    min_distance_samples: usize,
    amplitude_threshold: f64,
) -> AnsResult<BeatSequence> {
    require_positive("sample rate", ts.fs)?;
    require_positive("amplitude threshold", amplitude_threshold)?;
    if min_distance_samples == 0 {
        return Err(AnsError::invalid("min distance must be at least one sample"));
    }

    let data = &ts.data;
    let candidates: Vec<usize> = local_maxima(data)
        .into_iter()
        .filter(|&i| data[i] >= amplitude_threshold)
        .collect();
    let kept = prune_by_distance(data, &candidates, min_distance_samples);
    log::debug!(
        "{} local maxima above {amplitude_threshold}, {} kept after {min_distance_samples}-sample pruning",
        candidates.len(),
        kept.len()
    );

    let beats = kept
        .into_iter()
        .map(|index| Beat {
            index,
            time_s: ts.time_of(index),
            amplitude: data[index],
        })
        .collect();
    Ok(BeatSequence { beats })
}

pub fn detect_beats_with_config(ts: &TimeSeries, cfg: &DetectorConfig) -> AnsResult<BeatSequence> {
    detect_beats(ts, cfg.min_distance_samples, cfg.amplitude_threshold)
}

/// Indices of strict local maxima. A flat top bounded by lower samples on
/// both sides counts once, at its midpoint. The first and last samples are
/// never maxima.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                let right = ahead - 1;
                peaks.push((i + right) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

fn prune_by_distance(data: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if peaks.len() < 2 || distance <= 1 {
        return peaks.to_vec();
    }
    // highest first, later index first among equal heights
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        data[peaks[b]]
            .total_cmp(&data[peaks[a]])
            .then_with(|| b.cmp(&a))
    });

    let mut keep = vec![true; peaks.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        let mut k = i;
        while k > 0 && peaks[i] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = i + 1;
        while k < peaks.len() && peaks[k] - peaks[i] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
