use crate::error::{require_positive, AnsError, AnsResult};
use serde::{Deserialize, Serialize};

/// Uniformly sampled single-lead recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> AnsResult<Self> {
        require_positive("sample rate", fs)?;
        if data.is_empty() {
            return Err(AnsError::invalid("signal must contain at least one sample"));
        }
        Ok(Self { fs, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }

    /// Timestamp in seconds of sample `index`.
    pub fn time_of(&self, index: usize) -> f64 {
        index as f64 / self.fs
    }
}

/// A detected heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub index: usize,
    pub time_s: f64,
    pub amplitude: f64,
}

/// Beats ordered by strictly increasing time. Empty and singleton sequences
/// are valid and only rejected by consumers that need intervals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatSequence {
    pub beats: Vec<Beat>,
}

impl BeatSequence {
    pub fn len(&self) -> usize {
        self.beats.len()
    }
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
    pub fn indices(&self) -> Vec<usize> {
        self.beats.iter().map(|b| b.index).collect()
    }
    pub fn times(&self) -> Vec<f64> {
        self.beats.iter().map(|b| b.time_s).collect()
    }

    /// Builds a sequence from bare beat times, e.g. annotations read from disk.
    /// Amplitudes are unknown and left as NaN; indices are derived from `fs`.
    pub fn from_times(times: &[f64], fs: f64) -> AnsResult<Self> {
        require_positive("sample rate", fs)?;
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnsError::invalid("beat times must be strictly increasing"));
        }
        let beats = times
            .iter()
            .map(|&t| Beat {
                index: (t * fs).round().max(0.0) as usize,
                time_s: t,
                amplitude: f64::NAN,
            })
            .collect();
        Ok(Self { beats })
    }
}

/// Inter-beat intervals. Entry `i` is stamped with the later beat's time and
/// holds the gap to the beat before it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IbiSeries {
    pub times: Vec<f64>,
    pub intervals: Vec<f64>,
}

impl IbiSeries {
    pub fn from_beats(beats: &BeatSequence) -> AnsResult<Self> {
        if beats.len() < 2 {
            return Err(AnsError::insufficient(format!(
                "need at least 2 beats for intervals, got {}",
                beats.len()
            )));
        }
        let mut times = Vec::with_capacity(beats.len() - 1);
        let mut intervals = Vec::with_capacity(beats.len() - 1);
        for w in beats.beats.windows(2) {
            times.push(w[1].time_s);
            intervals.push(w[1].time_s - w[0].time_s);
        }
        Ok(Self { times, intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Interval durations interpolated onto the grid `0, dt, 2dt, ...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampledSeries {
    pub dt: f64,
    pub values: Vec<f64>,
}

impl ResampledSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn times(&self) -> Vec<f64> {
        (0..self.values.len()).map(|k| k as f64 * self.dt).collect()
    }
    /// Last grid timestamp, `(N - 1) * dt`.
    pub fn last_time(&self) -> Option<f64> {
        self.values
            .len()
            .checked_sub(1)
            .map(|last| last as f64 * self.dt)
    }
}
