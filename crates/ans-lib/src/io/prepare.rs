use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Per-recording clean-up applied before the numeric pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Trim {
    /// Trailing samples to drop.
    pub trim_end: usize,
    /// Reverse sample order (recordings captured back to front).
    pub reverse: bool,
}

/// Drop trailing samples, optionally reverse, then multiply by `scale`
/// (e.g. `1 / 204.6` to turn 10-bit ADC counts into volts).
pub fn prepare(raw: &[f64], trim: Trim, scale: f64) -> Result<Vec<f64>> {
    if !(scale.is_finite() && scale != 0.0) {
        bail!("scale must be finite and non-zero, got {scale}");
    }
    if trim.trim_end >= raw.len() {
        bail!(
            "cannot trim {} samples from a {}-sample recording",
            trim.trim_end,
            raw.len()
        );
    }
    let mut out: Vec<f64> = raw[..raw.len() - trim.trim_end]
        .iter()
        .map(|v| v * scale)
        .collect();
    if trim.reverse {
        out.reverse();
    }
    Ok(out)
}

/// Truncate every recording to the length of the shortest one.
pub fn align_to_shortest(recordings: &mut [Vec<f64>]) {
    let Some(shortest) = recordings.iter().map(Vec::len).min() else {
        return;
    };
    for r in recordings.iter_mut() {
        r.truncate(shortest);
    }
}
