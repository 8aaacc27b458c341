use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard failures raised by the numeric core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnsError {
    /// Structural misuse: bad rates, empty kernels, non-positive thresholds.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Not enough beats or intervals to compute the requested quantity.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("fft failure: {0}")]
    Fft(String),
}

impl AnsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AnsError::InvalidParameter(msg.into())
    }

    pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
        AnsError::InsufficientData(msg.into())
    }
}

pub type AnsResult<T> = Result<T, AnsError>;

/// Data-dependent conditions that are reported next to NaN/empty sentinels
/// instead of aborting a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degeneracy {
    InsufficientData { stage: String, detail: String },
    DegenerateBand { band: String },
    UndefinedRatio { avg_hf: f64 },
}

pub(crate) fn require_positive(name: &str, value: f64) -> AnsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnsError::invalid(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}
