use crate::{
    detectors::ecg::DetectorConfig,
    error::{require_positive, AnsError, AnsResult},
    filters::design::{design_bandpass, Window},
    filters::fir::FilterKernel,
    metrics::{resample::GridLength, spectrum::FrequencyBand},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

/// The four recording conditions compared by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    Rest,
    Relaxation,
    MentalStress,
    PhysicalStress,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::Rest,
        Activity::Relaxation,
        Activity::MentalStress,
        Activity::PhysicalStress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Rest => "rest",
            Activity::Relaxation => "relaxation",
            Activity::MentalStress => "mental-stress",
            Activity::PhysicalStress => "physical-stress",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activity::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                format!("unknown activity '{s}', expected rest, relaxation, mental-stress or physical-stress")
            })
    }
}

/// Bandpass kernel design parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub taps: usize,
    pub low_hz: f64,
    pub high_hz: f64,
    pub window: Window,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            taps: 250,
            low_hz: 0.5,
            high_hz: 50.0,
            window: Window::Hann,
        }
    }
}

impl KernelConfig {
    pub fn design(&self, sample_rate_hz: f64) -> AnsResult<FilterKernel> {
        design_bandpass(
            self.taps,
            self.low_hz,
            self.high_hz,
            sample_rate_hz,
            self.window,
        )
    }
}

/// Normaliser applied to the squared FFT magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Last grid timestamp of the series being analysed.
    #[default]
    OwnGrid,
    Fixed(f64),
}

/// Every tunable of one activity run. Nothing here is read implicitly by the
/// stages; the pipeline passes each value to the call that needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sample_rate_hz: f64,
    pub kernel: KernelConfig,
    pub detector: DetectorConfig,
    /// Resampling step in seconds.
    pub dt_s: f64,
    pub grid: GridLength,
    pub resolution: Resolution,
    pub lf: FrequencyBand,
    pub hf: FrequencyBand,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 500.0,
            kernel: KernelConfig::default(),
            detector: DetectorConfig::default(),
            dt_s: 0.1,
            grid: GridLength::default(),
            resolution: Resolution::default(),
            lf: FrequencyBand::lf(),
            hf: FrequencyBand::hf(),
        }
    }
}

impl PipelineConfig {
    /// Fail fast on structural misuse before any computation runs.
    pub fn validate(&self) -> AnsResult<()> {
        require_positive("sample rate", self.sample_rate_hz)?;
        require_positive("dt", self.dt_s)?;
        require_positive(
            "amplitude threshold",
            self.detector.amplitude_threshold,
        )?;
        if self.detector.min_distance_samples == 0 {
            return Err(AnsError::invalid("min distance must be at least one sample"));
        }
        if let Resolution::Fixed(value) = self.resolution {
            require_positive("resolution", value)?;
        }
        for band in [&self.lf, &self.hf] {
            FrequencyBand::new(band.name.clone(), band.low, band.high)?;
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text).context("invalid pipeline config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.sample_rate_hz, 500.0);
        assert_eq!(cfg.kernel.taps, 250);
        assert_eq!(cfg.detector.min_distance_samples, 250);
        assert_eq!(cfg.detector.amplitude_threshold, 1.7);
        assert_eq!(cfg.dt_s, 0.1);
        assert_eq!(cfg.lf.high, cfg.hf.low);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            sample_rate_hz = 250.0
            grid = "elapsed-time"
            resolution = { fixed = 300.0 }

            [detector]
            amplitude_threshold = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sample_rate_hz, 250.0);
        assert_eq!(cfg.grid, GridLength::ElapsedTime);
        assert_eq!(cfg.resolution, Resolution::Fixed(300.0));
        assert_eq!(cfg.detector.amplitude_threshold, 0.4);
        assert_eq!(cfg.detector.min_distance_samples, 250);
        assert_eq!(cfg.kernel.window, Window::Hann);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(PipelineConfig::from_toml_str("dt_s = 0.0").is_err());
        assert!(PipelineConfig::from_toml_str("[detector]\namplitude_threshold = -1.0").is_err());
        assert!(PipelineConfig::from_toml_str("[lf]\nname = \"LF\"\nlow = 0.2\nhigh = 0.1").is_err());
    }

    #[test]
    fn activity_names_round_trip() {
        for a in Activity::ALL {
            assert_eq!(a.to_string().parse::<Activity>().unwrap(), a);
        }
        assert!("sleep".parse::<Activity>().is_err());
    }
}
