use crate::{
    config::{Activity, PipelineConfig},
    io::{
        prepare::{align_to_shortest, prepare, Trim},
        text::read_f64_series,
    },
    pipeline::{compare, ActivityReport},
    signal::TimeSeries,
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub activity: Activity,
    pub path: PathBuf,
    #[serde(default)]
    pub trim_end: usize,
    #[serde(default)]
    pub reverse: bool,
}

impl ActivityEntry {
    pub fn trim(&self) -> Trim {
        Trim {
            trim_end: self.trim_end,
            reverse: self.reverse,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Multiplier from raw units to the units the detector threshold is tuned for.
    pub scale: f64,
    pub align_to_shortest: bool,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            align_to_shortest: true,
        }
    }
}

/// A multi-activity comparison described in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub prepare: PrepareConfig,
    /// Activity whose last grid timestamp normalises every spectrum.
    #[serde(default)]
    pub resolution_reference: Option<Activity>,
    #[serde(rename = "activity")]
    pub activities: Vec<ActivityEntry>,
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let session: Self = toml::from_str(text).context("invalid session config")?;
        session.pipeline.validate()?;
        if session.activities.is_empty() {
            bail!("session lists no [[activity]] entries");
        }
        for (i, a) in session.activities.iter().enumerate() {
            if session.activities[..i].iter().any(|b| b.activity == a.activity) {
                bail!("activity '{}' listed more than once", a.activity);
            }
        }
        if let Some(reference) = session.resolution_reference {
            if !session.activities.iter().any(|a| a.activity == reference) {
                bail!("resolution_reference '{reference}' is not one of the activities");
            }
        }
        Ok(session)
    }

    /// Load a session; relative recording paths are resolved against the
    /// session file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut session =
            Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))?;
        if let Some(base) = path.parent() {
            for entry in session.activities.iter_mut() {
                if entry.path.is_relative() {
                    entry.path = base.join(&entry.path);
                }
            }
        }
        Ok(session)
    }

    /// Load, prepare and align every recording.
    pub fn load_signals(&self) -> Result<Vec<(String, TimeSeries)>> {
        let mut recordings = Vec::with_capacity(self.activities.len());
        for entry in &self.activities {
            let raw = read_f64_series(&entry.path)?;
            let prepared = prepare(&raw, entry.trim(), self.prepare.scale)
                .with_context(|| format!("preparing {}", entry.activity))?;
            log::debug!(
                "{}: {} raw samples, {} after preparation",
                entry.activity,
                raw.len(),
                prepared.len()
            );
            recordings.push(prepared);
        }
        if self.prepare.align_to_shortest {
            align_to_shortest(&mut recordings);
        }
        self.activities
            .iter()
            .zip(recordings)
            .map(|(entry, data)| {
                let ts = TimeSeries::new(self.pipeline.sample_rate_hz, data)
                    .with_context(|| format!("building {} signal", entry.activity))?;
                Ok((entry.activity.to_string(), ts))
            })
            .collect()
    }

    pub fn run(&self) -> Result<Vec<ActivityReport>> {
        let signals = self.load_signals()?;
        let kernel = self.pipeline.kernel.design(self.pipeline.sample_rate_hz)?;
        let reference = self.resolution_reference.map(|a| a.as_str());
        Ok(compare(&signals, &kernel, &self.pipeline, reference)?)
    }
}
