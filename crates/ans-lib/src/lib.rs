//! Autonomic-activity indicators from single-lead ECG: FIR bandpass filtering,
//! R-peak detection, inter-beat intervals, SDRR, uniform resampling and LF/HF
//! band power of the interval spectrum.

pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use error::{AnsError, AnsResult, Degeneracy};
pub use signal::*;
