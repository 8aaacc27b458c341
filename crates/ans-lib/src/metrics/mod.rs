pub mod hrv;
pub mod resample;
pub mod spectrum;
