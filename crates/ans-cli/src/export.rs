use anyhow::{Context, Result};
use ans_lib::pipeline::{ActivityReport, Comparison};
use csv::WriterBuilder;
use serde::Serialize;
use std::{fs, path::Path};

#[derive(Serialize)]
struct SpectrumRow {
    freq_hz: f64,
    power: f64,
}

#[derive(Serialize)]
struct GridRow {
    time_s: f64,
    ibi_s: f64,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    activity: &'a str,
    beats: usize,
    mean_hr_bpm: f64,
    sdrr_s: f64,
    avg_lf: f64,
    avg_hf: f64,
    lf_hf: f64,
    degeneracies: usize,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Beats, resampled intervals and spectrum of one activity as CSV files.
pub fn write_report(dir: &Path, report: &ActivityReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let label = &report.label;
    write_rows(&dir.join(format!("{label}_beats.csv")), &report.beats.beats)?;
    write_rows(
        &dir.join(format!("{label}_resampled.csv")),
        report
            .resampled
            .times()
            .into_iter()
            .zip(report.resampled.values.iter().copied())
            .map(|(time_s, ibi_s)| GridRow { time_s, ibi_s }),
    )?;
    write_rows(
        &dir.join(format!("{label}_spectrum.csv")),
        report
            .spectrum
            .points()
            .map(|(freq_hz, power)| SpectrumRow { freq_hz, power }),
    )?;
    log::info!("wrote {label} exports to {}", dir.display());
    Ok(())
}

pub fn write_summary(dir: &Path, comparison: &Comparison) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    write_rows(
        &dir.join("summary.csv"),
        comparison.rows.iter().map(|r| SummaryRow {
            activity: &r.label,
            beats: r.beats,
            mean_hr_bpm: r.mean_hr_bpm,
            sdrr_s: r.sdrr,
            avg_lf: r.avg_lf,
            avg_hf: r.avg_hf,
            lf_hf: r.lf_hf,
            degeneracies: r.degeneracies.len(),
        }),
    )
}
