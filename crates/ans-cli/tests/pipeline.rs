use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, f64::consts::PI, fs, path::Path};
use tempfile::tempdir;

const FS: f64 = 500.0;
const COUNTS_PER_VOLT: f64 = 204.6;

#[derive(Deserialize)]
struct Summary {
    label: String,
    beats: usize,
    sdrr: Option<f64>,
    avg_lf: Option<f64>,
    avg_hf: Option<f64>,
    lf_hf: Option<f64>,
    degeneracies: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ComparisonOutput {
    rows: Vec<Summary>,
}

/// Raw ADC counts of a pulse train whose interval swings at `mod_hz`.
fn write_recording(path: &Path, duration: f64, base_ibi: f64, mod_hz: f64) -> usize {
    let n = (duration * FS) as usize;
    let mut volts: Vec<f64> = (0..n)
        .map(|i| 0.4 + 0.1 * (2.0 * PI * 0.15 * i as f64 / FS).sin())
        .collect();
    let mut t = 1.0;
    let mut beats = 0;
    while t < duration - 1.0 {
        let centre = (t * FS) as isize;
        for off in -40isize..=40 {
            let idx = centre + off;
            if idx >= 0 && (idx as usize) < n {
                let dt = off as f64 / FS;
                volts[idx as usize] += 3.0 * (-0.5 * (dt / 0.012).powi(2)).exp();
            }
        }
        beats += 1;
        t += base_ibi + 0.05 * (2.0 * PI * mod_hz * t).sin();
    }
    let text: String = volts
        .iter()
        .map(|v| format!("{:.3}\n", v * COUNTS_PER_VOLT))
        .collect();
    fs::write(path, text).expect("write recording");
    beats
}

#[test]
fn pipeline_command_summarises_one_activity() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let recording = dir.path().join("rest.txt");
    let expected = write_recording(&recording, 90.0, 0.85, 0.1);
    let out_dir = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("ans");
    cmd.args([
        "pipeline",
        "--label",
        "rest",
        "--scale",
        &(1.0 / COUNTS_PER_VOLT).to_string(),
        "--input",
        recording.to_str().expect("utf8 path"),
        "--out-dir",
        out_dir.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&output)?;

    assert_eq!(summary.label, "rest");
    assert!(
        (summary.beats as isize - expected as isize).abs() <= 1,
        "{} beats, expected {expected}",
        summary.beats
    );
    assert!(summary.sdrr.unwrap() > 0.0);
    let lf = summary.avg_lf.unwrap();
    let hf = summary.avg_hf.unwrap();
    assert!((summary.lf_hf.unwrap() - lf / hf).abs() <= 1e-9 * (lf / hf).abs().max(1.0));
    assert!(summary.degeneracies.is_empty());

    for name in ["rest_beats.csv", "rest_resampled.csv", "rest_spectrum.csv"] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }
    let spectrum = fs::read_to_string(out_dir.join("rest_spectrum.csv"))?;
    assert!(spectrum.starts_with("freq_hz,power"));
    Ok(())
}

#[test]
fn pipeline_rejects_non_positive_threshold() {
    let dir = tempdir().unwrap();
    let recording = dir.path().join("rest.txt");
    write_recording(&recording, 10.0, 0.85, 0.1);
    let mut cmd = cargo_bin_cmd!("ans");
    cmd.args([
        "pipeline",
        "--amplitude-threshold",
        "0",
        "--input",
        recording.to_str().unwrap(),
    ]);
    cmd.assert().failure();
}

#[test]
fn compare_keeps_going_past_a_flat_activity() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    write_recording(&dir.path().join("rest.txt"), 80.0, 0.95, 0.25);
    write_recording(&dir.path().join("mental.txt"), 85.0, 0.7, 0.1);
    let flat: String = (0..40_000).map(|_| "100\n").collect();
    fs::write(dir.path().join("physical.txt"), flat)?;
    let session = dir.path().join("session.toml");
    fs::write(
        &session,
        r#"
        resolution_reference = "rest"

        [prepare]
        scale = 0.004887585532746823

        [[activity]]
        activity = "rest"
        path = "rest.txt"

        [[activity]]
        activity = "mental-stress"
        path = "mental.txt"
        trim_end = 500
        reverse = true

        [[activity]]
        activity = "physical-stress"
        path = "physical.txt"
        "#,
    )?;
    let out_dir = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("ans");
    cmd.args([
        "compare",
        "--session",
        session.to_str().expect("utf8 path"),
        "--out-dir",
        out_dir.to_str().expect("utf8 path"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let table: ComparisonOutput = serde_json::from_slice(&output)?;

    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["rest", "mental-stress", "physical-stress"]);
    assert!(table.rows[0].lf_hf.unwrap().is_finite());
    assert!(table.rows[1].lf_hf.unwrap().is_finite());
    let flat = &table.rows[2];
    assert_eq!(flat.beats, 0);
    assert!(flat.sdrr.is_none());
    assert!(flat.lf_hf.is_none());
    assert_eq!(flat.degeneracies.len(), 1);

    let summary = fs::read_to_string(out_dir.join("summary.csv"))?;
    assert_eq!(summary.lines().count(), 4);
    Ok(())
}
