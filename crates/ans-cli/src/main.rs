mod export;
mod render;

use anyhow::{Context, Result};
use ans_lib::{
    config::{PipelineConfig, Resolution},
    detectors::ecg::detect_beats,
    filters::{
        design::{design_bandpass, Window},
        fir::{apply, FilterKernel},
    },
    io::{
        prepare::{prepare, Trim},
        session::SessionConfig,
        text as text_io,
    },
    metrics::{
        hrv::{extract_ibi, hrv_time},
        resample::{resample_with, GridLength},
        spectrum::{analyze, lf_hf_ratio, SpectralAnalysis},
    },
    pipeline::{run_activity, Comparison},
    signal::{BeatSequence, TimeSeries},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use serde::Serialize;
use std::{
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "ans",
    version,
    about = "ANS: ECG heart-rate-variability analysis across activity conditions"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GridArg {
    #[value(name = "interval-count")]
    IntervalCount,
    #[value(name = "interval-count-seconds")]
    IntervalCountSeconds,
    #[value(name = "elapsed-time")]
    ElapsedTime,
}

impl From<GridArg> for GridLength {
    fn from(arg: GridArg) -> Self {
        match arg {
            GridArg::IntervalCount => GridLength::IntervalCount,
            GridArg::IntervalCountSeconds => GridLength::IntervalCountSeconds,
            GridArg::ElapsedTime => GridLength::ElapsedTime,
        }
    }
}

#[derive(Args, Clone, Debug)]
struct KernelArgs {
    /// Precomputed kernel, newline-delimited coefficients (overrides design flags)
    #[arg(long)]
    kernel: Option<PathBuf>,
    #[arg(long, default_value_t = 250)]
    taps: usize,
    #[arg(long, default_value_t = 0.5)]
    low_hz: f64,
    #[arg(long, default_value_t = 50.0)]
    high_hz: f64,
    #[arg(long, default_value = "hann")]
    window: Window,
}

impl KernelArgs {
    fn build(&self, fs: f64) -> Result<FilterKernel> {
        match &self.kernel {
            Some(path) => Ok(FilterKernel::new(text_io::read_f64_series(path)?)?),
            None => Ok(design_bandpass(
                self.taps,
                self.low_hz,
                self.high_hz,
                fs,
                self.window,
            )?),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print a windowed-sinc bandpass kernel, one coefficient per line
    DesignKernel {
        #[arg(long, default_value_t = 500.0)]
        fs: f64,
        #[arg(long, default_value_t = 250)]
        taps: usize,
        #[arg(long, default_value_t = 0.5)]
        low_hz: f64,
        #[arg(long, default_value_t = 50.0)]
        high_hz: f64,
        #[arg(long, default_value = "hann")]
        window: Window,
    },
    /// Bandpass newline-delimited samples from stdin or --input
    Filter {
        #[arg(long, default_value_t = 500.0)]
        fs: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        kernel: KernelArgs,
    },
    /// Detect beats in an (already filtered) signal
    FindBeats {
        #[arg(long, default_value_t = 500.0)]
        fs: f64,
        #[arg(long, default_value_t = 250)]
        min_distance_samples: usize,
        /// Minimum peak height, in signal units; depends on sensor gain
        #[arg(long)]
        amplitude_threshold: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Inter-beat intervals from newline-delimited beat times (seconds)
    Ibi {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// SDRR and mean heart rate from beat times (seconds)
    Sdrr {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Resample intervals from beat times and report LF/HF band power
    IbiSpectrum {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
        #[arg(long, value_enum, default_value = "interval-count")]
        grid: GridArg,
        /// Fixed spectrum normaliser; defaults to the last grid timestamp
        #[arg(long)]
        resolution: Option<f64>,
    },
    /// Run the full pipeline on one activity recording
    Pipeline {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Pipeline settings in TOML; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "recording")]
        label: String,
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long)]
        amplitude_threshold: Option<f64>,
        #[arg(long)]
        min_distance_samples: Option<usize>,
        /// Multiplier applied to raw samples (e.g. 0.0048876 for 10-bit counts to volts)
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long, default_value_t = 0)]
        trim_end: usize,
        #[arg(long)]
        reverse: bool,
        /// Also print every intermediate series, not just the summary
        #[arg(long)]
        full: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },
    /// Compare all activities listed in a session TOML
    Compare {
        #[arg(long)]
        session: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();
    match cli.command {
        Commands::DesignKernel {
            fs,
            taps,
            low_hz,
            high_hz,
            window,
        } => cmd_design_kernel(fs, taps, low_hz, high_hz, window)?,
        Commands::Filter { fs, input, kernel } => cmd_filter(fs, input.as_deref(), &kernel)?,
        Commands::FindBeats {
            fs,
            min_distance_samples,
            amplitude_threshold,
            input,
        } => cmd_find_beats(fs, min_distance_samples, amplitude_threshold, input.as_deref())?,
        Commands::Ibi { input } => cmd_ibi(input.as_deref())?,
        Commands::Sdrr { input } => cmd_sdrr(input.as_deref())?,
        Commands::IbiSpectrum {
            input,
            dt,
            grid,
            resolution,
        } => cmd_ibi_spectrum(input.as_deref(), dt, grid.into(), resolution)?,
        Commands::Pipeline {
            input,
            config,
            label,
            fs,
            amplitude_threshold,
            min_distance_samples,
            scale,
            trim_end,
            reverse,
            full,
            out_dir,
            plot_dir,
        } => {
            let mut cfg = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(fs) = fs {
                cfg.sample_rate_hz = fs;
            }
            if let Some(threshold) = amplitude_threshold {
                cfg.detector.amplitude_threshold = threshold;
            }
            if let Some(distance) = min_distance_samples {
                cfg.detector.min_distance_samples = distance;
            }
            let trim = Trim { trim_end, reverse };
            cmd_pipeline(
                input.as_deref(),
                &label,
                &cfg,
                scale,
                trim,
                full,
                out_dir.as_deref(),
                plot_dir.as_deref(),
            )?
        }
        Commands::Compare {
            session,
            out_dir,
            plot_dir,
        } => cmd_compare(&session, out_dir.as_deref(), plot_dir.as_deref())?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_design_kernel(fs: f64, taps: usize, low_hz: f64, high_hz: f64, window: Window) -> Result<()> {
    let kernel = design_bandpass(taps, low_hz, high_hz, fs, window)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for c in &kernel.taps {
        writeln!(out, "{c}")?;
    }
    Ok(())
}

fn cmd_filter(fs: f64, input: Option<&Path>, kernel: &KernelArgs) -> Result<()> {
    let ts = TimeSeries::new(fs, read_samples(input)?)?;
    let kernel = kernel.build(fs)?;
    let filtered = apply(&ts, &kernel)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for v in &filtered.data {
        writeln!(out, "{v}")?;
    }
    Ok(())
}

fn cmd_find_beats(
    fs: f64,
    min_distance_samples: usize,
    amplitude_threshold: f64,
    input: Option<&Path>,
) -> Result<()> {
    let ts = TimeSeries::new(fs, read_samples(input)?)?;
    let beats = detect_beats(&ts, min_distance_samples, amplitude_threshold)?;
    print_json(&beats)
}

fn beats_from_input(input: Option<&Path>) -> Result<BeatSequence> {
    let times = read_samples(input)?;
    // beat times carry no sampling grid; indices are nominal at 1 kHz
    Ok(BeatSequence::from_times(&times, 1000.0)?)
}

fn cmd_ibi(input: Option<&Path>) -> Result<()> {
    let ibi = extract_ibi(&beats_from_input(input)?)?;
    print_json(&ibi)
}

fn cmd_sdrr(input: Option<&Path>) -> Result<()> {
    let ibi = extract_ibi(&beats_from_input(input)?)?;
    print_json(&hrv_time(&ibi)?)
}

#[derive(Serialize)]
struct SpectrumOutput {
    resolution: f64,
    lf_hf: f64,
    #[serde(flatten)]
    analysis: SpectralAnalysis,
}

fn cmd_ibi_spectrum(
    input: Option<&Path>,
    dt: f64,
    grid: GridLength,
    resolution: Option<f64>,
) -> Result<()> {
    let ibi = extract_ibi(&beats_from_input(input)?)?;
    let resampled = resample_with(&ibi, dt, grid)?;
    let resolution = match resolution {
        Some(r) => r,
        None => resampled
            .last_time()
            .filter(|t| *t > 0.0)
            .context("need at least two grid points to derive a normaliser; pass --resolution")?,
    };
    let analysis = analyze(&resampled.values, dt, resolution)?;
    print_json(&SpectrumOutput {
        resolution,
        lf_hf: lf_hf_ratio(analysis.avg_lf, analysis.avg_hf),
        analysis,
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_pipeline(
    input: Option<&Path>,
    label: &str,
    cfg: &PipelineConfig,
    scale: f64,
    trim: Trim,
    full: bool,
    out_dir: Option<&Path>,
    plot_dir: Option<&Path>,
) -> Result<()> {
    cfg.validate()?;
    let raw = read_samples(input)?;
    let data = prepare(&raw, trim, scale)?;
    let ts = TimeSeries::new(cfg.sample_rate_hz, data)?;
    let kernel = cfg.kernel.design(cfg.sample_rate_hz)?;
    let report = run_activity(label, &ts, &kernel, cfg)?;
    if let Some(dir) = out_dir {
        export::write_report(dir, &report)?;
    }
    if let Some(dir) = plot_dir {
        render::render_report(dir, &report, cfg)?;
    }
    if full {
        print_json(&report)
    } else {
        print_json(&report.summary())
    }
}

fn cmd_compare(session: &Path, out_dir: Option<&Path>, plot_dir: Option<&Path>) -> Result<()> {
    let session = SessionConfig::load(session)?;
    if matches!(session.pipeline.resolution, Resolution::Fixed(_))
        && session.resolution_reference.is_some()
    {
        log::warn!("resolution_reference overrides the fixed pipeline resolution");
    }
    let reports = session.run()?;
    let comparison = Comparison::from_reports(&reports);
    if let Some(dir) = out_dir {
        for report in &reports {
            export::write_report(dir, report)?;
        }
        export::write_summary(dir, &comparison)?;
    }
    if let Some(dir) = plot_dir {
        for report in &reports {
            render::render_report(dir, report, &session.pipeline)?;
        }
        render::render_comparison(dir, &comparison)?;
    }
    print_json(&comparison)
}
