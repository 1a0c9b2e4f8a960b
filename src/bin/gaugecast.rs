use std::{fs::File, io::BufReader, path::Path, path::PathBuf, sync::atomic::AtomicBool};

use anyhow::Context as _;
use clap::Parser;

use gaugecast::{
    FfmpegSink, GaugeConfig, GaugeError, GaugeResult, ProgressSink, RawSample, TimeSeries,
    TimeWindow, WindowBound, generate_video,
};

/// Render a gauge overlay video from an extracted telemetry sample document.
#[derive(Parser, Debug)]
#[command(name = "gaugecast", version)]
struct Cli {
    /// Input sample document (JSON array of extracted telemetry samples).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Window start: RFC 3339, or naive local YYYY-MM-DDTHH:MM:SS.
    #[arg(long)]
    start: WindowBound,

    /// Window end (same formats as --start).
    #[arg(long)]
    end: WindowBound,

    /// Output MP4 path. Defaults to the input path with an .mp4 extension.
    #[arg(long)]
    out: Option<PathBuf>,
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn report(&self, percentage: u8, message: &str) {
        eprintln!("[{percentage:3}%] {message}");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    let samples = read_samples(&cli.in_path)?;
    let series = TimeSeries::build(&samples)?;
    let window = TimeWindow::new(cli.start, cli.end)?;

    let out_path = cli
        .out
        .unwrap_or_else(|| cli.in_path.with_extension("mp4"));
    let mut sink = FfmpegSink::new(&out_path);

    generate_video(
        &series,
        &window,
        &GaugeConfig::default(),
        &mut sink,
        &StderrProgress,
        &AtomicBool::new(false),
    )?;

    println!("{}", out_path.display());
    Ok(())
}

fn read_samples(path: &Path) -> GaugeResult<Vec<RawSample>> {
    let file = File::open(path)
        .with_context(|| format!("open sample document '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        GaugeError::malformed_input(format!(
            "sample document '{}' is not a valid JSON sample array: {e}",
            path.display()
        ))
    })
}
