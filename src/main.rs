// src/main.rs
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use asl_tracker::data::DataExporter;
use asl_tracker::source::{LandmarkSource, ReplaySource, SyntheticSource};
use asl_tracker::{run_pipeline, SessionController, TrackerConfig};

const USAGE: &str = "usage: asl_tracker [--replay <file.jsonl> | --synthetic <hold_frames>] \
                     [--config <file.json>] [--record] [--export]";

/// Delivery rate of the simulated camera.
const CAMERA_FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Camera frames each demo pose is held for; enough to survive throttling and smoothing.
const DEMO_HOLD_FRAMES: usize = 20;

#[derive(Debug, Default)]
struct CliArgs {
    replay: Option<PathBuf>,
    synthetic_hold: Option<usize>,
    config: Option<PathBuf>,
    record: bool,
    export: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--replay" => parsed.replay = Some(args.next().context("--replay needs a path")?.into()),
                "--synthetic" => {
                    let hold = args.next().context("--synthetic needs a frame count")?;
                    parsed.synthetic_hold = Some(hold.parse().with_context(|| format!("bad frame count: {hold}"))?);
                }
                "--config" => parsed.config = Some(args.next().context("--config needs a path")?.into()),
                "--record" => parsed.record = true,
                "--export" => parsed.export = true,
                "-h" | "--help" => {
                    println!("{USAGE}");
                    std::process::exit(0);
                }
                other => bail!("unknown argument: {other}\n{USAGE}"),
            }
        }
        if parsed.replay.is_some() && parsed.synthetic_hold.is_some() {
            bail!("--replay and --synthetic are mutually exclusive");
        }
        Ok(parsed)
    }

    fn open_source(&self) -> Result<Box<dyn LandmarkSource + Send>> {
        match &self.replay {
            Some(path) => {
                let source = ReplaySource::open(path)
                    .with_context(|| format!("Failed to open replay {}", path.display()))?;
                Ok(Box::new(source))
            }
            None => Ok(Box::new(SyntheticSource::demo(self.synthetic_hold.unwrap_or(DEMO_HOLD_FRAMES)))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrackerConfig::default(),
    };

    let output_directory = config.output_directory.clone();
    let controller = SessionController::new(config)?;
    let mut exporter = DataExporter::new(output_directory, None).with_session_id(controller.id());
    let source = args.open_source()?;
    let record = args.record;

    let mut last_shown = None;
    let mut controller = run_pipeline(source, controller, Some(CAMERA_FRAME_INTERVAL), |session, update| {
        exporter.add_update(update);

        let shown = update.displayed_labels.first().copied();
        if shown != last_shown {
            if let Some(label) = shown {
                info!("showing {label}");
            }
            last_shown = shown;
        }

        if record && !session.is_recording() && update.result.has_detections() {
            session.start_recording(Instant::now());
        }
        if update.recording_progress.is_some_and(|p| p >= 1.0) {
            match session.stop_recording() {
                Ok(values) => {
                    let frames = session.config().sequence_length;
                    exporter.add_sequence(values, frames);
                }
                Err(e) => warn!("dropping recording: {e}"),
            }
        }
    })
    .await?;

    if controller.is_recording() {
        if let Err(e) = controller.stop_recording() {
            warn!("last recording discarded: {e}");
        }
    }
    controller.end();

    let summary = exporter.summary();
    info!(
        frames = summary.total_frames,
        detection_rate = %format!("{:.1}%", summary.detection_rate * 100.0),
        sequences = summary.sequences_captured,
        "session summary"
    );

    if args.export {
        let csv = exporter.export_csv().context("Failed to write recognition log")?;
        let frames = exporter.export_frames().context("Failed to write frame results")?;
        let sequences = exporter.export_sequences().context("Failed to write sequences")?;
        let report = exporter.generate_report().context("Failed to write summary")?;
        info!(
            "exported {}, {}, {}, {}",
            csv.display(),
            frames.display(),
            sequences.display(),
            report.display()
        );
    }

    Ok(())
}
