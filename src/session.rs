// src/session.rs - Capture session: throttling, FPS estimate, smoothing and sequence recording
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::classifier::HandLabel;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::recognition::{FrameMeta, FrameResult, RecognitionBuilder};
use crate::sequence::SequenceBuffer;
use crate::smoothing::{LabelSmoother, SmoothingState};
use crate::source::{HandObservation, LandmarkSource};

const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Skips frames arriving sooner than `min_interval` after the last accepted one.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

/// Frames per second over roughly one-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u32,
    last_check: Instant,
    fps: f64,
}

impl FpsCounter {
    pub fn new(start: Instant) -> Self {
        Self {
            frames: 0,
            last_check: start,
            fps: 0.0,
        }
    }

    /// Count one processed frame; the estimate refreshes once a full window has passed.
    pub fn tick(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.last_check);
        if elapsed >= FPS_WINDOW {
            self.fps = self.frames as f64 / elapsed.as_secs_f64();
            self.frames = 0;
            self.last_check = now;
        }
        self.fps
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// What the display layer gets back for each processed frame.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub result: FrameResult,
    pub smoothing: SmoothingState,
    pub displayed_labels: Vec<HandLabel>,
    /// Sequence fill level while recording.
    pub recording_progress: Option<f64>,
}

/// An active take. Frames are only buffered once `capture_from` is reached,
/// giving the signer time to get into position.
#[derive(Debug, Clone, Copy)]
struct Recording {
    started: DateTime<Local>,
    capture_from: Instant,
}

/// Owns the long-lived per-session state. Created when a capture session
/// starts and dropped when it ends; all mutation goes through `&mut self`,
/// so frames are applied one at a time.
pub struct SessionController {
    id: Uuid,
    config: TrackerConfig,
    builder: RecognitionBuilder,
    smoother: LabelSmoother,
    buffer: SequenceBuffer,
    throttle: FrameThrottle,
    fps: FpsCounter,
    recording: Option<Recording>,
    frames_processed: u64,
    frames_skipped: u64,
}

impl SessionController {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let id = Uuid::new_v4();
        info!(session = %id, window = config.smoothing_window, sequence = config.sequence_length, "session started");

        Ok(Self {
            id,
            builder: RecognitionBuilder::from_config(&config),
            smoother: LabelSmoother::new(config.smoothing_window),
            buffer: SequenceBuffer::new(config.sequence_length),
            throttle: FrameThrottle::new(Duration::from_millis(config.min_processing_interval_ms)),
            fps: FpsCounter::new(Instant::now()),
            recording: None,
            frames_processed: 0,
            frames_skipped: 0,
            config,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn displayed_labels(&self) -> Vec<HandLabel> {
        self.smoother.displayed_labels()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recording_progress(&self) -> Option<f64> {
        self.recording.map(|_| self.buffer.progress())
    }

    /// Time left before an active take starts buffering frames.
    pub fn countdown_remaining(&self, now: Instant) -> Option<Duration> {
        self.recording
            .map(|r| r.capture_from.saturating_duration_since(now))
    }

    /// Apply one detector observation. `None` when the frame was throttled.
    pub fn ingest(&mut self, observation: HandObservation, now: Instant) -> Option<SessionUpdate> {
        if !self.throttle.ready(now) {
            self.frames_skipped += 1;
            trace!("frame throttled");
            return None;
        }

        let meta = FrameMeta {
            processing_time_ms: observation.processing_time_ms,
            fps: self.fps.tick(now),
            timestamp: Utc::now(),
        };
        let left = observation.left.as_deref();
        let right = observation.right.as_deref();

        let result = self.builder.build(left, right, meta);
        let smoothing = self.smoother.observe_frame(&result);

        if self.recording.is_some_and(|r| now >= r.capture_from) {
            // Hands that failed classification are zero-padded, never stored as coordinates
            let left = left.filter(|hand| self.builder.is_valid_hand(hand));
            let right = right.filter(|hand| self.builder.is_valid_hand(hand));
            if left.is_some() || right.is_some() {
                self.buffer.add_frame(left, right);
            }
        }
        self.frames_processed += 1;

        debug!(
            frame = self.frames_processed,
            detections = result.detection_count(),
            primary = result.primary_label().map(|l| l.as_str()).unwrap_or("-"),
            fps = meta.fps,
            "frame processed"
        );

        Some(SessionUpdate {
            displayed_labels: self.smoother.displayed_labels(),
            recording_progress: self.recording_progress(),
            smoothing,
            result,
        })
    }

    /// Begin a take at `now`; anything left from an earlier take is dropped.
    /// Frames are buffered once the configured countdown has run out.
    pub fn start_recording(&mut self, now: Instant) {
        self.buffer.clear();
        let countdown = Duration::from_millis(self.config.recording_countdown_ms);
        let started = Local::now();
        self.recording = Some(Recording {
            started,
            capture_from: now + countdown,
        });
        info!(
            session = %self.id,
            started = %started.format("%H:%M:%S"),
            countdown_ms = self.config.recording_countdown_ms,
            "recording started"
        );
    }

    /// Finish the take and return the flattened sequence. Fails with
    /// `InsufficientData` if the window never filled. The buffer is cleared either way.
    pub fn stop_recording(&mut self) -> Result<Vec<f32>> {
        let started = self.recording.take().map(|r| r.started);
        let outcome = self.buffer.get_preprocessed_sequence();
        match &outcome {
            Ok(sequence) => info!(values = sequence.len(), "sequence captured"),
            Err(e) => warn!(
                error = %e,
                seconds = started.map(|s| (Local::now() - s).num_seconds()).unwrap_or(0),
                "recording too short"
            ),
        }
        self.buffer.clear();
        outcome
    }

    /// Tear down session state so nothing leaks into the next one.
    pub fn end(&mut self) {
        self.recording = None;
        self.buffer.clear();
        self.smoother.reset();
        info!(
            session = %self.id,
            processed = self.frames_processed,
            skipped = self.frames_skipped,
            "session ended"
        );
    }
}

/// Pull observations from `source` on a blocking task and apply them to
/// `controller` from a single consumer. `frame_interval` paces the source the
/// way a camera would deliver frames.
pub async fn run_pipeline<S, F>(
    mut source: S,
    mut controller: SessionController,
    frame_interval: Option<Duration>,
    mut on_update: F,
) -> Result<SessionController>
where
    S: LandmarkSource + Send + 'static,
    F: FnMut(&mut SessionController, &SessionUpdate),
{
    let (tx, mut rx) = mpsc::channel::<HandObservation>(controller.config.channel_capacity);

    let producer = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut sent = 0;
        while let Some(observation) = source.next_hands()? {
            if tx.blocking_send(observation).is_err() {
                break;
            }
            sent += 1;
            if let Some(interval) = frame_interval {
                std::thread::sleep(interval);
            }
        }
        Ok(sent)
    });

    while let Some(observation) = rx.recv().await {
        if let Some(update) = controller.ingest(observation, Instant::now()) {
            on_update(&mut controller, &update);
        }
    }

    let sent = producer
        .await
        .map_err(|e| TrackerError::Pipeline(e.to_string()))??;
    debug!(sent, processed = controller.frames_processed, "source drained");

    Ok(controller)
}
