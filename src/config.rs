// src/config.rs - Tracker configuration with JSON overrides
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Whether hands go through the wrist-to-middle-tip span check before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresencePolicy {
    Validated,
    Unvalidated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive identical frame labels required before a label is shown.
    pub smoothing_window: usize,
    /// Frames per captured sequence.
    pub sequence_length: usize,
    pub presence_policy: PresencePolicy,
    /// Minimum wrist-to-middle-tip distance (normalized units) for a real hand.
    pub min_hand_span: f64,
    /// Frames arriving sooner than this after the last processed one are skipped.
    pub min_processing_interval_ms: u64,
    /// Delay between starting a recording and buffering its first frame.
    pub recording_countdown_ms: u64,
    /// Observations buffered between the source task and the session consumer.
    pub channel_capacity: usize,
    pub output_directory: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 4,
            sequence_length: 30,
            presence_policy: PresencePolicy::Validated,
            min_hand_span: 0.06,
            min_processing_interval_ms: 100,
            recording_countdown_ms: 3000,
            channel_capacity: 8,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("AslTracker")))
                .unwrap_or_else(|| PathBuf::from("./output")),
        }
    }
}

impl TrackerConfig {
    /// Read a JSON config; fields left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 {
            return Err(TrackerError::Config("smoothing_window must be at least 1".into()));
        }
        if self.sequence_length == 0 {
            return Err(TrackerError::Config("sequence_length must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(TrackerError::Config("channel_capacity must be at least 1".into()));
        }
        if !self.min_hand_span.is_finite() || self.min_hand_span < 0.0 {
            return Err(TrackerError::Config(format!(
                "min_hand_span must be a non-negative number, got {}",
                self.min_hand_span
            )));
        }
        Ok(())
    }
}
