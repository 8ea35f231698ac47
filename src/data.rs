// src/data.rs - Session export: per-frame recognition log, captured sequences and a summary
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use csv::Writer;
use serde::Serialize;
use uuid::Uuid;

use crate::classifier::HandLabel;
use crate::error::Result;
use crate::landmark::{Handedness, WRIST};
use crate::recognition::{FrameResult, Recognition};
use crate::session::SessionUpdate;

#[derive(Debug, Serialize)]
struct RecognitionRecord {
    frame: usize,
    timestamp: String,
    detections: usize,
    fps: f64,
    processing_time_ms: f64,

    left_label: Option<String>,
    left_wrist_x: Option<f64>,
    left_wrist_y: Option<f64>,
    left_wrist_z: Option<f64>,

    right_label: Option<String>,
    right_wrist_x: Option<f64>,
    right_wrist_y: Option<f64>,
    right_wrist_z: Option<f64>,

    displayed_label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapturedSequence {
    pub captured_at: DateTime<Utc>,
    pub frames: usize,
    pub values: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_name: String,
    pub session_id: Option<Uuid>,
    pub total_frames: usize,
    pub frames_with_detections: usize,
    pub detection_rate: f64,
    /// Frames on which each label was the confirmed, displayed one.
    pub confirmed_label_frames: BTreeMap<String, usize>,
    pub sequences_captured: usize,
}

#[derive(Debug, Serialize)]
struct FrameRow {
    #[serde(flatten)]
    result: FrameResult,
    displayed: Option<HandLabel>,
}

pub struct DataExporter {
    output_dir: PathBuf,
    session_name: String,
    session_id: Option<Uuid>,
    rows: Vec<FrameRow>,
    sequences: Vec<CapturedSequence>,
}

impl DataExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            session_id: None,
            rows: Vec::new(),
            sequences: Vec::new(),
        }
    }

    /// Tag exported files with the capture session they came from.
    pub fn with_session_id(mut self, id: Uuid) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn frame_count(&self) -> usize {
        self.rows.len()
    }

    pub fn add_update(&mut self, update: &SessionUpdate) {
        self.rows.push(FrameRow {
            result: update.result.clone(),
            displayed: update.displayed_labels.first().copied(),
        });
    }

    pub fn add_sequence(&mut self, values: Vec<f32>, frames: usize) {
        self.sequences.push(CapturedSequence {
            captured_at: Utc::now(),
            frames,
            values,
        });
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("recognitions.csv");
        std::fs::create_dir_all(self.session_dir())?;

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for (i, row) in self.rows.iter().enumerate() {
            writer.serialize(Self::create_record(i, row))?;
        }
        writer.flush()?;

        Ok(csv_path)
    }

    fn create_record(frame: usize, row: &FrameRow) -> RecognitionRecord {
        let result = &row.result;
        let left = result.recognition(Handedness::Left);
        let right = result.recognition(Handedness::Right);
        let label = |hand: Option<&Recognition>| hand.map(|r| r.label.to_string());
        let wrist = |hand: Option<&Recognition>, axis: usize| hand.map(|r| r.landmarks[WRIST][axis]);

        RecognitionRecord {
            frame,
            timestamp: result.timestamp.to_rfc3339(),
            detections: result.detection_count(),
            fps: result.fps,
            processing_time_ms: result.processing_time_ms,
            left_label: label(left),
            left_wrist_x: wrist(left, 0),
            left_wrist_y: wrist(left, 1),
            left_wrist_z: wrist(left, 2),
            right_label: label(right),
            right_wrist_x: wrist(right, 0),
            right_wrist_y: wrist(right, 1),
            right_wrist_z: wrist(right, 2),
            displayed_label: row.displayed.map(|l| l.to_string()),
        }
    }

    /// Full frame results, one JSON object per line, for offline inspection.
    pub fn export_frames(&self) -> Result<PathBuf> {
        let path = self.session_dir().join("frames.jsonl");
        std::fs::create_dir_all(self.session_dir())?;
        let mut writer = BufWriter::new(File::create(&path)?);
        for row in &self.rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn export_sequences(&self) -> Result<PathBuf> {
        let path = self.session_dir().join("sequences.json");
        std::fs::create_dir_all(self.session_dir())?;
        let file = File::create(&path)?;
        serde_json::to_writer(file, &self.sequences)?;
        Ok(path)
    }

    pub fn summary(&self) -> SessionSummary {
        let total_frames = self.rows.len();
        let frames_with_detections = self.rows.iter().filter(|r| r.result.has_detections()).count();

        let mut confirmed_label_frames = BTreeMap::new();
        for label in self.rows.iter().filter_map(|r| r.displayed) {
            *confirmed_label_frames.entry(label.to_string()).or_insert(0) += 1;
        }

        SessionSummary {
            session_name: self.session_name.clone(),
            session_id: self.session_id,
            total_frames,
            frames_with_detections,
            detection_rate: if total_frames == 0 {
                0.0
            } else {
                frames_with_detections as f64 / total_frames as f64
            },
            confirmed_label_frames,
            sequences_captured: self.sequences.len(),
        }
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let path = self.session_dir().join("summary.json");
        std::fs::create_dir_all(self.session_dir())?;
        std::fs::write(&path, serde_json::to_string_pretty(&self.summary())?)?;
        Ok(path)
    }
}
