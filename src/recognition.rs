// src/recognition.rs - Per-frame recognition results built from one or two hands
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::{classify_hand, HandLabel};
use crate::config::{PresencePolicy, TrackerConfig};
use crate::geometry::hand_span;
use crate::landmark::{Handedness, Landmark};

/// The classifiers do not estimate per-pose confidence; these are fixed.
pub const PLACEHOLDER_SCORE: f64 = 0.85;
pub const PLACEHOLDER_HANDEDNESS_SCORE: f64 = 0.9;

#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    pub id: u32,
    pub label: HandLabel,
    pub score: f64,
    pub handedness: Handedness,
    pub handedness_score: f64,
    pub landmarks: Vec<Landmark>,
}

/// Frame timing handed in by the caller; the builder never measures time itself.
#[derive(Debug, Clone, Copy)]
pub struct FrameMeta {
    pub processing_time_ms: f64,
    pub fps: f64,
    pub timestamp: DateTime<Utc>,
}

impl FrameMeta {
    pub fn now(processing_time_ms: f64, fps: f64) -> Self {
        Self {
            processing_time_ms,
            fps,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceRating {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl PerformanceRating {
    pub fn from_fps(fps: f64) -> Self {
        if fps >= 25.0 {
            Self::Excellent
        } else if fps >= 20.0 {
            Self::VeryGood
        } else if fps >= 15.0 {
            Self::Good
        } else if fps >= 10.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Everything the display layer reads for one processed frame.
///
/// `recognitions` holds at most one left and one right entry. The raw hand
/// landmarks are kept for overlays even when a hand was not classified.
#[derive(Debug, Clone, Serialize)]
pub struct FrameResult {
    pub recognitions: Vec<Recognition>,
    pub processing_time_ms: f64,
    pub fps: f64,
    pub timestamp: DateTime<Utc>,
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    pub right_hand_landmarks: Option<Vec<Landmark>>,
}

impl FrameResult {
    /// Label of the first recognition, the one the smoother follows.
    pub fn primary_label(&self) -> Option<HandLabel> {
        self.recognitions.first().map(|r| r.label)
    }

    pub fn has_detections(&self) -> bool {
        !self.recognitions.is_empty()
    }

    pub fn detection_count(&self) -> usize {
        self.recognitions.len()
    }

    pub fn average_confidence(&self) -> f64 {
        if self.recognitions.is_empty() {
            return 0.0;
        }
        self.recognitions.iter().map(|r| r.score).sum::<f64>() / self.recognitions.len() as f64
    }

    pub fn max_confidence(&self) -> f64 {
        self.recognitions
            .iter()
            .map(|r| r.score)
            .fold(0.0, f64::max)
    }

    pub fn performance_rating(&self) -> PerformanceRating {
        PerformanceRating::from_fps(self.fps)
    }

    pub fn summary(&self) -> String {
        format!(
            "Detections: {} | FPS: {:.1} | Processing: {}ms | Performance: {}",
            self.detection_count(),
            self.fps,
            self.processing_time_ms,
            self.performance_rating().as_str()
        )
    }

    pub fn recognition(&self, handedness: Handedness) -> Option<&Recognition> {
        self.recognitions.iter().find(|r| r.handedness == handedness)
    }
}

pub struct RecognitionBuilder {
    policy: PresencePolicy,
    min_hand_span: f64,
}

impl Default for RecognitionBuilder {
    fn default() -> Self {
        Self::new(PresencePolicy::Validated, 0.06)
    }
}

impl RecognitionBuilder {
    pub fn new(policy: PresencePolicy, min_hand_span: f64) -> Self {
        Self { policy, min_hand_span }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.presence_policy, config.min_hand_span)
    }

    pub fn policy(&self) -> PresencePolicy {
        self.policy
    }

    /// A hand is classifiable when it has 21 points and, under the validated
    /// policy, spans at least `min_hand_span` from wrist to middle tip. The
    /// detector emits plausible coordinates on empty frames; this filters them.
    pub fn is_valid_hand(&self, hand: &[Landmark]) -> bool {
        match (self.policy, hand_span(hand)) {
            (_, None) => false,
            (PresencePolicy::Unvalidated, Some(_)) => true,
            (PresencePolicy::Validated, Some(span)) => span >= self.min_hand_span,
        }
    }

    pub fn build(
        &self,
        left: Option<&[Landmark]>,
        right: Option<&[Landmark]>,
        meta: FrameMeta,
    ) -> FrameResult {
        let mut recognitions = Vec::with_capacity(2);
        let mut next_id = 0;

        for (hand, handedness) in [(left, Handedness::Left), (right, Handedness::Right)] {
            let Some(hand) = hand else { continue };
            if !self.is_valid_hand(hand) {
                tracing::debug!(
                    hand = handedness.as_str(),
                    points = hand.len(),
                    "hand skipped by presence check"
                );
                continue;
            }

            recognitions.push(Recognition {
                id: next_id,
                label: classify_hand(hand),
                score: PLACEHOLDER_SCORE,
                handedness,
                handedness_score: PLACEHOLDER_HANDEDNESS_SCORE,
                landmarks: hand.to_vec(),
            });
            next_id += 1;
        }

        FrameResult {
            recognitions,
            processing_time_ms: meta.processing_time_ms,
            fps: meta.fps,
            timestamp: meta.timestamp,
            left_hand_landmarks: left.map(<[Landmark]>::to_vec),
            right_hand_landmarks: right.map(<[Landmark]>::to_vec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_scores(scores: &[f64], fps: f64) -> FrameResult {
        FrameResult {
            recognitions: scores
                .iter()
                .enumerate()
                .map(|(i, &score)| Recognition {
                    id: i as u32,
                    label: HandLabel::Unknown,
                    score,
                    handedness: if i == 0 { Handedness::Left } else { Handedness::Right },
                    handedness_score: PLACEHOLDER_HANDEDNESS_SCORE,
                    landmarks: Vec::new(),
                })
                .collect(),
            processing_time_ms: 12.0,
            fps,
            timestamp: Utc::now(),
            left_hand_landmarks: None,
            right_hand_landmarks: None,
        }
    }

    #[test]
    fn test_statistics_helpers() {
        let empty = result_with_scores(&[], 9.0);
        assert!(!empty.has_detections());
        assert_eq!(empty.average_confidence(), 0.0);
        assert_eq!(empty.max_confidence(), 0.0);
        assert_eq!(empty.performance_rating(), PerformanceRating::Poor);

        let two = result_with_scores(&[0.6, 0.8], 21.0);
        assert_eq!(two.detection_count(), 2);
        assert!((two.average_confidence() - 0.7).abs() < 1e-12);
        assert!((two.max_confidence() - 0.8).abs() < 1e-12);
        assert_eq!(
            two.summary(),
            "Detections: 2 | FPS: 21.0 | Processing: 12ms | Performance: Very Good"
        );
    }

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(PerformanceRating::from_fps(25.0), PerformanceRating::Excellent);
        assert_eq!(PerformanceRating::from_fps(24.9), PerformanceRating::VeryGood);
        assert_eq!(PerformanceRating::from_fps(15.0), PerformanceRating::Good);
        assert_eq!(PerformanceRating::from_fps(10.0), PerformanceRating::Fair);
        assert_eq!(PerformanceRating::from_fps(0.0), PerformanceRating::Poor);
    }
}
