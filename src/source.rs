// src/source.rs - Landmark sources: recorded replays, raw detector tensors and synthetic poses
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::landmark::*;

/// Hands reported by the detector for one camera frame. An absent hand is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandObservation {
    pub left: Option<Vec<Landmark>>,
    pub right: Option<Vec<Landmark>>,
    /// Detector time for this frame, reported through to the frame result.
    pub processing_time_ms: f64,
}

impl HandObservation {
    pub fn right_only(hand: Vec<Landmark>) -> Self {
        Self {
            right: Some(hand),
            ..Default::default()
        }
    }

    pub fn has_hand(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}

/// Anything that can hand over the next frame's landmarks.
///
/// `Ok(None)` means the source is exhausted; a frame without hands is an
/// observation with both sides empty.
pub trait LandmarkSource {
    fn next_hands(&mut self) -> Result<Option<HandObservation>>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn next_hands(&mut self) -> Result<Option<HandObservation>> {
        (**self).next_hands()
    }
}

// ── Replay ─────────────────────────────────────────────────

/// Reads a JSON-lines recording, one [`HandObservation`] per line.
pub struct ReplaySource<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for ReplaySource<R> {
    fn next_hands(&mut self) -> Result<Option<HandObservation>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let observation = serde_json::from_str(&line).map_err(|source| TrackerError::Replay {
                line: self.line_no,
                source,
            })?;
            return Ok(Some(observation));
        }
        Ok(None)
    }
}

// ── Raw detector tensors ───────────────────────────────────

/// Per-frame raw detector output, 63 floats per present hand.
#[derive(Debug, Clone, Default)]
pub struct FlatHands {
    pub left: Option<Vec<f32>>,
    pub right: Option<Vec<f32>>,
    pub processing_time_ms: f64,
}

/// Adapts a stream of flat tensors into structured landmarks.
pub struct FlatOutputSource<I> {
    frames: I,
}

impl<I: Iterator<Item = FlatHands>> FlatOutputSource<I> {
    pub fn new(frames: impl IntoIterator<IntoIter = I, Item = FlatHands>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I: Iterator<Item = FlatHands>> LandmarkSource for FlatOutputSource<I> {
    fn next_hands(&mut self) -> Result<Option<HandObservation>> {
        Ok(self.frames.next().map(|raw| HandObservation {
            left: raw.left.as_deref().map(parse_from_flat_output),
            right: raw.right.as_deref().map(parse_from_flat_output),
            processing_time_ms: raw.processing_time_ms,
        }))
    }
}

// ── Synthetic poses ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticPose {
    Fist,
    FlatHand,
    PointUp,
    PointSide,
    OkSign,
    CShape,
    Claw,
    /// Thumb and the outer three fingers up, index folded: no letter matches.
    ThreeUp,
}

const WRIST_POS: (f64, f64) = (0.5, 0.8);
const FINGER_X: [f64; 4] = [0.45, 0.50, 0.55, 0.60];

fn set_finger(hand: &mut [Landmark], mcp: usize, x: f64, extended: bool) {
    let ys = if extended {
        [0.65, 0.55, 0.50, 0.45]
    } else {
        [0.65, 0.58, 0.63, 0.66]
    };
    for (offset, y) in ys.iter().enumerate() {
        hand[mcp + offset] = Landmark::new(x, *y, 0.0);
    }
}

fn set_thumb(hand: &mut [Landmark], extended: bool) {
    let points = if extended {
        [(0.44, 0.75), (0.40, 0.68), (0.37, 0.62), (0.35, 0.56)]
    } else {
        [(0.44, 0.75), (0.42, 0.68), (0.45, 0.70), (0.48, 0.72)]
    };
    for (offset, (x, y)) in points.iter().enumerate() {
        hand[THUMB_CMC + offset] = Landmark::new(*x, *y, 0.0);
    }
}

/// Right-hand skeleton with the thumb and index..pinky extended or folded.
fn hand_with(thumb: bool, fingers: [bool; 4]) -> Vec<Landmark> {
    let mut hand = vec![Landmark::zeros(); HAND_LANDMARK_COUNT];
    hand[WRIST] = Landmark::new(WRIST_POS.0, WRIST_POS.1, 0.0);
    set_thumb(&mut hand, thumb);
    for (i, extended) in fingers.iter().enumerate() {
        set_finger(&mut hand, INDEX_MCP + 4 * i, FINGER_X[i], *extended);
    }
    hand
}

pub fn synthetic_hand(pose: SyntheticPose) -> Vec<Landmark> {
    match pose {
        SyntheticPose::Fist => hand_with(false, [false; 4]),
        SyntheticPose::FlatHand => hand_with(true, [true; 4]),
        SyntheticPose::PointUp => hand_with(false, [true, false, false, false]),
        SyntheticPose::PointSide => {
            let mut hand = hand_with(false, [true, false, false, false]);
            hand[INDEX_PIP] = Landmark::new(0.35, 0.62, 0.0);
            hand[INDEX_DIP] = Landmark::new(0.30, 0.62, 0.0);
            hand[INDEX_TIP] = Landmark::new(0.25, 0.62, 0.0);
            hand
        }
        SyntheticPose::OkSign => {
            let mut hand = hand_with(true, [false, true, true, true]);
            hand[THUMB_TIP] = Landmark::new(0.46, 0.64, 0.0);
            hand
        }
        SyntheticPose::CShape => hand_with(true, [true, true, false, false]),
        SyntheticPose::Claw => hand_with(true, [false; 4]),
        SyntheticPose::ThreeUp => hand_with(true, [false, true, true, true]),
    }
}

/// Plays a fixed script of poses on the right hand; `None` entries are empty frames.
pub struct SyntheticSource {
    script: Vec<Option<SyntheticPose>>,
    hold_frames: usize,
    frame: usize,
}

impl SyntheticSource {
    pub fn new(script: Vec<Option<SyntheticPose>>, hold_frames: usize) -> Self {
        Self {
            script,
            hold_frames: hold_frames.max(1),
            frame: 0,
        }
    }

    /// Spells out a short A, B, D, G, F, C, E run with empty frames between letters.
    pub fn demo(hold_frames: usize) -> Self {
        use SyntheticPose::*;
        let letters = [Fist, FlatHand, PointUp, PointSide, OkSign, CShape, Claw];
        let script = letters
            .iter()
            .flat_map(|pose| [Some(*pose), None])
            .collect();
        Self::new(script, hold_frames)
    }

    pub fn total_frames(&self) -> usize {
        self.script.len() * self.hold_frames
    }
}

impl LandmarkSource for SyntheticSource {
    fn next_hands(&mut self) -> Result<Option<HandObservation>> {
        let Some(step) = self.script.get(self.frame / self.hold_frames) else {
            return Ok(None);
        };
        self.frame += 1;
        Ok(Some(match step {
            Some(pose) => HandObservation {
                right: Some(synthetic_hand(*pose)),
                processing_time_ms: 5.0,
                ..Default::default()
            },
            None => HandObservation::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify_letter, AslLetter};
    use std::io::Cursor;

    #[test]
    fn test_synthetic_poses_classify() {
        use SyntheticPose::*;
        let expected = [
            (Fist, Some(AslLetter::A)),
            (FlatHand, Some(AslLetter::B)),
            (PointUp, Some(AslLetter::D)),
            (PointSide, Some(AslLetter::G)),
            (OkSign, Some(AslLetter::F)),
            (CShape, Some(AslLetter::C)),
            (Claw, Some(AslLetter::E)),
            (ThreeUp, None),
        ];
        for (pose, letter) in expected {
            assert_eq!(classify_letter(&synthetic_hand(pose)), letter, "pose {:?}", pose);
        }
    }

    #[test]
    fn test_replay_skips_blank_lines_and_reports_line() {
        let hand = synthetic_hand(SyntheticPose::Fist);
        let first = serde_json::to_string(&HandObservation::right_only(hand.clone())).unwrap();
        let text = format!("{first}\n\n{{}}\nnot json\n");
        let mut source = ReplaySource::from_reader(Cursor::new(text));

        let obs = source.next_hands().unwrap().unwrap();
        let right = obs.right.expect("right hand replayed");
        assert_eq!(right.len(), hand.len());
        for (a, b) in right.iter().zip(hand.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
        assert_eq!(obs.left, None);

        let empty = source.next_hands().unwrap().unwrap();
        assert!(!empty.has_hand());

        match source.next_hands() {
            Err(TrackerError::Replay { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected replay error, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_source_decodes() {
        let hand = synthetic_hand(SyntheticPose::FlatHand);
        let mut source = FlatOutputSource::new(vec![FlatHands {
            left: Some(flatten_landmarks(&hand)),
            right: None,
            processing_time_ms: 3.0,
        }]);

        let obs = source.next_hands().unwrap().unwrap();
        assert_eq!(obs.left.as_ref().map(Vec::len), Some(HAND_LANDMARK_COUNT));
        assert!(obs.right.is_none());
        assert!(source.next_hands().unwrap().is_none());
    }

    #[test]
    fn test_synthetic_source_holds_and_ends() {
        let mut source = SyntheticSource::new(vec![Some(SyntheticPose::Fist), None], 2);
        assert_eq!(source.total_frames(), 4);
        assert!(source.next_hands().unwrap().unwrap().has_hand());
        assert!(source.next_hands().unwrap().unwrap().has_hand());
        assert!(!source.next_hands().unwrap().unwrap().has_hand());
        assert!(!source.next_hands().unwrap().unwrap().has_hand());
        assert!(source.next_hands().unwrap().is_none());
    }
}
