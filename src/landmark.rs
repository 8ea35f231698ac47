// src/landmark.rs - Hand landmark layout, detector output decoding and holistic projection
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Normalized landmark: x/y in [0,1] of the detector frame, z is depth relative to the wrist.
pub type Landmark = Vector3<f64>;

pub const HAND_LANDMARK_COUNT: usize = 21;
/// Raw detector output per hand: 21 points × (x, y, z).
pub const FLAT_HAND_LEN: usize = HAND_LANDMARK_COUNT * 3;

// MediaPipe hand landmark indices
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Bones drawn by overlay consumers, including the three palm edges.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// True when the slice is a complete hand skeleton.
pub fn is_complete_hand(hand: &[Landmark]) -> bool {
    hand.len() == HAND_LANDMARK_COUNT
}

/// Decode a raw detector tensor (x, y, z triples) into landmarks.
///
/// At most 63 values are read; a trailing partial triple is completed with zeros.
pub fn parse_from_flat_output(output: &[f32]) -> Vec<Landmark> {
    let len = output.len().min(FLAT_HAND_LEN);
    (0..len)
        .step_by(3)
        .map(|i| {
            let at = |j: usize| if j < len { output[j] as f64 } else { 0.0 };
            Landmark::new(at(i), at(i + 1), at(i + 2))
        })
        .collect()
}

/// Inverse of [`parse_from_flat_output`]: x, y, z of every landmark in order.
pub fn flatten_landmarks(landmarks: &[Landmark]) -> Vec<f32> {
    landmarks
        .iter()
        .flat_map(|lm| [lm.x as f32, lm.y as f32, lm.z as f32])
        .collect()
}

// ── Screen mapping ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_viewport(width: f64, height: f64) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }
}

/// Map a normalized landmark to viewport pixels for a front-facing camera.
///
/// The sensor is landscape, so portrait viewports rotate the frame by 90°.
pub fn to_screen(landmark: &Landmark, width: f64, height: f64, orientation: Orientation) -> (f64, f64) {
    match orientation {
        Orientation::Portrait => ((1.0 - landmark.y) * width, landmark.x * height),
        Orientation::Landscape => ((1.0 - landmark.x) * width, landmark.y * height),
    }
}

// ── Holistic layout ────────────────────────────────────────

pub const FACE_LANDMARK_COUNT: usize = 468;
pub const POSE_LANDMARK_COUNT: usize = 33;
/// face + pose + left hand + right hand
pub const HOLISTIC_LANDMARK_COUNT: usize =
    FACE_LANDMARK_COUNT + POSE_LANDMARK_COUNT + 2 * HAND_LANDMARK_COUNT;

const IMPORTANT_FACE_LANDMARKS: [usize; 13] = [0, 9, 11, 13, 14, 17, 117, 118, 119, 199, 346, 347, 348];
const IMPORTANT_TAIL_START: usize = FACE_LANDMARK_COUNT;
const IMPORTANT_TAIL_LEN: usize = 75;

/// Holistic indices fed to the sequence model, in model-input order.
/// 13 face points then the 75 indices from 468 on (pose and both hands).
pub static IMPORTANT_LANDMARKS: Lazy<Vec<usize>> = Lazy::new(|| {
    IMPORTANT_FACE_LANDMARKS
        .iter()
        .copied()
        .chain(IMPORTANT_TAIL_START..IMPORTANT_TAIL_START + IMPORTANT_TAIL_LEN)
        .collect()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolisticLandmarks {
    pub face: Vec<Landmark>,
    pub pose: Vec<Landmark>,
    pub left_hand: Vec<Landmark>,
    pub right_hand: Vec<Landmark>,
}

impl HolisticLandmarks {
    /// All 543 points in face, pose, left, right order. A missing or short
    /// part is zero-padded so every index keeps its meaning.
    pub fn dense(&self) -> Vec<Landmark> {
        let mut out = Vec::with_capacity(HOLISTIC_LANDMARK_COUNT);
        for (part, count) in [
            (&self.face, FACE_LANDMARK_COUNT),
            (&self.pose, POSE_LANDMARK_COUNT),
            (&self.left_hand, HAND_LANDMARK_COUNT),
            (&self.right_hand, HAND_LANDMARK_COUNT),
        ] {
            out.extend(part.iter().take(count).copied());
            out.extend(std::iter::repeat(Landmark::zeros()).take(count.saturating_sub(part.len())));
        }
        out
    }
}

/// Pick the [`IMPORTANT_LANDMARKS`] out of a dense holistic frame.
/// Indices past the end of `all` come back as zero vectors.
pub fn project_important(all: &[Landmark]) -> Vec<Landmark> {
    IMPORTANT_LANDMARKS
        .iter()
        .map(|&i| all.get(i).copied().unwrap_or_else(Landmark::zeros))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hand() -> Vec<Landmark> {
        (0..HAND_LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f64 * 0.03, 1.0 - i as f64 * 0.02, -(i as f64) * 0.005))
            .collect()
    }

    #[test]
    fn test_flat_round_trip() {
        let hand = sample_hand();
        let flat = flatten_landmarks(&hand);
        assert_eq!(flat.len(), FLAT_HAND_LEN);

        let parsed = parse_from_flat_output(&flat);
        assert_eq!(parsed.len(), HAND_LANDMARK_COUNT);
        for (a, b) in hand.iter().zip(parsed.iter()) {
            assert!((a - b).norm() < 1e-6, "expected {:?}, got {:?}", a, b);
        }
    }

    #[test]
    fn test_parse_pads_partial_triple_and_truncates() {
        let parsed = parse_from_flat_output(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].y, 0.0);
        assert_eq!(parsed[1].z, 0.0);
        assert!((parsed[1].x - 0.4).abs() < 1e-6);

        let long = vec![0.5_f32; 70];
        assert_eq!(parse_from_flat_output(&long).len(), HAND_LANDMARK_COUNT);
        assert!(parse_from_flat_output(&[]).is_empty());
    }

    #[test]
    fn test_important_landmarks_layout() {
        assert_eq!(IMPORTANT_LANDMARKS.len(), 88);
        assert_eq!(&IMPORTANT_LANDMARKS[..13], &IMPORTANT_FACE_LANDMARKS);
        assert_eq!(IMPORTANT_LANDMARKS[13], 468);
        assert_eq!(IMPORTANT_LANDMARKS[87], 542);
    }

    #[test]
    fn test_dense_pads_missing_parts() {
        let holistic = HolisticLandmarks {
            face: vec![Landmark::new(0.1, 0.1, 0.0); FACE_LANDMARK_COUNT],
            pose: Vec::new(),
            left_hand: Vec::new(),
            right_hand: vec![Landmark::new(0.9, 0.9, 0.0); HAND_LANDMARK_COUNT],
        };
        let dense = holistic.dense();
        assert_eq!(dense.len(), HOLISTIC_LANDMARK_COUNT);
        assert_eq!(dense[FACE_LANDMARK_COUNT], Landmark::zeros());
        assert_eq!(dense[HOLISTIC_LANDMARK_COUNT - 1], Landmark::new(0.9, 0.9, 0.0));

        let projected = project_important(&dense);
        assert_eq!(projected.len(), 88);
        assert_eq!(projected[0], Landmark::new(0.1, 0.1, 0.0));
        assert_eq!(projected[87], Landmark::new(0.9, 0.9, 0.0));
    }

    #[test]
    fn test_to_screen_orientations() {
        let lm = Landmark::new(0.25, 0.75, 0.0);
        assert_eq!(Orientation::from_viewport(400.0, 800.0), Orientation::Portrait);
        assert_eq!(Orientation::from_viewport(800.0, 400.0), Orientation::Landscape);

        let (x, y) = to_screen(&lm, 400.0, 800.0, Orientation::Portrait);
        assert!((x - 100.0).abs() < 1e-9 && (y - 200.0).abs() < 1e-9);

        let (x, y) = to_screen(&lm, 800.0, 400.0, Orientation::Landscape);
        assert!((x - 600.0).abs() < 1e-9 && (y - 300.0).abs() < 1e-9);
    }
}
