// src/geometry.rs - Distance and finger-pose predicates over hand landmarks
use crate::landmark::*;

/// Tolerance added to the PIP y-coordinate when testing extension, absorbs landmark jitter.
pub const EXTENSION_TOLERANCE: f64 = 0.02;
/// Fingertips closer than this are considered touching.
pub const TOUCH_THRESHOLD: f64 = 0.10;

pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    (a - b).norm()
}

pub fn squared_distance(a: &Landmark, b: &Landmark) -> f64 {
    (a - b).norm_squared()
}

/// Tip above its PIP joint in screen space (smaller y is higher in the frame).
///
/// Caller guarantees `hand` holds a full 21-point skeleton.
pub fn is_extended(hand: &[Landmark], tip: usize, pip: usize, tolerance: f64) -> bool {
    hand[tip].y < hand[pip].y + tolerance
}

/// The thumb bends along a different axis, so its tip is compared against the MCP (index 2).
pub fn is_thumb_extended(hand: &[Landmark], tolerance: f64) -> bool {
    is_extended(hand, THUMB_TIP, THUMB_MCP, tolerance)
}

pub fn is_touching(a: &Landmark, b: &Landmark, threshold: f64) -> bool {
    distance(a, b) < threshold
}

/// Extension state of the five fingers, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerFlags {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerFlags {
    pub fn measure(hand: &[Landmark], tolerance: f64) -> Self {
        Self {
            thumb: is_thumb_extended(hand, tolerance),
            index: is_extended(hand, INDEX_TIP, INDEX_PIP, tolerance),
            middle: is_extended(hand, MIDDLE_TIP, MIDDLE_PIP, tolerance),
            ring: is_extended(hand, RING_TIP, RING_PIP, tolerance),
            pinky: is_extended(hand, PINKY_TIP, PINKY_PIP, tolerance),
        }
    }

    pub fn extended_count(&self) -> usize {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|&&f| f)
            .count()
    }

    /// Index, middle, ring and pinky all extended.
    pub fn four_extended(&self) -> bool {
        self.index && self.middle && self.ring && self.pinky
    }

    /// Index, middle, ring and pinky all curled.
    pub fn four_curled(&self) -> bool {
        !self.index && !self.middle && !self.ring && !self.pinky
    }
}

/// Everything the rule cascades look at, measured once per hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFeatures {
    pub fingers: FingerFlags,
    pub extended_count: usize,
    pub thumb_to_index: f64,
    pub thumb_to_pinky: f64,
    /// |index tip − wrist| along x
    pub index_dx: f64,
    /// |index tip − wrist| along y
    pub index_dy: f64,
    /// Every non-thumb tip strictly below its PIP joint.
    pub tips_below_pips: bool,
}

impl HandFeatures {
    /// `None` unless `hand` is a complete 21-point skeleton.
    pub fn measure(hand: &[Landmark], tolerance: f64) -> Option<Self> {
        if hand.len() != HAND_LANDMARK_COUNT {
            return None;
        }

        let fingers = FingerFlags::measure(hand, tolerance);
        let tips_below_pips = [
            (INDEX_TIP, INDEX_PIP),
            (MIDDLE_TIP, MIDDLE_PIP),
            (RING_TIP, RING_PIP),
            (PINKY_TIP, PINKY_PIP),
        ]
        .iter()
        .all(|&(tip, pip)| hand[tip].y > hand[pip].y);

        Some(Self {
            fingers,
            extended_count: fingers.extended_count(),
            thumb_to_index: distance(&hand[THUMB_TIP], &hand[INDEX_TIP]),
            thumb_to_pinky: distance(&hand[THUMB_TIP], &hand[PINKY_TIP]),
            index_dx: (hand[INDEX_TIP].x - hand[WRIST].x).abs(),
            index_dy: (hand[INDEX_TIP].y - hand[WRIST].y).abs(),
            tips_below_pips,
        })
    }
}

/// Wrist to middle fingertip, the span used to reject detector output with no real hand behind it.
pub fn hand_span(hand: &[Landmark]) -> Option<f64> {
    (hand.len() == HAND_LANDMARK_COUNT).then(|| distance(&hand[WRIST], &hand[MIDDLE_TIP]))
}
