// src/classifier.rs - Rule-based ASL letter and gesture classification of a single hand
//
// Both classifiers are ordered rule cascades over `HandFeatures`. The order of
// the branches matters: loose poses can satisfy several rules and the first
// match wins.
use std::fmt;

use serde::{Serialize, Serializer};

use crate::geometry::{HandFeatures, EXTENSION_TOLERANCE, TOUCH_THRESHOLD};
use crate::landmark::Landmark;

/// Index tip counts as pointing sideways when dx > dy * this ratio.
const HORIZONTAL_RATIO: f64 = 0.7;
/// Thumb must be at least this far from the index and pinky tips for a C shape.
const C_SHAPE_MIN_GAP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AslLetter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl AslLetter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureType {
    OpenPalm,
    ClosedFist,
    PointingUp,
    Victory,
    ILoveYou,
    ThumbUp,
    CustomGesture,
    Unknown,
}

impl GestureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "Open_Palm",
            Self::ClosedFist => "Closed_Fist",
            Self::PointingUp => "Pointing_Up",
            Self::Victory => "Victory",
            Self::ILoveYou => "ILoveYou",
            Self::ThumbUp => "Thumb_Up",
            Self::CustomGesture => "Custom_Gesture",
            Self::Unknown => "Unknown",
        }
    }
}

/// Final per-hand label: a letter when one matches, else a gesture, else unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLabel {
    Letter(AslLetter),
    Gesture(GestureType),
    Unknown,
}

impl HandLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Letter(letter) => letter.as_str(),
            Self::Gesture(gesture) => gesture.as_str(),
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown | Self::Gesture(GestureType::Unknown))
    }
}

impl fmt::Display for HandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HandLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classify one hand as a letter A–G. `None` when no rule matches or the
/// hand is not a 21-point skeleton.
pub fn classify_letter(hand: &[Landmark]) -> Option<AslLetter> {
    let features = HandFeatures::measure(hand, EXTENSION_TOLERANCE)?;
    letter_from_features(&features)
}

pub fn letter_from_features(f: &HandFeatures) -> Option<AslLetter> {
    let fingers = &f.fingers;

    // Closed fist, thumb tucked
    if f.extended_count == 0 {
        return Some(AslLetter::A);
    }

    // Flat hand, thumb ignored
    if fingers.four_extended() {
        return Some(AslLetter::B);
    }

    // OK sign
    if f.thumb_to_index < TOUCH_THRESHOLD && fingers.middle && fingers.ring && fingers.pinky {
        return Some(AslLetter::F);
    }

    if fingers.index && !fingers.middle && !fingers.ring && !fingers.pinky {
        let horizontal = f.index_dx > f.index_dy * HORIZONTAL_RATIO;
        return Some(if horizontal { AslLetter::G } else { AslLetter::D });
    }

    if (1..=3).contains(&f.extended_count)
        && f.thumb_to_pinky > C_SHAPE_MIN_GAP
        && f.thumb_to_index > C_SHAPE_MIN_GAP
        && !fingers.four_curled()
        && !fingers.four_extended()
    {
        return Some(AslLetter::C);
    }

    // Claw: fingers folded over, thumb out
    if fingers.four_curled() && fingers.thumb && f.tips_below_pips {
        return Some(AslLetter::E);
    }

    None
}

/// Generic gesture fallback. Uses exact tip-vs-PIP comparison (no tolerance).
pub fn classify_gesture(hand: &[Landmark]) -> GestureType {
    match HandFeatures::measure(hand, 0.0) {
        Some(features) => gesture_from_features(&features),
        None => GestureType::Unknown,
    }
}

pub fn gesture_from_features(f: &HandFeatures) -> GestureType {
    let g = &f.fingers;
    match f.extended_count {
        5 => GestureType::OpenPalm,
        0 => GestureType::ClosedFist,
        _ if g.index && !g.middle && !g.ring && !g.pinky => GestureType::PointingUp,
        _ if g.index && g.middle && !g.ring && !g.pinky => GestureType::Victory,
        _ if g.thumb && g.index && g.pinky && !g.middle && !g.ring => GestureType::ILoveYou,
        _ if g.thumb && g.four_curled() => GestureType::ThumbUp,
        _ => GestureType::CustomGesture,
    }
}

/// Letter first, then gesture, then unknown.
pub fn classify_hand(hand: &[Landmark]) -> HandLabel {
    if let Some(letter) = classify_letter(hand) {
        return HandLabel::Letter(letter);
    }
    match classify_gesture(hand) {
        GestureType::Unknown => HandLabel::Unknown,
        gesture => HandLabel::Gesture(gesture),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FingerFlags;

    fn features(fingers: FingerFlags) -> HandFeatures {
        HandFeatures {
            fingers,
            extended_count: fingers.extended_count(),
            thumb_to_index: 0.2,
            thumb_to_pinky: 0.2,
            index_dx: 0.0,
            index_dy: 0.3,
            tips_below_pips: false,
        }
    }

    fn flags(bits: [bool; 5]) -> FingerFlags {
        FingerFlags {
            thumb: bits[0],
            index: bits[1],
            middle: bits[2],
            ring: bits[3],
            pinky: bits[4],
        }
    }

    #[test]
    fn test_letter_cascade_order() {
        assert_eq!(letter_from_features(&features(flags([false; 5]))), Some(AslLetter::A));
        assert_eq!(letter_from_features(&features(flags([true; 5]))), Some(AslLetter::B));
        assert_eq!(
            letter_from_features(&features(flags([false, true, true, true, true]))),
            Some(AslLetter::B)
        );

        let mut f = features(flags([false, false, true, true, true]));
        f.thumb_to_index = 0.05;
        assert_eq!(letter_from_features(&f), Some(AslLetter::F));

        // Same pose with the thumb away from the index tip is a C
        f.thumb_to_index = 0.2;
        assert_eq!(letter_from_features(&f), Some(AslLetter::C));

        // Four extended is too open for C
        let f = features(flags([true, false, true, true, true]));
        assert_eq!(letter_from_features(&f), None);
    }

    #[test]
    fn test_d_versus_g() {
        let mut f = features(flags([false, true, false, false, false]));
        f.index_dx = 0.1;
        f.index_dy = 0.3;
        assert_eq!(letter_from_features(&f), Some(AslLetter::D));

        f.index_dx = 0.3;
        f.index_dy = 0.1;
        assert_eq!(letter_from_features(&f), Some(AslLetter::G));
    }

    #[test]
    fn test_e_needs_tips_below_pips() {
        let mut f = features(flags([true, false, false, false, false]));
        assert_eq!(letter_from_features(&f), None);
        f.tips_below_pips = true;
        assert_eq!(letter_from_features(&f), Some(AslLetter::E));
    }

    #[test]
    fn test_collapsed_hand_is_not_c() {
        let mut f = features(flags([false, true, true, false, false]));
        assert_eq!(letter_from_features(&f), Some(AslLetter::C));
        f.thumb_to_pinky = 0.04;
        assert_eq!(letter_from_features(&f), None);
    }

    #[test]
    fn test_gesture_patterns() {
        let g = |bits| gesture_from_features(&features(flags(bits)));
        assert_eq!(g([true; 5]), GestureType::OpenPalm);
        assert_eq!(g([false; 5]), GestureType::ClosedFist);
        assert_eq!(g([true, true, false, false, false]), GestureType::PointingUp);
        assert_eq!(g([false, true, true, false, false]), GestureType::Victory);
        assert_eq!(g([true, true, false, false, true]), GestureType::ILoveYou);
        assert_eq!(g([true, false, false, false, false]), GestureType::ThumbUp);
        assert_eq!(g([false, false, true, true, false]), GestureType::CustomGesture);
    }

    #[test]
    fn test_wrong_length_never_classifies() {
        for len in [0, 1, 20, 22, 42] {
            let hand = vec![Landmark::zeros(); len];
            assert_eq!(classify_letter(&hand), None);
            assert_eq!(classify_gesture(&hand), GestureType::Unknown);
            assert_eq!(classify_hand(&hand), HandLabel::Unknown);
        }
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(HandLabel::Letter(AslLetter::F).to_string(), "F");
        assert_eq!(HandLabel::Gesture(GestureType::ILoveYou).to_string(), "ILoveYou");
        assert_eq!(HandLabel::Gesture(GestureType::OpenPalm).to_string(), "Open_Palm");
        assert!(HandLabel::Unknown.is_unknown());
    }
}
