// src/sequence.rs - Rolling landmark windows assembled as sequence-model input
use std::collections::VecDeque;

use crate::error::{Result, TrackerError};
use crate::landmark::{
    flatten_landmarks, is_complete_hand, project_important, HolisticLandmarks, Landmark,
    FLAT_HAND_LEN, IMPORTANT_LANDMARKS,
};

pub const DEFAULT_SEQUENCE_LENGTH: usize = 30;
/// left + right
pub const HANDS_PER_FRAME: usize = 2;
/// 42 landmarks × 3 coordinates
pub const HAND_FRAME_LEN: usize = HANDS_PER_FRAME * FLAT_HAND_LEN;
/// Model input size for the default window: 30 × 126.
pub const PREPROCESSED_LEN: usize = DEFAULT_SEQUENCE_LENGTH * HAND_FRAME_LEN;

/// Fixed-shape frames in a drop-oldest queue.
#[derive(Debug, Clone)]
struct FrameWindow {
    frames: VecDeque<Vec<f32>>,
    capacity: usize,
}

impl FrameWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    fn push(&mut self, frame: Vec<f32>) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    fn is_full(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    fn sequence(&self) -> Result<Vec<Vec<f32>>> {
        if !self.is_full() {
            return Err(TrackerError::InsufficientData {
                have: self.frames.len(),
                need: self.capacity,
            });
        }
        let skip = self.frames.len() - self.capacity;
        Ok(self.frames.iter().skip(skip).cloned().collect())
    }

    fn flat(&self) -> Result<Vec<f32>> {
        Ok(self.sequence()?.into_iter().flatten().collect())
    }

    fn progress(&self) -> f64 {
        self.frames.len() as f64 / self.capacity as f64
    }

    fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.frames.len())
    }
}

/// Two-hand window: every frame is left block then right block, 21 × (x, y, z)
/// each, with an absent hand written as zeros so all frames share one shape.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    window: FrameWindow,
}

impl Default for SequenceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_LENGTH)
    }
}

impl SequenceBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: FrameWindow::new(capacity),
        }
    }

    /// Callers should pass at least one real hand; this is not enforced.
    pub fn add_frame(&mut self, left: Option<&[Landmark]>, right: Option<&[Landmark]>) {
        let mut frame = Vec::with_capacity(HAND_FRAME_LEN);
        frame.extend(hand_block(left));
        frame.extend(hand_block(right));
        self.window.push(frame);
    }

    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    /// Oldest first, one 126-value row per frame. Fails until the window is full.
    pub fn get_sequence(&self) -> Result<Vec<Vec<f32>>> {
        self.window.sequence()
    }

    /// Frame-major, then hand, then landmark, then coordinate: `capacity × 126` floats.
    pub fn get_preprocessed_sequence(&self) -> Result<Vec<f32>> {
        self.window.flat()
    }

    pub fn len(&self) -> usize {
        self.window.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity
    }

    pub fn progress(&self) -> f64 {
        self.window.progress()
    }

    pub fn remaining_frames(&self) -> usize {
        self.window.remaining()
    }

    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        self.window.frames.iter().map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.window.frames.clear();
    }
}

fn hand_block(hand: Option<&[Landmark]>) -> Vec<f32> {
    match hand {
        Some(hand) if is_complete_hand(hand) => flatten_landmarks(hand),
        _ => vec![0.0; FLAT_HAND_LEN],
    }
}

/// Full-body window: each frame is the 543-point holistic set projected onto
/// [`IMPORTANT_LANDMARKS`], 88 × 3 values in that fixed order.
#[derive(Debug, Clone)]
pub struct HolisticSequenceBuffer {
    window: FrameWindow,
}

impl Default for HolisticSequenceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_LENGTH)
    }
}

impl HolisticSequenceBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: FrameWindow::new(capacity),
        }
    }

    pub fn frame_len() -> usize {
        IMPORTANT_LANDMARKS.len() * 3
    }

    /// `all` is the dense holistic array; missing indices project to zeros.
    pub fn add_frame(&mut self, all: &[Landmark]) {
        self.window.push(flatten_landmarks(&project_important(all)));
    }

    pub fn add_holistic(&mut self, landmarks: &HolisticLandmarks) {
        self.add_frame(&landmarks.dense());
    }

    pub fn is_full(&self) -> bool {
        self.window.is_full()
    }

    pub fn get_sequence(&self) -> Result<Vec<Vec<f32>>> {
        self.window.sequence()
    }

    pub fn get_preprocessed_sequence(&self) -> Result<Vec<f32>> {
        self.window.flat()
    }

    pub fn len(&self) -> usize {
        self.window.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.frames.is_empty()
    }

    pub fn progress(&self) -> f64 {
        self.window.progress()
    }

    pub fn remaining_frames(&self) -> usize {
        self.window.remaining()
    }

    pub fn clear(&mut self) {
        self.window.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{HAND_LANDMARK_COUNT, HOLISTIC_LANDMARK_COUNT};

    /// A hand whose every coordinate carries `id`, so frames can be told apart.
    fn tagged_hand(id: usize) -> Vec<Landmark> {
        vec![Landmark::new(id as f64, id as f64, id as f64); HAND_LANDMARK_COUNT]
    }

    #[test]
    fn test_fifo_eviction_keeps_last_capacity() {
        let mut buffer = SequenceBuffer::new(30);
        for id in 1..=37 {
            let hand = tagged_hand(id);
            buffer.add_frame(Some(&hand), None);
        }

        assert_eq!(buffer.len(), 30);
        let ids: Vec<usize> = buffer.frames().map(|f| f[0] as usize).collect();
        assert_eq!(ids, (8..=37).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_hand_is_zero_padded() {
        let mut buffer = SequenceBuffer::new(1);
        let hand = tagged_hand(5);
        buffer.add_frame(Some(&hand), None);

        let frame = &buffer.get_sequence().unwrap()[0];
        assert_eq!(frame.len(), HAND_FRAME_LEN);
        assert!(frame[..FLAT_HAND_LEN].iter().all(|&v| v == 5.0));
        assert!(frame[FLAT_HAND_LEN..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_short_hand_is_zeroed() {
        let mut buffer = SequenceBuffer::new(1);
        let short = vec![Landmark::new(1.0, 1.0, 1.0); 20];
        let right = tagged_hand(2);
        buffer.add_frame(Some(&short), Some(&right));

        let frame = buffer.frames().next().unwrap();
        assert!(frame[..FLAT_HAND_LEN].iter().all(|&v| v == 0.0));
        assert!(frame[FLAT_HAND_LEN..].iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_sequence_requires_full_window() {
        let mut buffer = SequenceBuffer::default();
        let hand = tagged_hand(1);
        for _ in 0..29 {
            buffer.add_frame(Some(&hand), None);
        }
        assert!(!buffer.is_full());
        assert_eq!(buffer.remaining_frames(), 1);
        assert!(matches!(
            buffer.get_sequence(),
            Err(TrackerError::InsufficientData { have: 29, need: 30 })
        ));

        buffer.add_frame(Some(&hand), None);
        assert!(buffer.is_full());
        assert_eq!(buffer.progress(), 1.0);
        assert_eq!(buffer.get_preprocessed_sequence().unwrap().len(), PREPROCESSED_LEN);
    }

    #[test]
    fn test_clear_and_progress() {
        let mut buffer = SequenceBuffer::new(4);
        let hand = tagged_hand(1);
        buffer.add_frame(None, Some(&hand));
        assert_eq!(buffer.progress(), 0.25);
        assert_eq!(buffer.remaining_frames(), 3);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.progress(), 0.0);
        assert_eq!(buffer.remaining_frames(), 4);
    }

    #[test]
    fn test_holistic_projection_shape() {
        let mut buffer = HolisticSequenceBuffer::new(2);
        let all: Vec<Landmark> = (0..HOLISTIC_LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f64, 0.0, 0.0))
            .collect();
        buffer.add_frame(&all);
        buffer.add_holistic(&HolisticLandmarks::default());
        assert!(buffer.is_full());

        let sequence = buffer.get_sequence().unwrap();
        assert_eq!(sequence[0].len(), HolisticSequenceBuffer::frame_len());
        assert_eq!(sequence[0][3 * 13], 468.0);
        assert_eq!(sequence[0][3 * 6], 117.0);
        assert!(sequence[1].iter().all(|&v| v == 0.0));
        assert_eq!(buffer.get_preprocessed_sequence().unwrap().len(), 2 * 264);
    }
}
