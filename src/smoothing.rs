// src/smoothing.rs - Debounces per-frame labels into a stable displayed label
use std::collections::VecDeque;

use tracing::{debug, info};

use crate::classifier::HandLabel;
use crate::recognition::FrameResult;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingState {
    Unconfirmed,
    Confirmed(HandLabel),
}

/// Shows a label only after it was seen on `window` consecutive frames.
///
/// Any differing label restarts the run, and a frame without a usable label
/// drops back to unconfirmed.
pub struct LabelSmoother {
    window: usize,
    history: VecDeque<HandLabel>,
    state: SmoothingState,
}

impl Default for LabelSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}

impl LabelSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
            state: SmoothingState::Unconfirmed,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn state(&self) -> SmoothingState {
        self.state
    }

    pub fn confirmed(&self) -> Option<HandLabel> {
        match self.state {
            SmoothingState::Confirmed(label) => Some(label),
            SmoothingState::Unconfirmed => None,
        }
    }

    /// Zero or one label, ready for display.
    pub fn displayed_labels(&self) -> Vec<HandLabel> {
        self.confirmed().into_iter().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Feed the primary label of one processed frame.
    pub fn observe(&mut self, label: Option<HandLabel>) -> SmoothingState {
        let label = match label {
            Some(label) if !label.is_unknown() => label,
            _ => {
                self.reset();
                return self.state;
            }
        };

        if self.history.back().is_some_and(|last| *last != label) {
            self.history.clear();
        }
        self.history.push_back(label);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        let stable = self.history.len() == self.window && self.history.iter().all(|l| *l == label);
        let next = if stable {
            SmoothingState::Confirmed(label)
        } else {
            SmoothingState::Unconfirmed
        };

        if next != self.state {
            match next {
                SmoothingState::Confirmed(label) => info!(label = label.as_str(), "label confirmed"),
                SmoothingState::Unconfirmed => debug!(label = label.as_str(), "label changed, run restarted"),
            }
        }
        self.state = next;
        self.state
    }

    pub fn observe_frame(&mut self, result: &FrameResult) -> SmoothingState {
        self.observe(result.primary_label())
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.state = SmoothingState::Unconfirmed;
    }
}
