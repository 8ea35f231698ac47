// src/lib.rs
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod landmark;
pub mod recognition;
pub mod sequence;
pub mod session;
pub mod smoothing;
pub mod source;

pub use classifier::{classify_gesture, classify_hand, classify_letter, AslLetter, GestureType, HandLabel};
pub use config::{PresencePolicy, TrackerConfig};
pub use error::{Result, TrackerError};
pub use landmark::{Handedness, Landmark};
pub use recognition::{FrameMeta, FrameResult, Recognition, RecognitionBuilder};
pub use sequence::{HolisticSequenceBuffer, SequenceBuffer};
pub use session::{run_pipeline, SessionController, SessionUpdate};
pub use smoothing::{LabelSmoother, SmoothingState};
pub use source::{HandObservation, LandmarkSource};
