//! Outcome of a single pipeline iteration.

use crate::frame::SampleFrame;

/// Every iteration produces a frame; the emission gate decides whether it
/// goes out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepStatus {
    /// The frame passed the emission gate and should be written.
    Emitted(SampleFrame),
    /// Computed but held back; state was still updated.
    Held(SampleFrame),
}

impl StepStatus {
    pub fn frame(&self) -> &SampleFrame {
        match self {
            StepStatus::Emitted(f) | StepStatus::Held(f) => f,
        }
    }

    pub fn is_emitted(&self) -> bool {
        matches!(self, StepStatus::Emitted(_))
    }
}
