use std::fmt;

/// Errors raised inside the classification pipeline.
///
/// Fatal variants abort the session; recoverable ones cost a single frame.
/// The coordinator uses `is_fatal` to pick between the two outcomes.
#[derive(Debug)]
pub enum ClassifyError {
    /// A frame arrived with dimensions different from the first frame's.
    /// The scratch buffer never resizes mid-session, so this aborts.
    DimensionMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },
    /// A frame's pixel buffer is shorter than its dimensions require.
    Underrun { expected: usize, got: usize },
    /// The capture source reported a rotation that is not a multiple of 90.
    UnsupportedRotation(i32),
    /// The inference engine failed internally. Never retried.
    Inference(String),
    /// The model artifact could not be loaded at session start.
    ModelLoad(String),
    /// An internal invariant was violated. A bug, not a runtime input error.
    Internal(String),
}

impl ClassifyError {
    /// Whether this error ends the session (as opposed to costing one frame).
    pub fn is_fatal(&self) -> bool {
        match self {
            ClassifyError::DimensionMismatch { .. }
            | ClassifyError::UnsupportedRotation(_)
            | ClassifyError::ModelLoad(_)
            | ClassifyError::Internal(_) => true,
            ClassifyError::Underrun { .. } | ClassifyError::Inference(_) => false,
        }
    }
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::DimensionMismatch { expected, got } => write!(
                f,
                "frame dimension mismatch: buffer allocated for {}x{}, frame is {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            ClassifyError::Underrun { expected, got } => write!(
                f,
                "pixel buffer underrun: expected {expected} bytes, got {got}"
            ),
            ClassifyError::UnsupportedRotation(deg) => {
                write!(f, "unsupported rotation: {deg} degrees is not a multiple of 90")
            }
            ClassifyError::Inference(msg) => write!(f, "inference error: {msg}"),
            ClassifyError::ModelLoad(msg) => write!(f, "model load error: {msg}"),
            ClassifyError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ClassifyError {}
