//! Real-time binary video classification pipeline.
//!
//! Frames from a capture source flow through a fixed sequence: pixel copy
//! into a single reusable scratch buffer, a deterministic image transform
//! (center-crop, resize, rotate, normalize), one forward pass through a
//! pre-trained two-class model, and reduction to the winning label. The
//! whole sequence runs on a dedicated worker thread so capture is never
//! blocked; frames that arrive while the worker is busy are dropped.

pub mod buffer;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reduce;
pub mod tensor;
pub mod transform;

#[cfg(feature = "onnx")]
pub mod backends;

pub use buffer::FrameBuffer;
pub use config::PipelineConfig;
pub use error::ClassifyError;
pub use model::Model;
pub use pipeline::{pump, OfferOutcome, Pipeline, PipelineState, ResultSink};
pub use reduce::{BinaryClass, Classification, Reducer};
pub use tensor::{InputTensor, Scores};
pub use transform::TransformPipeline;

#[cfg(feature = "onnx")]
pub use backends::onnx::OnnxModel;
