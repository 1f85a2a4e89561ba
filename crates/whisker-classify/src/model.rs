use crate::{ClassifyError, InputTensor, Scores};

/// The inference engine adapter: a fixed pre-trained two-class model behind
/// an opaque interface.
///
/// The artifact is loaded once at session start (load failure aborts
/// startup); after that the handle is owned exclusively by the pipeline
/// worker, so one forward pass runs at a time and no synchronization is
/// needed. `infer` performs exactly one forward pass and never retries.
pub trait Model: Send {
    /// The (height, width) the model requires its input tensor to have.
    fn input_size(&self) -> (usize, usize);

    /// Run one forward pass over a preprocessed tensor.
    ///
    /// Engine-internal failure surfaces as `ClassifyError::Inference`; the
    /// coordinator drops the frame and continues.
    fn infer(&mut self, input: &InputTensor) -> Result<Scores, ClassifyError>;
}
