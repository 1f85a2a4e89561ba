use crate::{ClassifyError, InputTensor, Model, Scores};
use ndarray::ArrayD;
use ort::{inputs, session::Session, value::TensorRef};
use std::path::Path;
use std::sync::OnceLock;

static ORT_INIT: OnceLock<()> = OnceLock::new();

fn ensure_ort_init() {
    ORT_INIT.get_or_init(|| {
        let _ = ort::init().commit();
    });
}

/// ONNX Runtime backend for the two-class model.
///
/// Loads the artifact once at session start and reads the required input
/// shape `[1, H, W, 3]` from the session metadata. Inference runs on the
/// pipeline worker thread, one forward pass per frame.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
    input_size: (usize, usize),
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_size", &self.input_size)
            .finish()
    }
}

impl OnnxModel {
    /// Load a two-class model from an ONNX file.
    ///
    /// Any failure here is `ClassifyError::ModelLoad` and aborts session
    /// startup; the pipeline never starts without a usable model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        ensure_ort_init();

        let session = Session::builder()
            .map_err(|e| {
                ClassifyError::ModelLoad(format!("failed to create session builder: {e}"))
            })?
            .commit_from_file(path.as_ref())
            .map_err(|e| ClassifyError::ModelLoad(format!("failed to load model file: {e}")))?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| ClassifyError::ModelLoad("model declares no inputs".to_string()))?;
        let input_name = input.name().to_string();

        let dims: Vec<i64> = input
            .input_type()
            .tensor_dimensions()
            .cloned()
            .unwrap_or_default();
        if dims.len() != 4 || dims[3] != 3 {
            return Err(ClassifyError::ModelLoad(format!(
                "expected input shape [1, H, W, 3], model declares {dims:?}"
            )));
        }
        if dims[1] <= 0 || dims[2] <= 0 {
            return Err(ClassifyError::ModelLoad(format!(
                "dynamic input dimensions are not supported, model declares {dims:?}"
            )));
        }
        let input_size = (dims[1] as usize, dims[2] as usize);

        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| ClassifyError::ModelLoad("model declares no outputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
            output_name,
            input_size,
        })
    }
}

impl Model for OnnxModel {
    fn input_size(&self) -> (usize, usize) {
        self.input_size
    }

    fn infer(&mut self, input: &InputTensor) -> Result<Scores, ClassifyError> {
        let shape = input.shape();
        if (shape[1], shape[2]) != self.input_size {
            // The transform pipeline is built from this model's input size,
            // so a mismatch here is a bug upstream.
            return Err(ClassifyError::Internal(format!(
                "tensor shape {shape:?} does not match model input {:?}",
                self.input_size
            )));
        }

        let array = ArrayD::from_shape_vec(ndarray::IxDyn(&shape), input.data().to_vec())
            .map_err(|e| ClassifyError::Internal(format!("failed to build ndarray: {e}")))?;
        let tensor_ref = TensorRef::from_array_view(array.view())
            .map_err(|e| ClassifyError::Inference(format!("failed to create tensor ref: {e}")))?;

        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => tensor_ref])
            .map_err(|e| ClassifyError::Inference(format!("inference failed: {e}")))?;

        let value = &outputs[self.output_name.as_str()];
        let scores = value
            .try_extract_array::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("output is not f32: {e}")))?;

        let scores: Vec<f32> = scores.iter().copied().collect();
        if scores.len() != 2 {
            return Err(ClassifyError::Inference(format!(
                "expected exactly 2 class scores, got {}",
                scores.len()
            )));
        }

        Ok(Scores::new(scores[0], scores[1]))
    }
}
