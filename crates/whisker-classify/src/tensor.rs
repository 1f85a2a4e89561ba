use crate::ClassifyError;
use std::fmt;

const RGB_CHANNELS: usize = 3;

/// A preprocessed model input: row-major floats of shape `[1, H, W, 3]`,
/// every element in [0, 1].
///
/// Created fresh by the transform pipeline for each frame pass and dropped
/// after inference.
#[derive(Clone, PartialEq)]
pub struct InputTensor {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl fmt::Debug for InputTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputTensor")
            .field("shape", &self.shape())
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl InputTensor {
    pub fn new(height: usize, width: usize, data: Vec<f32>) -> Result<Self, ClassifyError> {
        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(RGB_CHANNELS))
            .ok_or_else(|| {
                ClassifyError::Internal(format!(
                    "tensor dimensions {height}x{width} overflow"
                ))
            })?;
        if data.len() != expected {
            return Err(ClassifyError::Internal(format!(
                "tensor data length {} does not match shape [1, {height}, {width}, 3]",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, RGB_CHANNELS]
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Per-class confidence scores from one inference pass.
///
/// Read-only and consumed immediately by the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub class0: f32,
    pub class1: f32,
}

impl Scores {
    pub fn new(class0: f32, class1: f32) -> Self {
        Self { class0, class1 }
    }
}
