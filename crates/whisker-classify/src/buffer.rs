use crate::ClassifyError;
use whisker_camera::RawFrame;

const BYTES_PER_PIXEL: usize = 4;

/// The single reusable scratch buffer for incoming pixels.
///
/// Allocated lazily from the first observed frame's dimensions and then
/// overwritten in place for every later frame. It never resizes: downstream
/// crop geometry is precomputed from the first frame, so a frame with other
/// dimensions is a contract violation, not a resize trigger.
#[derive(Debug)]
pub struct FrameBuffer {
    allocated: Option<Scratch>,
}

#[derive(Debug)]
struct Scratch {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { allocated: None }
    }

    /// Allocate the scratch buffer on first call.
    ///
    /// Later calls with the same dimensions are no-ops; different dimensions
    /// fail with `ClassifyError::DimensionMismatch`, which is fatal for the
    /// session.
    pub fn ensure_allocated(&mut self, width: u32, height: u32) -> Result<(), ClassifyError> {
        match &self.allocated {
            None => {
                let len = width as usize * height as usize * BYTES_PER_PIXEL;
                self.allocated = Some(Scratch {
                    width,
                    height,
                    data: vec![0u8; len],
                });
                Ok(())
            }
            Some(scratch) if scratch.width == width && scratch.height == height => Ok(()),
            Some(scratch) => Err(ClassifyError::DimensionMismatch {
                expected: (scratch.width, scratch.height),
                got: (width, height),
            }),
        }
    }

    /// Overwrite the buffer contents byte-for-byte from a raw frame.
    ///
    /// There is no partial-copy recovery: a source shorter than one full
    /// frame fails with `ClassifyError::Underrun` and the buffer keeps its
    /// previous contents.
    pub fn copy_pixels_from(&mut self, frame: &RawFrame) -> Result<(), ClassifyError> {
        let scratch = self.allocated.as_mut().ok_or_else(|| {
            ClassifyError::Internal("copy_pixels_from called before allocation".to_string())
        })?;

        let expected = scratch.data.len();
        if frame.data.len() < expected {
            return Err(ClassifyError::Underrun {
                expected,
                got: frame.data.len(),
            });
        }

        scratch.data.copy_from_slice(&frame.data[..expected]);
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated.is_some()
    }

    /// Buffer dimensions as (width, height), if allocated.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.allocated.as_ref().map(|s| (s.width, s.height))
    }

    /// The RGBA pixel bytes, if allocated.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.allocated.as_ref().map(|s| s.data.as_slice())
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
