use crate::{ClassifyError, InputTensor};

const BYTES_PER_PIXEL: usize = 4;

/// The fixed four-step image transform: center-crop to square, resize to the
/// model input size, rotate by the sensor hint, normalize to [0, 1].
///
/// The order is deliberate: cropping before resizing avoids aspect
/// distortion, rotating after resizing bounds rotation cost to model-input
/// resolution instead of sensor resolution, and normalizing last keeps the
/// prior steps in the integer domain.
///
/// Geometry is computed once per session from the first frame's dimensions
/// and rotation hint; `run` then applies it to every frame.
#[derive(Debug)]
pub struct TransformPipeline {
    src_width: usize,
    src_height: usize,
    crop_side: usize,
    target_width: usize,
    target_height: usize,
    /// Counter-clockwise quarter turns, already reduced to 0..=3.
    quarter_turns: u8,
}

impl TransformPipeline {
    /// Build the transform for a session.
    ///
    /// `model_input` is the model's required (height, width). Fails with
    /// `UnsupportedRotation` if the hint is not a multiple of 90, and with
    /// `Internal` if an odd quarter-turn count would swap a non-square model
    /// input (the output shape could never match the model).
    pub fn new(
        buffer_width: u32,
        buffer_height: u32,
        rotation_degrees: i32,
        model_input: (usize, usize),
    ) -> Result<Self, ClassifyError> {
        if rotation_degrees % 90 != 0 {
            return Err(ClassifyError::UnsupportedRotation(rotation_degrees));
        }

        // Undo the sensor rotation: -rotation in 90-degree steps, as
        // counter-clockwise quarter turns reduced into 0..=3.
        let quarter_turns = (-(rotation_degrees / 90)).rem_euclid(4) as u8;

        let (target_height, target_width) = model_input;
        if quarter_turns % 2 == 1 && target_width != target_height {
            return Err(ClassifyError::Internal(format!(
                "rotation by {rotation_degrees} degrees would swap non-square model input \
                 {target_height}x{target_width}"
            )));
        }

        Ok(Self {
            src_width: buffer_width as usize,
            src_height: buffer_height as usize,
            crop_side: (buffer_width.min(buffer_height)) as usize,
            target_width,
            target_height,
            quarter_turns,
        })
    }

    pub fn crop_side(&self) -> usize {
        self.crop_side
    }

    pub fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }

    /// Run the full transform over one scratch buffer's RGBA pixels,
    /// producing the model input tensor.
    pub fn run(&self, pixels: &[u8]) -> Result<InputTensor, ClassifyError> {
        let expected = self.src_width * self.src_height * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(ClassifyError::Internal(format!(
                "transform fed {} bytes, buffer geometry requires {expected}",
                pixels.len()
            )));
        }

        let cropped = center_crop(pixels, self.src_width, self.src_height, self.crop_side);
        let resized = resize_nearest(
            &cropped,
            self.crop_side,
            self.crop_side,
            self.target_width,
            self.target_height,
        );
        let rotated = rotate_quarters(
            resized,
            self.target_width,
            self.target_height,
            self.quarter_turns,
        );

        normalize(&rotated, self.target_width, self.target_height)
    }
}

/// Center-crop an RGBA image to a `side` x `side` square.
///
/// A no-op copy when the image is already square.
fn center_crop(pixels: &[u8], width: usize, height: usize, side: usize) -> Vec<u8> {
    let x0 = (width - side) / 2;
    let y0 = (height - side) / 2;

    let mut out = Vec::with_capacity(side * side * BYTES_PER_PIXEL);
    for y in 0..side {
        let row_start = ((y0 + y) * width + x0) * BYTES_PER_PIXEL;
        out.extend_from_slice(&pixels[row_start..row_start + side * BYTES_PER_PIXEL]);
    }
    out
}

/// Resize an RGBA image with nearest-neighbor sampling.
///
/// Nearest-neighbor trades fidelity for speed; this runs once per camera
/// frame.
fn resize_nearest(
    pixels: &[u8],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<u8> {
    if src_width == dst_width && src_height == dst_height {
        return pixels.to_vec();
    }

    let mut out = vec![0u8; dst_width * dst_height * BYTES_PER_PIXEL];
    for out_y in 0..dst_height {
        let src_y = (out_y * src_height / dst_height).min(src_height - 1);
        for out_x in 0..dst_width {
            let src_x = (out_x * src_width / dst_width).min(src_width - 1);

            let src_idx = (src_y * src_width + src_x) * BYTES_PER_PIXEL;
            let dst_idx = (out_y * dst_width + out_x) * BYTES_PER_PIXEL;
            out[dst_idx..dst_idx + BYTES_PER_PIXEL]
                .copy_from_slice(&pixels[src_idx..src_idx + BYTES_PER_PIXEL]);
        }
    }
    out
}

/// Rotate an RGBA image counter-clockwise by `turns` quarter turns.
///
/// `turns` must already be reduced to 0..=3. Zero turns is the identity and
/// returns the input unchanged.
fn rotate_quarters(pixels: Vec<u8>, width: usize, height: usize, turns: u8) -> Vec<u8> {
    let (mut pixels, mut width, mut height) = (pixels, width, height);

    for _ in 0..turns {
        // One CCW quarter turn: dst is height x width, and the source pixel
        // for dst (x', y') is src (width - 1 - y', x').
        let (dst_width, dst_height) = (height, width);
        let mut out = vec![0u8; pixels.len()];
        for dst_y in 0..dst_height {
            for dst_x in 0..dst_width {
                let src_x = width - 1 - dst_y;
                let src_y = dst_x;

                let src_idx = (src_y * width + src_x) * BYTES_PER_PIXEL;
                let dst_idx = (dst_y * dst_width + dst_x) * BYTES_PER_PIXEL;
                out[dst_idx..dst_idx + BYTES_PER_PIXEL]
                    .copy_from_slice(&pixels[src_idx..src_idx + BYTES_PER_PIXEL]);
            }
        }
        pixels = out;
        width = dst_width;
        height = dst_height;
    }

    pixels
}

/// Map 8-bit RGB channels to f32 in [0, 1], dropping alpha.
///
/// Plain division by 255, no mean subtraction.
fn normalize(pixels: &[u8], width: usize, height: usize) -> Result<InputTensor, ClassifyError> {
    let mut data = Vec::with_capacity(width * height * 3);
    for px in pixels.chunks_exact(BYTES_PER_PIXEL) {
        data.push(px[0] as f32 / 255.0);
        data.push(px[1] as f32 / 255.0);
        data.push(px[2] as f32 / 255.0);
    }

    InputTensor::new(height, width, data)
}
