use std::fmt;

/// Pixel layout of a captured frame.
///
/// The pipeline is wired for 4-channel 8-bit RGBA; capture sources that
/// produce anything else must convert before delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// One captured image plus metadata, as delivered by a capture source.
///
/// A frame lives for exactly one pipeline pass; the coordinator takes
/// ownership when the frame is offered.
#[derive(Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
    /// Sensor orientation hint in degrees; valid values are multiples of 90.
    pub rotation_degrees: i32,
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("data_len", &self.data.len())
            .field("rotation_degrees", &self.rotation_degrees)
            .finish()
    }
}

impl RawFrame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
        rotation_degrees: i32,
    ) -> Self {
        Self {
            width,
            height,
            format,
            data,
            rotation_degrees,
        }
    }

    /// Number of bytes a complete frame of these dimensions occupies.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Whether the pixel buffer holds at least one complete frame.
    pub fn is_complete(&self) -> bool {
        self.data.len() >= self.expected_len()
    }
}
