/// Capture settings a frame source honors when producing frames.
///
/// The rotation hint travels with every frame a source emits; downstream
/// consumers use it to undo the sensor orientation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    width: u32,
    height: u32,
    fps: u32,
    rotation_degrees: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            rotation_degrees: 0,
        }
    }
}

impl CameraConfig {
    /// Set the capture width in pixels.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the capture height in pixels.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the capture rate in frames per second. Zero means unpaced.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the sensor rotation hint stamped onto every emitted frame.
    pub fn with_rotation_degrees(mut self, rotation_degrees: i32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }
}
