use crate::{CameraConfig, CameraError, FrameSource, PixelFormat, RawFrame};
use std::time::Duration;

/// Synthetic frame source emitting solid-color RGBA frames.
///
/// Stands in for a real camera wherever one is unavailable: each frame
/// carries the configured dimensions and rotation hint, paced at the
/// configured rate. The fill value advances by one per frame so consumers
/// can tell captures apart.
pub struct TestPatternSource {
    config: CameraConfig,
    fill: u8,
}

impl TestPatternSource {
    pub fn new(config: CameraConfig) -> Self {
        Self { config, fill: 0 }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    fn frame_interval(&self) -> Duration {
        match self.config.fps() {
            0 => Duration::ZERO,
            fps => Duration::from_secs(1) / fps,
        }
    }
}

impl FrameSource for TestPatternSource {
    async fn recv(&mut self) -> Result<RawFrame, CameraError> {
        let interval = self.frame_interval();
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }

        self.fill = self.fill.wrapping_add(1);
        let len = self.config.width() as usize
            * self.config.height() as usize
            * PixelFormat::Rgba8.bytes_per_pixel();
        Ok(RawFrame::new(
            self.config.width(),
            self.config.height(),
            PixelFormat::Rgba8,
            vec![self.fill; len],
            self.config.rotation_degrees(),
        ))
    }
}
