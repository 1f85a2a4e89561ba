use crate::{CameraError, RawFrame};

/// Async frame source trait for capture backends.
///
/// Implementations deliver one `RawFrame` per `recv` call with a
/// keep-only-latest discipline: a source never accumulates unconsumed
/// frames, it hands over the most recent capture and discards older ones.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    /// Receive the next frame from the source.
    ///
    /// Returns the most recent captured frame, including its dimensions
    /// and sensor rotation hint.
    async fn recv(&mut self) -> Result<RawFrame, CameraError>;
}
