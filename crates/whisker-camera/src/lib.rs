//! Camera-facing boundary of the whisker pipeline.
//!
//! This crate defines the frame type delivered by capture sources, the
//! async `FrameSource` trait they implement, the capture configuration, and
//! a synthetic test-pattern source. Actual camera-session setup (device
//! negotiation, permissions, lifecycle) belongs to the host platform and
//! stays outside this workspace.

pub mod config;
pub mod error;
pub mod frame;
pub mod test_pattern;
pub mod traits;

pub use config::CameraConfig;
pub use error::CameraError;
pub use frame::{PixelFormat, RawFrame};
pub use test_pattern::TestPatternSource;
pub use traits::FrameSource;
