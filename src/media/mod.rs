//! Local capture: acquiring and releasing audio/video streams.
pub mod constraints;
#[cfg(feature = "devices")]
pub mod device_source;
pub mod media_error;
pub mod media_source;
pub mod media_stream;
pub mod synthetic_source;

pub use constraints::MediaConstraints;
pub use media_error::MediaAccessError;
pub use media_source::{MediaSource, MediaSourceManager};
pub use media_stream::{CaptureHandle, MediaStream, MediaTrack, TrackKind};
pub use synthetic_source::SyntheticMediaSource;
