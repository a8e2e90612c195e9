pub mod frame;
#[cfg(feature = "gstreamer-pipeline")]
pub mod gst_capture;

pub use frame::{FrameGeometry, FrameMetadata, PixelLayout, VideoFrame};
#[cfg(feature = "gstreamer-pipeline")]
pub use gst_capture::{CaptureStopHandle, GstCapture};
