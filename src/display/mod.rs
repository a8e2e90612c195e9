#[cfg(feature = "gstreamer-pipeline")]
pub mod gst_display;

#[cfg(feature = "gstreamer-pipeline")]
pub use gst_display::GstFrameDisplay;
