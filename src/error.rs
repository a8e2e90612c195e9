use thiserror::Error;

use crate::capture::frame::{FrameGeometry, PixelLayout};

/// Errors surfaced by the reader library
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A frame arrived before the stream format was negotiated, or the
    /// negotiated layout cannot be handed to the decoder.
    #[error("stream format not negotiated")]
    NotNegotiated,

    #[error("frame {got_layout}/{got:?} does not match negotiated {layout}/{expected:?}")]
    FrameMismatch {
        layout: PixelLayout,
        expected: FrameGeometry,
        got_layout: PixelLayout,
        got: FrameGeometry,
    },

    #[error("frame buffer holds {len} bytes, {needed} needed")]
    BufferTooSmall { len: usize, needed: usize },

    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    #[error("unknown barcode format: {0}")]
    UnknownFormat(String),

    #[error("decoder failure: {0}")]
    Decoder(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[cfg(feature = "gstreamer-pipeline")]
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, ReaderError>;
