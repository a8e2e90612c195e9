pub mod capture;
pub mod detection;
pub mod display;
pub mod error;
pub mod overlay;
pub mod pipeline;
pub mod utils;

use std::path::Path;

use capture::frame::PixelLayout;
use serde::{Deserialize, Serialize};

pub use capture::{FrameGeometry, VideoFrame};
pub use detection::{BarcodeFormats, BarcodeResult, Point2D, Quad, Symbology, Timestamp};
pub use error::{ReaderError, Result};
pub use pipeline::{BarcodeReader, DetectionEvent, DetectionSink, FrameProcessor, ReaderSettings};

/// Prefix for environment overrides, e.g. `BARCODEREADER_READER__SHOW_LOCATION=false`
pub const ENV_PREFIX: &str = "BARCODEREADER";

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reader: ReaderConfig,
    pub dedup: DedupConfig,
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
}

/// Initial values of the element's properties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub enable_reader: bool,
    /// Format nicks joined by `+`, e.g. `"qr-code+ean-13"` or `"any"`
    pub barcode_formats: String,
    pub show_location: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Seconds after which every detection is announced again
    pub refresh_interval_secs: u64,
    /// Upper bound on identities tracked between refreshes
    pub max_tracked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// `"auto"` probes V4L2 devices, `"test"` uses a test pattern, anything
    /// else is a device path
    pub device: String,
    /// Replaces the source part of the pipeline when set
    pub custom_source: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub layout: PixelLayout,
    pub max_buffers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub fps_overlay: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            enable_reader: true,
            barcode_formats: "any".into(),
            show_location: true,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 2,
            max_tracked: 4096,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "auto".into(),
            custom_source: None,
            width: 640,
            height: 480,
            fps: 30,
            layout: PixelLayout::Bgrx,
            max_buffers: 3,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fps_overlay: false,
        }
    }
}

impl Config {
    /// Defaults, overlaid by an optional TOML file, overlaid by
    /// `BARCODEREADER_*` environment variables (`__` separates sections).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
