use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use crate::error::ReaderError;

/// Raw video frame handed over by the pipeline, mutated in place
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Plane data. Planar layouts keep the luma plane first.
    pub data: BytesMut,

    pub meta: FrameMetadata,

    /// Arrival time for latency tracking
    pub timestamp: Instant,
}

impl VideoFrame {
    pub fn new(data: BytesMut, layout: PixelLayout, geometry: FrameGeometry) -> Self {
        Self {
            data,
            meta: FrameMetadata {
                sequence: 0,
                layout,
                geometry,
                pts: None,
            },
            timestamp: Instant::now(),
        }
    }
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub sequence: u64,
    pub layout: PixelLayout,
    pub geometry: FrameGeometry,
    pub pts: Option<Duration>,
}

/// Dimensions and row pitch of plane 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    /// Bytes per row of plane 0
    pub stride: usize,
}

impl FrameGeometry {
    /// Geometry of a tightly packed plane 0 (no row padding)
    pub fn packed(layout: PixelLayout, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: width as usize * layout.bytes_per_pixel(),
        }
    }

    /// Bytes needed to address every row of plane 0
    pub fn plane_len(&self) -> usize {
        self.stride * self.height as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

/// Pixel layouts the element knows about
///
/// Names follow GStreamer's raw video format names, in config files too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PixelLayout {
    Argb,
    Bgra,
    Abgr,
    Rgba,
    Xrgb,
    Bgrx,
    Xbgr,
    Rgbx,
    Rgb,
    Bgr,
    Yuy2,
    Nv12,
    Nv21,
    I420,
    Yv12,
    Gray8,
    // Known to the pipeline but neither drawable nor decodable
    Uyvy,
    Rgb16,
}

impl PixelLayout {
    pub const ALL: [PixelLayout; 18] = [
        PixelLayout::Argb,
        PixelLayout::Bgra,
        PixelLayout::Abgr,
        PixelLayout::Rgba,
        PixelLayout::Xrgb,
        PixelLayout::Bgrx,
        PixelLayout::Xbgr,
        PixelLayout::Rgbx,
        PixelLayout::Rgb,
        PixelLayout::Bgr,
        PixelLayout::Yuy2,
        PixelLayout::Nv12,
        PixelLayout::Nv21,
        PixelLayout::I420,
        PixelLayout::Yv12,
        PixelLayout::Gray8,
        PixelLayout::Uyvy,
        PixelLayout::Rgb16,
    ];

    /// Bytes per pixel in plane 0
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Argb
            | PixelLayout::Bgra
            | PixelLayout::Abgr
            | PixelLayout::Rgba
            | PixelLayout::Xrgb
            | PixelLayout::Bgrx
            | PixelLayout::Xbgr
            | PixelLayout::Rgbx => 4,
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
            PixelLayout::Yuy2 | PixelLayout::Uyvy | PixelLayout::Rgb16 => 2,
            PixelLayout::Nv12
            | PixelLayout::Nv21
            | PixelLayout::I420
            | PixelLayout::Yv12
            | PixelLayout::Gray8 => 1,
        }
    }

    /// GStreamer format name
    pub fn name(self) -> &'static str {
        match self {
            PixelLayout::Argb => "ARGB",
            PixelLayout::Bgra => "BGRA",
            PixelLayout::Abgr => "ABGR",
            PixelLayout::Rgba => "RGBA",
            PixelLayout::Xrgb => "xRGB",
            PixelLayout::Bgrx => "BGRx",
            PixelLayout::Xbgr => "xBGR",
            PixelLayout::Rgbx => "RGBx",
            PixelLayout::Rgb => "RGB",
            PixelLayout::Bgr => "BGR",
            PixelLayout::Yuy2 => "YUY2",
            PixelLayout::Nv12 => "NV12",
            PixelLayout::Nv21 => "NV21",
            PixelLayout::I420 => "I420",
            PixelLayout::Yv12 => "YV12",
            PixelLayout::Gray8 => "GRAY8",
            PixelLayout::Uyvy => "UYVY",
            PixelLayout::Rgb16 => "RGB16",
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelLayout {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelLayout::ALL
            .into_iter()
            .find(|layout| layout.name() == s)
            .ok_or_else(|| ReaderError::UnsupportedLayout(s.to_string()))
    }
}

impl From<PixelLayout> for String {
    fn from(layout: PixelLayout) -> Self {
        layout.name().to_string()
    }
}

impl TryFrom<String> for PixelLayout {
    type Error = ReaderError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

#[cfg(feature = "gstreamer-pipeline")]
mod gst_mapping {
    use gstreamer_video::VideoFormat;

    use super::PixelLayout;

    impl PixelLayout {
        pub fn from_video_format(format: VideoFormat) -> Option<Self> {
            let layout = match format {
                VideoFormat::Argb => PixelLayout::Argb,
                VideoFormat::Bgra => PixelLayout::Bgra,
                VideoFormat::Abgr => PixelLayout::Abgr,
                VideoFormat::Rgba => PixelLayout::Rgba,
                VideoFormat::Xrgb => PixelLayout::Xrgb,
                VideoFormat::Bgrx => PixelLayout::Bgrx,
                VideoFormat::Xbgr => PixelLayout::Xbgr,
                VideoFormat::Rgbx => PixelLayout::Rgbx,
                VideoFormat::Rgb => PixelLayout::Rgb,
                VideoFormat::Bgr => PixelLayout::Bgr,
                VideoFormat::Yuy2 => PixelLayout::Yuy2,
                VideoFormat::Nv12 => PixelLayout::Nv12,
                VideoFormat::Nv21 => PixelLayout::Nv21,
                VideoFormat::I420 => PixelLayout::I420,
                VideoFormat::Yv12 => PixelLayout::Yv12,
                VideoFormat::Gray8 => PixelLayout::Gray8,
                VideoFormat::Uyvy => PixelLayout::Uyvy,
                VideoFormat::Rgb16 => PixelLayout::Rgb16,
                _ => return None,
            };
            Some(layout)
        }

        pub fn video_format(self) -> VideoFormat {
            VideoFormat::from_string(self.name())
        }
    }
}
