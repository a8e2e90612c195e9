//! Per-layout marker pixel writers

use crate::capture::frame::{FrameGeometry, PixelLayout};

/// Red marker in the byte order each layout stores its channels
const RGB_RED: [u8; 3] = [255, 0, 0];
const BGR_RED: [u8; 3] = [0, 0, 255];

/// Luma/chroma pairs approximating red in a YUY2 macropixel (Y0 U, Y1 V)
const YUY2_RED_EVEN: [u8; 2] = [76, 85];
const YUY2_RED_ODD: [u8; 2] = [76, 255];

const LUMA_MAX: u8 = 255;

/// Sets a single pixel to the marker colour for one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelWriter {
    /// Overwrites the whole 32-bit pixel, padding byte included
    Word([u8; 4]),
    /// Writes three colour bytes starting at `offset`, leaving alpha alone
    Color32 { offset: usize, color: [u8; 3] },
    Color24([u8; 3]),
    /// 4:2:2 packed luma/chroma, colour depends on the pixel's parity
    LumaChroma,
    /// Luma plane only
    Luma,
}

impl PixelWriter {
    /// Pick the writer for a negotiated layout, `None` when drawing is not
    /// possible for it.
    pub fn select(layout: PixelLayout) -> Option<Self> {
        let writer = match layout {
            PixelLayout::Bgrx => PixelWriter::Word([0x00, 0x00, 0xFF, 0x00]),
            PixelLayout::Xrgb => PixelWriter::Word([0x00, 0xFF, 0x00, 0x00]),
            PixelLayout::Xbgr => PixelWriter::Word([0x00, 0x00, 0x00, 0xFF]),
            PixelLayout::Rgbx => PixelWriter::Word([0xFF, 0x00, 0x00, 0x00]),
            PixelLayout::Bgra => PixelWriter::Color32 {
                offset: 0,
                color: BGR_RED,
            },
            PixelLayout::Rgba => PixelWriter::Color32 {
                offset: 0,
                color: RGB_RED,
            },
            PixelLayout::Argb => PixelWriter::Color32 {
                offset: 1,
                color: RGB_RED,
            },
            PixelLayout::Abgr => PixelWriter::Color32 {
                offset: 1,
                color: BGR_RED,
            },
            PixelLayout::Rgb => PixelWriter::Color24(RGB_RED),
            PixelLayout::Bgr => PixelWriter::Color24(BGR_RED),
            PixelLayout::Yuy2 => PixelWriter::LumaChroma,
            PixelLayout::Nv12
            | PixelLayout::Nv21
            | PixelLayout::I420
            | PixelLayout::Yv12
            | PixelLayout::Gray8 => PixelWriter::Luma,
            PixelLayout::Uyvy | PixelLayout::Rgb16 => return None,
        };
        Some(writer)
    }

    /// Bytes this writer addresses per pixel
    pub fn pixel_size(&self) -> usize {
        match self {
            PixelWriter::Word(_) | PixelWriter::Color32 { .. } => 4,
            PixelWriter::Color24(_) => 3,
            PixelWriter::LumaChroma => 2,
            PixelWriter::Luma => 1,
        }
    }

    /// Paint the pixel at (x, y). Pixels that fall outside `buffer` are ignored.
    #[inline]
    pub fn put(&self, buffer: &mut [u8], geometry: &FrameGeometry, x: u32, y: u32) {
        let base = y as usize * geometry.stride + x as usize * self.pixel_size();

        match self {
            PixelWriter::Word(bytes) => write_at(buffer, base, bytes),
            PixelWriter::Color32 { offset, color } => write_at(buffer, base + offset, color),
            PixelWriter::Color24(color) => write_at(buffer, base, color),
            PixelWriter::LumaChroma => {
                let pair = if x % 2 == 0 {
                    &YUY2_RED_EVEN
                } else {
                    &YUY2_RED_ODD
                };
                write_at(buffer, base, pair)
            }
            PixelWriter::Luma => write_at(buffer, base, &[LUMA_MAX]),
        }
    }
}

#[inline]
fn write_at(buffer: &mut [u8], offset: usize, bytes: &[u8]) {
    if let Some(dst) = buffer.get_mut(offset..offset + bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}
