//! Decoder-facing view of a frame and the engine seam

use crate::capture::frame::{FrameGeometry, PixelLayout};
use crate::detection::types::{BarcodeFormats, BarcodeResult};
use crate::error::{ReaderError, Result};

/// Pixel interpretation handed to the decoding engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 8-bit luma
    Lum,
    /// Luma followed by one other byte (packed 4:2:2)
    LumA,
    Rgb,
    Bgr,
    Rgba,
    Argb,
    Bgra,
    Abgr,
}

impl ImageFormat {
    /// How the decoder should read a negotiated layout, if it can at all.
    /// Padding bytes are read as alpha; planar layouts expose the luma plane.
    pub fn for_layout(layout: PixelLayout) -> Option<Self> {
        let format = match layout {
            PixelLayout::Bgrx | PixelLayout::Bgra => ImageFormat::Bgra,
            PixelLayout::Argb | PixelLayout::Xrgb => ImageFormat::Argb,
            PixelLayout::Abgr | PixelLayout::Xbgr => ImageFormat::Abgr,
            PixelLayout::Rgba | PixelLayout::Rgbx => ImageFormat::Rgba,
            PixelLayout::Rgb => ImageFormat::Rgb,
            PixelLayout::Bgr => ImageFormat::Bgr,
            PixelLayout::Yuy2 => ImageFormat::LumA,
            PixelLayout::Nv12
            | PixelLayout::Nv21
            | PixelLayout::Yv12
            | PixelLayout::I420
            | PixelLayout::Gray8 => ImageFormat::Lum,
            PixelLayout::Uyvy | PixelLayout::Rgb16 => return None,
        };
        Some(format)
    }

    pub fn pixel_size(self) -> usize {
        match self {
            ImageFormat::Lum => 1,
            ImageFormat::LumA => 2,
            ImageFormat::Rgb | ImageFormat::Bgr => 3,
            ImageFormat::Rgba | ImageFormat::Argb | ImageFormat::Bgra | ImageFormat::Abgr => 4,
        }
    }

    /// Byte offsets of (r, g, b) within a pixel, `None` for luma formats
    fn rgb_offsets(self) -> Option<[usize; 3]> {
        match self {
            ImageFormat::Lum | ImageFormat::LumA => None,
            ImageFormat::Rgb | ImageFormat::Rgba => Some([0, 1, 2]),
            ImageFormat::Bgr | ImageFormat::Bgra => Some([2, 1, 0]),
            ImageFormat::Argb => Some([1, 2, 3]),
            ImageFormat::Abgr => Some([3, 2, 1]),
        }
    }
}

/// Borrowed, read-only image for one decode call
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: ImageFormat,
}

impl<'a> ImageView<'a> {
    pub fn new(data: &'a [u8], geometry: &FrameGeometry, format: ImageFormat) -> Result<Self> {
        let needed = geometry.plane_len();
        if data.len() < needed {
            return Err(ReaderError::BufferTooSmall {
                len: data.len(),
                needed,
            });
        }

        Ok(Self {
            data,
            width: geometry.width,
            height: geometry.height,
            stride: geometry.stride,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Luma of the pixel at (x, y), BT.601 weights for RGB formats
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let base = y as usize * self.stride + x as usize * self.format.pixel_size();
        match self.format.rgb_offsets() {
            None => self.data.get(base).copied().unwrap_or(0),
            Some([r, g, b]) => {
                let channel = |offset: usize| self.data.get(base + offset).copied().unwrap_or(0) as u32;
                ((77 * channel(r) + 150 * channel(g) + 29 * channel(b)) >> 8) as u8
            }
        }
    }
}

/// How decoded text is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Human readable interpretation
    #[default]
    Hri,
    Plain,
}

/// Treatment of EAN/UPC add-on symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EanAddOn {
    #[default]
    Ignore,
    Read,
    Require,
}

/// Options the engine is configured with per layout/format-set change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub formats: BarcodeFormats,
    pub text_mode: TextMode,
    pub ean_add_on: EanAddOn,
}

impl ReaderOptions {
    pub fn new(formats: BarcodeFormats) -> Self {
        Self {
            formats,
            text_mode: TextMode::Hri,
            ean_add_on: EanAddOn::Ignore,
        }
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new(BarcodeFormats::ANY)
    }
}

/// Barcode decoding engine
pub trait BarcodeDecoder: Send {
    fn read_barcodes(
        &mut self,
        image: &ImageView<'_>,
        options: &ReaderOptions,
    ) -> Result<Vec<BarcodeResult>>;
}

impl<F> BarcodeDecoder for F
where
    F: FnMut(&ImageView<'_>, &ReaderOptions) -> Result<Vec<BarcodeResult>> + Send,
{
    fn read_barcodes(
        &mut self,
        image: &ImageView<'_>,
        options: &ReaderOptions,
    ) -> Result<Vec<BarcodeResult>> {
        self(image, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_drawable_layout_is_decodable() {
        for layout in PixelLayout::ALL {
            let drawable = crate::overlay::PixelWriter::select(layout).is_some();
            assert_eq!(ImageFormat::for_layout(layout).is_some(), drawable, "{layout}");
        }
    }

    #[test]
    fn padded_layouts_share_alpha_format() {
        assert_eq!(ImageFormat::for_layout(PixelLayout::Bgrx), Some(ImageFormat::Bgra));
        assert_eq!(ImageFormat::for_layout(PixelLayout::Xrgb), Some(ImageFormat::Argb));
        assert_eq!(ImageFormat::for_layout(PixelLayout::Yuy2), Some(ImageFormat::LumA));
        assert_eq!(ImageFormat::for_layout(PixelLayout::I420), Some(ImageFormat::Lum));
    }

    #[test]
    fn luma_reads_each_format() {
        let geometry = FrameGeometry::packed(PixelLayout::Argb, 1, 1);
        let white = [0u8, 255, 255, 255];
        let view = ImageView::new(&white, &geometry, ImageFormat::Argb).unwrap();
        assert_eq!(view.luma_at(0, 0), 255);

        let red = [0u8, 0, 255, 0];
        let view = ImageView::new(&red, &geometry, ImageFormat::Bgra).unwrap();
        assert_eq!(view.luma_at(0, 0), 76);

        let geometry = FrameGeometry::packed(PixelLayout::Yuy2, 2, 1);
        let yuy2 = [10u8, 128, 20, 128];
        let view = ImageView::new(&yuy2, &geometry, ImageFormat::LumA).unwrap();
        assert_eq!(view.luma_at(1, 0), 20);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let geometry = FrameGeometry::packed(PixelLayout::Gray8, 4, 4);
        let err = ImageView::new(&[0u8; 3], &geometry, ImageFormat::Lum).unwrap_err();
        assert!(matches!(err, ReaderError::BufferTooSmall { len: 3, needed: 16 }));
    }
}
