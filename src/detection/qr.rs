//! QR decoding engine backed by `rqrr`

use rqrr::PreparedImage;
use tracing::{debug, trace};

use crate::detection::image::{BarcodeDecoder, ImageView, ReaderOptions};
use crate::detection::types::{BarcodeFormats, BarcodeResult, Point2D, Quad, Symbology};
use crate::error::Result;

/// Reads QR codes only; every other symbology is reported as not found.
#[derive(Debug, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeDecoder for QrDecoder {
    fn read_barcodes(
        &mut self,
        image: &ImageView<'_>,
        options: &ReaderOptions,
    ) -> Result<Vec<BarcodeResult>> {
        if !options.formats.contains(BarcodeFormats::QR_CODE) {
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let mut prepared = PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.luma_at(x as u32, y as u32),
        );
        let grids = prepared.detect_grids();

        let mut results = Vec::with_capacity(grids.len());
        for grid in grids {
            let content = match grid.decode() {
                Ok((_, content)) => content,
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR grid");
                    continue;
                }
            };

            // rqrr reports corners clockwise from the top-left
            let [tl, tr, br, bl] = grid.bounds;
            let location = Quad {
                top_left: Point2D::new(tl.x, tl.y),
                top_right: Point2D::new(tr.x, tr.y),
                bottom_left: Point2D::new(bl.x, bl.y),
                bottom_right: Point2D::new(br.x, br.y),
            };

            results.push(BarcodeResult::new(content, Symbology::QrCode, location));
        }

        trace!(
            count = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "QR scan complete"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{FrameGeometry, PixelLayout};
    use crate::detection::image::ImageFormat;

    #[test]
    fn blank_frame_has_no_codes() {
        let geometry = FrameGeometry::packed(PixelLayout::Gray8, 64, 64);
        let data = vec![255u8; geometry.plane_len()];
        let view = ImageView::new(&data, &geometry, ImageFormat::Lum).unwrap();

        let found = QrDecoder::new()
            .read_barcodes(&view, &ReaderOptions::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn disabled_qr_format_short_circuits() {
        let geometry = FrameGeometry::packed(PixelLayout::Gray8, 8, 8);
        let data = vec![0u8; geometry.plane_len()];
        let view = ImageView::new(&data, &geometry, ImageFormat::Lum).unwrap();

        let options = ReaderOptions::new(BarcodeFormats::LINEAR_CODES);
        assert!(QrDecoder::new().read_barcodes(&view, &options).unwrap().is_empty());
    }
}
