//! Per-stream frame processing: overlay plus deduplication

use tracing::{debug, trace};

use crate::capture::frame::{FrameGeometry, PixelLayout};
use crate::detection::{BarcodeResult, Deduplicator, Timestamp};
use crate::overlay::{draw_quad, PixelWriter};
use crate::DedupConfig;

/// Owns everything one negotiated stream mutates between frames: the pixel
/// writer chosen for its layout and the dedup state.
#[derive(Debug)]
pub struct FrameProcessor {
    layout: PixelLayout,
    geometry: FrameGeometry,
    writer: Option<PixelWriter>,
    dedup: Deduplicator,
}

impl FrameProcessor {
    pub fn new(layout: PixelLayout, geometry: FrameGeometry, dedup: &DedupConfig) -> Self {
        let writer = PixelWriter::select(layout);
        if writer.is_none() {
            debug!(%layout, "No pixel writer for layout, overlay disabled");
        }

        Self {
            layout,
            geometry,
            writer,
            dedup: Deduplicator::new(dedup),
        }
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn geometry(&self) -> &FrameGeometry {
        &self.geometry
    }

    pub fn writer(&self) -> Option<&PixelWriter> {
        self.writer.as_ref()
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Outline every detection (when `draw_enabled`) and return the results
    /// that should be notified for this frame.
    ///
    /// An empty `barcodes` slice means the decoder found nothing: the frame is
    /// left untouched and dedup state is not consulted.
    pub fn process_frame(
        &mut self,
        buffer: &mut [u8],
        barcodes: &[BarcodeResult],
        draw_enabled: bool,
        now: Timestamp,
    ) -> Vec<BarcodeResult> {
        if barcodes.is_empty() {
            return Vec::new();
        }

        if draw_enabled {
            for barcode in barcodes {
                draw_quad(self.writer.as_ref(), buffer, &self.geometry, &barcode.location);
            }
        }

        let emitted = self.dedup.reconcile(barcodes, now);
        trace!(
            detected = barcodes.len(),
            emitted = emitted.len(),
            "Frame reconciled"
        );
        emitted
    }

    /// Drop dedup state, keeping the negotiated layout
    pub fn reset(&mut self) {
        self.dedup.reset();
    }
}
