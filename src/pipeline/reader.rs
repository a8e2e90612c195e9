//! The barcode reader element: properties, negotiation and the per-frame
//! entry point the video host calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::frame::{FrameGeometry, PixelLayout, VideoFrame};
use crate::detection::{BarcodeDecoder, BarcodeFormats, ImageFormat, ImageView, ReaderOptions, Timestamp};
use crate::error::{ReaderError, Result};
use crate::pipeline::processor::FrameProcessor;
use crate::pipeline::sink::{DetectionEvent, DetectionSink};
use crate::{DedupConfig, ReaderConfig};

/// Runtime properties, swapped atomically and read once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    pub enable_reader: bool,
    pub barcode_formats: BarcodeFormats,
    pub show_location: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            enable_reader: true,
            barcode_formats: BarcodeFormats::ANY,
            show_location: true,
        }
    }
}

impl TryFrom<&ReaderConfig> for ReaderSettings {
    type Error = ReaderError;

    fn try_from(config: &ReaderConfig) -> Result<Self> {
        Ok(Self {
            enable_reader: config.enable_reader,
            barcode_formats: config.barcode_formats.parse()?,
            show_location: config.show_location,
        })
    }
}

struct Stream {
    processor: FrameProcessor,
    image_format: ImageFormat,
}

struct ReaderState {
    decoder: Box<dyn BarcodeDecoder>,
    options: ReaderOptions,
    stream: Option<Stream>,
}

/// In-place video filter that outlines barcodes and reports new ones
pub struct BarcodeReader {
    settings: ArcSwap<ReaderSettings>,
    state: Mutex<ReaderState>,
    sink: Box<dyn DetectionSink>,
    dedup: DedupConfig,
}

impl BarcodeReader {
    pub fn new(
        settings: ReaderSettings,
        dedup: DedupConfig,
        decoder: impl BarcodeDecoder + 'static,
        sink: impl DetectionSink + 'static,
    ) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            state: Mutex::new(ReaderState {
                decoder: Box::new(decoder),
                options: ReaderOptions::new(settings.barcode_formats),
                stream: None,
            }),
            sink: Box::new(sink),
            dedup,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> ReaderSettings {
        **self.settings.load()
    }

    pub fn enable_reader(&self) -> bool {
        self.settings.load().enable_reader
    }

    pub fn set_enable_reader(&self, enable_reader: bool) {
        self.settings.rcu(|current| ReaderSettings {
            enable_reader,
            ..**current
        });
    }

    pub fn barcode_formats(&self) -> BarcodeFormats {
        self.settings.load().barcode_formats
    }

    /// Change the symbologies searched for; the engine options are rebuilt
    /// before the next frame.
    pub fn set_barcode_formats(&self, barcode_formats: BarcodeFormats) {
        let mut state = self.lock_state();
        self.settings.rcu(|current| ReaderSettings {
            barcode_formats,
            ..**current
        });
        state.options = ReaderOptions::new(barcode_formats);
        debug!(formats = ?barcode_formats, "Reader options rebuilt");
    }

    pub fn show_location(&self) -> bool {
        self.settings.load().show_location
    }

    pub fn set_show_location(&self, show_location: bool) {
        self.settings.rcu(|current| ReaderSettings {
            show_location,
            ..**current
        });
    }

    /// Stream format negotiation. Selects the pixel writer and starts fresh
    /// dedup state; fails when the decoder cannot read `layout`.
    #[instrument(skip(self))]
    pub fn set_info(&self, layout: PixelLayout, geometry: FrameGeometry) -> Result<()> {
        let mut state = self.lock_state();
        state.options = ReaderOptions::new(self.barcode_formats());

        let Some(image_format) = ImageFormat::for_layout(layout) else {
            warn!(%layout, "Layout cannot be decoded, refusing caps");
            state.stream = None;
            return Err(ReaderError::NotNegotiated);
        };

        info!(
            %layout,
            width = geometry.width,
            height = geometry.height,
            stride = geometry.stride,
            "Stream negotiated"
        );
        state.stream = Some(Stream {
            processor: FrameProcessor::new(layout, geometry, &self.dedup),
            image_format,
        });
        Ok(())
    }

    pub fn is_negotiated(&self) -> bool {
        self.lock_state().stream.is_some()
    }

    pub fn negotiated(&self) -> Option<(PixelLayout, FrameGeometry)> {
        self.lock_state()
            .stream
            .as_ref()
            .map(|stream| (stream.processor.layout(), *stream.processor.geometry()))
    }

    /// Stream teardown: drops writer selection and dedup state
    pub fn teardown(&self) {
        if self.lock_state().stream.take().is_some() {
            debug!("Stream state released");
        }
    }

    /// Process one frame in place, stamping it with the wall clock
    pub fn transform_frame_ip(&self, frame: &mut VideoFrame) -> Result<usize> {
        self.transform_frame_at(frame, Timestamp::now())
    }

    /// Process one frame in place at `now`. Returns how many barcodes were
    /// notified for it.
    #[instrument(skip(self, frame), fields(sequence = frame.meta.sequence))]
    pub fn transform_frame_at(&self, frame: &mut VideoFrame, now: Timestamp) -> Result<usize> {
        let start = Instant::now();
        let settings = self.settings();

        let emitted = {
            let mut guard = self.lock_state();
            let ReaderState {
                decoder,
                options,
                stream,
            } = &mut *guard;

            let Some(stream) = stream.as_mut() else {
                error!("Not negotiated yet");
                return Err(ReaderError::NotNegotiated);
            };

            let layout = stream.processor.layout();
            let geometry = *stream.processor.geometry();
            if frame.meta.layout != layout || frame.meta.geometry != geometry {
                error!(
                    expected = %layout,
                    got = %frame.meta.layout,
                    "Frame does not match negotiated format"
                );
                return Err(ReaderError::FrameMismatch {
                    layout,
                    expected: geometry,
                    got_layout: frame.meta.layout,
                    got: frame.meta.geometry,
                });
            }

            if !settings.enable_reader || settings.barcode_formats.is_empty() {
                return Ok(0);
            }

            metrics::counter!("barcode_frames_total").increment(1);

            let barcodes = {
                let image = ImageView::new(&frame.data, &geometry, stream.image_format)?;
                decoder.read_barcodes(&image, options)?
            };

            stream
                .processor
                .process_frame(&mut frame.data, &barcodes, settings.show_location, now)
        };

        metrics::histogram!("frame_process_time_us").record(start.elapsed().as_micros() as f64);

        if emitted.is_empty() {
            return Ok(0);
        }

        // Notify with the lock released so handlers may change properties
        let event = DetectionEvent::new(frame.meta.sequence, &emitted);
        debug!(count = event.len(), "Emitting barcode event");
        metrics::counter!("barcode_events_total").increment(1);
        metrics::counter!("barcodes_emitted_total").increment(event.len() as u64);
        self.sink.on_barcodes(&event);

        Ok(emitted.len())
    }
}

impl Drop for BarcodeReader {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Shared handle for hosts that drive frames and properties from different
/// threads
pub type SharedReader = Arc<BarcodeReader>;
