//! Delivery of detection events to the pipeline consumer

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::detection::BarcodeResult;

/// One barcode as seen by consumers: plain name/value pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeInfo {
    pub text: String,
    pub format: String,
}

/// Batch emitted for a single frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub sequence: u64,
    pub barcodes: Vec<BarcodeInfo>,
}

impl DetectionEvent {
    pub fn new(sequence: u64, results: &[BarcodeResult]) -> Self {
        Self {
            sequence,
            barcodes: results
                .iter()
                .map(|result| BarcodeInfo {
                    text: result.text.clone(),
                    format: result.symbology.to_string(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

/// Receiver of detection events. Called synchronously on the streaming
/// thread, at most once per frame.
pub trait DetectionSink: Send + Sync {
    fn on_barcodes(&self, event: &DetectionEvent);
}

impl<F> DetectionSink for F
where
    F: Fn(&DetectionEvent) + Send + Sync,
{
    fn on_barcodes(&self, event: &DetectionEvent) {
        self(event)
    }
}

impl DetectionSink for flume::Sender<DetectionEvent> {
    fn on_barcodes(&self, event: &DetectionEvent) {
        if let Err(e) = self.try_send(event.clone()) {
            warn!(error = %e, sequence = event.sequence, "Dropped detection event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Quad, Symbology};

    #[test]
    fn event_carries_names() {
        let results = vec![
            BarcodeResult::new("ABC123", Symbology::QrCode, Quad::default()),
            BarcodeResult::new("4006381333931", Symbology::Ean13, Quad::default()),
        ];
        let event = DetectionEvent::new(7, &results);

        assert_eq!(event.len(), 2);
        assert_eq!(event.barcodes[0].format, "QRCode");
        assert_eq!(event.barcodes[1].format, "EAN-13");
        assert_eq!(event.barcodes[1].text, "4006381333931");
    }

    #[test]
    fn flume_sink_forwards() {
        let (tx, rx) = flume::unbounded::<DetectionEvent>();
        let event = DetectionEvent::new(1, &[BarcodeResult::new("X", Symbology::Aztec, Quad::default())]);
        tx.on_barcodes(&event);
        assert_eq!(rx.try_recv().unwrap(), event);
    }
}
