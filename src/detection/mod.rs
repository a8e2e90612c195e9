pub mod dedup;
pub mod image;
#[cfg(feature = "qr-decoder")]
pub mod qr;
pub mod types;

pub use dedup::{DedupEntry, Deduplicator, ReconcileMode, Timestamp};
pub use image::{BarcodeDecoder, EanAddOn, ImageFormat, ImageView, ReaderOptions, TextMode};
#[cfg(feature = "qr-decoder")]
pub use qr::QrDecoder;
pub use types::{BarcodeFormats, BarcodeResult, Point2D, Quad, Symbology};
