pub mod processor;
pub mod reader;
pub mod sink;

pub use processor::FrameProcessor;
pub use reader::{BarcodeReader, ReaderSettings, SharedReader};
pub use sink::{BarcodeInfo, DetectionEvent, DetectionSink};
