//! Barcode results as produced by the decoding engine

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ReaderError;

/// Integer pixel coordinate. Engines may report corners left of or above the
/// frame, so both axes are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Four corners of a detected symbol; not necessarily convex or axis-aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_left: Point2D,
    pub bottom_right: Point2D,
}

impl Quad {
    /// Axis-aligned rectangle spanning `(x0, y0)` to `(x1, y1)` inclusive
    pub fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            top_left: Point2D::new(x0, y0),
            top_right: Point2D::new(x1, y0),
            bottom_left: Point2D::new(x0, y1),
            bottom_right: Point2D::new(x1, y1),
        }
    }

    /// The four outline segments in drawing order
    pub fn edges(&self) -> [(Point2D, Point2D); 4] {
        [
            (self.top_left, self.top_right),
            (self.top_left, self.bottom_left),
            (self.top_right, self.bottom_right),
            (self.bottom_left, self.bottom_right),
        ]
    }
}

bitflags! {
    /// Set of symbologies the decoder should search for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarcodeFormats: u32 {
        const AZTEC = 1 << 0;
        const CODABAR = 1 << 1;
        const CODE_39 = 1 << 2;
        const CODE_93 = 1 << 3;
        const CODE_128 = 1 << 4;
        const DATA_BAR = 1 << 5;
        const DATA_BAR_EXPANDED = 1 << 6;
        const DATA_MATRIX = 1 << 7;
        const EAN_8 = 1 << 8;
        const EAN_13 = 1 << 9;
        const ITF = 1 << 10;
        const MAXI_CODE = 1 << 11;
        const PDF_417 = 1 << 12;
        const QR_CODE = 1 << 13;
        const UPC_A = 1 << 14;
        const UPC_E = 1 << 15;
        const MICRO_QR_CODE = 1 << 16;
        const RMQR_CODE = 1 << 17;
        const DX_FILM_EDGE = 1 << 18;
        const DATA_BAR_LIMITED = 1 << 19;

        const LINEAR_CODES = Self::CODABAR.bits()
            | Self::CODE_39.bits()
            | Self::CODE_93.bits()
            | Self::CODE_128.bits()
            | Self::EAN_8.bits()
            | Self::EAN_13.bits()
            | Self::ITF.bits()
            | Self::DATA_BAR.bits()
            | Self::DATA_BAR_EXPANDED.bits()
            | Self::DATA_BAR_LIMITED.bits()
            | Self::DX_FILM_EDGE.bits()
            | Self::UPC_A.bits()
            | Self::UPC_E.bits();
        const MATRIX_CODES = Self::AZTEC.bits()
            | Self::DATA_MATRIX.bits()
            | Self::MAXI_CODE.bits()
            | Self::PDF_417.bits()
            | Self::QR_CODE.bits()
            | Self::MICRO_QR_CODE.bits()
            | Self::RMQR_CODE.bits();
        const ANY = Self::LINEAR_CODES.bits() | Self::MATRIX_CODES.bits();
    }
}

impl FromStr for BarcodeFormats {
    type Err = ReaderError;

    /// Parses GStreamer-style flag strings: nicks joined by `+` (or `|`),
    /// e.g. `"qr-code+ean-13"`, `"linear-codes"`, `"any"`, `"none"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut formats = BarcodeFormats::empty();
        for nick in s.split(['+', '|']).map(str::trim).filter(|n| !n.is_empty()) {
            formats |= match nick {
                "none" => BarcodeFormats::empty(),
                "linear-codes" => BarcodeFormats::LINEAR_CODES,
                "matrix-codes" => BarcodeFormats::MATRIX_CODES,
                "any" => BarcodeFormats::ANY,
                other => Symbology::ALL
                    .into_iter()
                    .find(|symbology| symbology.nick() == other)
                    .map(Symbology::flag)
                    .ok_or_else(|| ReaderError::UnknownFormat(other.to_string()))?,
            };
        }
        Ok(formats)
    }
}

/// Barcode encoding standard reported with a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataBar,
    DataBarExpanded,
    DataBarLimited,
    DataMatrix,
    DxFilmEdge,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    Pdf417,
    QrCode,
    MicroQrCode,
    RmqrCode,
    UpcA,
    UpcE,
}

impl Symbology {
    pub const ALL: [Symbology; 20] = [
        Symbology::Aztec,
        Symbology::Codabar,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Code128,
        Symbology::DataBar,
        Symbology::DataBarExpanded,
        Symbology::DataBarLimited,
        Symbology::DataMatrix,
        Symbology::DxFilmEdge,
        Symbology::Ean8,
        Symbology::Ean13,
        Symbology::Itf,
        Symbology::MaxiCode,
        Symbology::Pdf417,
        Symbology::QrCode,
        Symbology::MicroQrCode,
        Symbology::RmqrCode,
        Symbology::UpcA,
        Symbology::UpcE,
    ];

    pub fn flag(self) -> BarcodeFormats {
        match self {
            Symbology::Aztec => BarcodeFormats::AZTEC,
            Symbology::Codabar => BarcodeFormats::CODABAR,
            Symbology::Code39 => BarcodeFormats::CODE_39,
            Symbology::Code93 => BarcodeFormats::CODE_93,
            Symbology::Code128 => BarcodeFormats::CODE_128,
            Symbology::DataBar => BarcodeFormats::DATA_BAR,
            Symbology::DataBarExpanded => BarcodeFormats::DATA_BAR_EXPANDED,
            Symbology::DataBarLimited => BarcodeFormats::DATA_BAR_LIMITED,
            Symbology::DataMatrix => BarcodeFormats::DATA_MATRIX,
            Symbology::DxFilmEdge => BarcodeFormats::DX_FILM_EDGE,
            Symbology::Ean8 => BarcodeFormats::EAN_8,
            Symbology::Ean13 => BarcodeFormats::EAN_13,
            Symbology::Itf => BarcodeFormats::ITF,
            Symbology::MaxiCode => BarcodeFormats::MAXI_CODE,
            Symbology::Pdf417 => BarcodeFormats::PDF_417,
            Symbology::QrCode => BarcodeFormats::QR_CODE,
            Symbology::MicroQrCode => BarcodeFormats::MICRO_QR_CODE,
            Symbology::RmqrCode => BarcodeFormats::RMQR_CODE,
            Symbology::UpcA => BarcodeFormats::UPC_A,
            Symbology::UpcE => BarcodeFormats::UPC_E,
        }
    }

    /// Name reported in detection events
    pub fn name(self) -> &'static str {
        match self {
            Symbology::Aztec => "Aztec",
            Symbology::Codabar => "Codabar",
            Symbology::Code39 => "Code39",
            Symbology::Code93 => "Code93",
            Symbology::Code128 => "Code128",
            Symbology::DataBar => "DataBar",
            Symbology::DataBarExpanded => "DataBarExpanded",
            Symbology::DataBarLimited => "DataBarLimited",
            Symbology::DataMatrix => "DataMatrix",
            Symbology::DxFilmEdge => "DXFilmEdge",
            Symbology::Ean8 => "EAN-8",
            Symbology::Ean13 => "EAN-13",
            Symbology::Itf => "ITF",
            Symbology::MaxiCode => "MaxiCode",
            Symbology::Pdf417 => "PDF417",
            Symbology::QrCode => "QRCode",
            Symbology::MicroQrCode => "MicroQRCode",
            Symbology::RmqrCode => "rMQRCode",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
        }
    }

    /// Property nick used in format strings
    pub fn nick(self) -> &'static str {
        match self {
            Symbology::Aztec => "aztec",
            Symbology::Codabar => "codabar",
            Symbology::Code39 => "code-39",
            Symbology::Code93 => "code-93",
            Symbology::Code128 => "code-128",
            Symbology::DataBar => "data-bar",
            Symbology::DataBarExpanded => "data-bar-expanded",
            Symbology::DataBarLimited => "data-bar-limited",
            Symbology::DataMatrix => "data-matrix",
            Symbology::DxFilmEdge => "dx-film-edge",
            Symbology::Ean8 => "ean-8",
            Symbology::Ean13 => "ean-13",
            Symbology::Itf => "itf",
            Symbology::MaxiCode => "maxi-code",
            Symbology::Pdf417 => "pdf417",
            Symbology::QrCode => "qr-code",
            Symbology::MicroQrCode => "micro-qr-code",
            Symbology::RmqrCode => "rm-qr-code",
            Symbology::UpcA => "upca",
            Symbology::UpcE => "upce",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded barcode in one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeResult {
    pub text: String,
    pub symbology: Symbology,
    pub location: Quad,
}

impl BarcodeResult {
    pub fn new(text: impl Into<String>, symbology: Symbology, location: Quad) -> Self {
        Self {
            text: text.into(),
            symbology,
            location,
        }
    }
}
