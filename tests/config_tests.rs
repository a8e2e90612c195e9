use std::io::Write;

use barcodereader::capture::PixelLayout;
use barcodereader::{BarcodeFormats, Config, ReaderSettings};

#[test]
fn defaults_without_file() {
    let config = Config::load(None).unwrap();

    assert!(config.reader.enable_reader);
    assert!(config.reader.show_location);
    assert_eq!(config.reader.barcode_formats, "any");
    assert_eq!(config.dedup.refresh_interval_secs, 2);
    assert_eq!(config.capture.layout, PixelLayout::Bgrx);
    assert_eq!(config.capture.device, "auto");
}

#[test]
fn toml_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[reader]
barcode_formats = "qr-code+ean-13"
show_location = false

[dedup]
refresh_interval_secs = 5

[capture]
device = "test"
layout = "YUY2"
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.dedup.refresh_interval_secs, 5);
    assert_eq!(config.dedup.max_tracked, 4096);
    assert_eq!(config.capture.layout, PixelLayout::Yuy2);
    assert_eq!(config.capture.width, 640);

    let settings = ReaderSettings::try_from(&config.reader).unwrap();
    assert!(settings.enable_reader);
    assert!(!settings.show_location);
    assert_eq!(
        settings.barcode_formats,
        BarcodeFormats::QR_CODE | BarcodeFormats::EAN_13
    );
}

#[test]
fn unknown_layout_is_a_config_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[capture]\nlayout = \"P010\"").unwrap();

    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn unknown_format_nick_fails_settings() {
    let mut config = Config::default();
    config.reader.barcode_formats = "qr-code+nonsense".into();

    assert!(ReaderSettings::try_from(&config.reader).is_err());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
}
