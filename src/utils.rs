use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info};
use v4l::{capability::Flags, video::Capture, Device};

/// First V4L2 node that can capture video and offers at least one format
pub fn auto_detect_device() -> Result<String> {
    info!("Auto-detecting capture devices...");

    for i in 0..10 {
        let path = format!("/dev/video{}", i);
        if !Path::new(&path).exists() {
            continue;
        }

        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            debug!("Skipping {} ({}): no capture capability", path, caps.card);
            continue;
        }

        match dev.enum_formats() {
            Ok(formats) if !formats.is_empty() => {
                info!("Found capture device: {} - {}", path, caps.card);
                return Ok(path);
            }
            _ => debug!("Skipping {} ({}): no formats", path, caps.card),
        }
    }

    Err(eyre!("No suitable capture device found"))
}

/// Resolve the configured device name to something the capture pipeline
/// understands
pub fn resolve_device(device: &str) -> Result<String> {
    match device {
        "auto" => auto_detect_device(),
        other => Ok(other.to_string()),
    }
}
