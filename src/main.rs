//! Barcode reader: outlines barcodes in video and prints new detections as
//! JSON lines

use std::path::{Path, PathBuf};

use barcodereader::capture::{FrameGeometry, PixelLayout, VideoFrame};
use barcodereader::detection::QrDecoder;
use barcodereader::{BarcodeReader, Config, DetectionEvent, ReaderSettings};
use bytes::BytesMut;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "barcodereader", version, about = "Barcode overlay and detection events for video")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the searched formats, e.g. "qr-code+ean-13"
    #[arg(long, global = true)]
    formats: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read frames from a camera or test source
    Live,
    /// Run a single image through the reader and save the annotated result
    Still { input: PathBuf, output: PathBuf },
}

fn print_event(event: &DetectionEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "Failed to serialize detection event"),
    }
}

fn build_reader(config: &Config) -> Result<BarcodeReader> {
    let settings = ReaderSettings::try_from(&config.reader)?;
    Ok(BarcodeReader::new(
        settings,
        config.dedup.clone(),
        QrDecoder::new(),
        print_event,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barcodereader=info")),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(formats) = cli.formats {
        config.reader.barcode_formats = formats;
    }

    match cli.command {
        Command::Live => run_live(config).await,
        Command::Still { input, output } => run_still(&config, &input, &output),
    }
}

fn run_still(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let image = image::open(input)?.to_rgba8();
    let (width, height) = image.dimensions();
    info!("Loaded {} ({}x{})", input.display(), width, height);

    let layout = PixelLayout::Rgba;
    let geometry = FrameGeometry::packed(layout, width, height);
    let mut frame = VideoFrame::new(BytesMut::from(image.as_raw().as_slice()), layout, geometry);

    let reader = build_reader(config)?;
    reader.set_info(layout, geometry)?;
    let count = reader.transform_frame_ip(&mut frame)?;
    info!("{} barcode(s) reported", count);

    let annotated = image::RgbaImage::from_raw(width, height, frame.data.to_vec())
        .ok_or_else(|| eyre!("Annotated frame does not match image dimensions"))?;
    annotated.save(output)?;
    info!("Wrote {}", output.display());
    Ok(())
}

#[cfg(feature = "gstreamer-pipeline")]
async fn run_live(config: Config) -> Result<()> {
    use std::sync::Arc;

    use barcodereader::capture::GstCapture;
    use barcodereader::pipeline::SharedReader;
    use barcodereader::utils;

    let mut capture_config = config.capture.clone();
    if capture_config.custom_source.is_none() && capture_config.device != "test" {
        capture_config.device = utils::resolve_device(&capture_config.device)?;
    }
    info!("Using capture source: {}", capture_config.device);

    let mut capture = GstCapture::new(&capture_config)?;
    let stop = capture.stop_handle();
    capture.start_stream()?;

    let reader: SharedReader = Arc::new(build_reader(&config)?);
    let (tx, rx) = flume::bounded::<VideoFrame>(capture_config.max_buffers.max(1) as usize);

    let capture_handle = tokio::task::spawn_blocking(move || loop {
        match capture.pull_frame() {
            Ok(Some(frame)) => {
                if let Err(e) = tx.send(frame) {
                    warn!("Failed to send frame: {}", e);
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Capture error: {}", e);
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    });

    let display_config = config.display.clone();
    let fps = capture_config.fps;
    let mut processing =
        tokio::task::spawn_blocking(move || process_frames(rx, reader, &display_config, fps));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, draining pipeline");
            stop.request_stop();
            (&mut processing).await??;
        }
        result = &mut processing => {
            stop.request_stop();
            result??;
        }
    }

    capture_handle.await?;
    info!("Barcode reader shutting down");
    Ok(())
}

#[cfg(not(feature = "gstreamer-pipeline"))]
async fn run_live(_config: Config) -> Result<()> {
    Err(eyre!("Live capture requires the gstreamer-pipeline feature"))
}

#[cfg(feature = "gstreamer-pipeline")]
fn process_frames(
    rx: flume::Receiver<VideoFrame>,
    reader: barcodereader::pipeline::SharedReader,
    display_config: &barcodereader::DisplayConfig,
    fps: u32,
) -> Result<()> {
    use barcodereader::display::GstFrameDisplay;

    let mut caps: Option<(PixelLayout, FrameGeometry)> = None;
    let mut display: Option<GstFrameDisplay> = None;

    for mut frame in rx.iter() {
        let frame_caps = (frame.meta.layout, frame.meta.geometry);
        if caps != Some(frame_caps) {
            caps = Some(frame_caps);
            if let Err(e) = reader.set_info(frame_caps.0, frame_caps.1) {
                warn!("Negotiation failed for {}: {}", frame_caps.0, e);
            }
            if display_config.enabled {
                let mut sink = GstFrameDisplay::new(display_config, frame_caps.0, frame_caps.1, fps)?;
                sink.start()?;
                display = Some(sink);
            }
        }

        if let Err(e) = reader.transform_frame_ip(&mut frame) {
            warn!(sequence = frame.meta.sequence, "Frame rejected: {}", e);
        }

        if let Some(sink) = display.as_ref().filter(|sink| sink.accepts(&frame)) {
            if let Err(e) = sink.push_frame(&frame) {
                warn!("Display error: {}", e);
            }
        }

        metrics::histogram!("frame_latency_ms").record(frame.timestamp.elapsed().as_millis() as f64);
    }

    reader.teardown();
    Ok(())
}
