//! GStreamer appsink source delivering raw frames in a fixed layout

use std::time::Instant;

use bytes::BytesMut;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use tracing::{debug, info, warn};

use crate::capture::frame::{FrameGeometry, FrameMetadata, PixelLayout, VideoFrame};
use crate::error::{ReaderError, Result};
use crate::CaptureConfig;

fn pipeline_err(context: &str, e: impl std::fmt::Debug) -> ReaderError {
    ReaderError::Pipeline(format!("{context}: {e:?}"))
}

/// Camera or test source converted to the configured layout
pub struct GstCapture {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    sequence: u64,
}

/// Ends a running capture from another thread by injecting EOS, which
/// unblocks a pending [`GstCapture::pull_frame`]
#[derive(Clone)]
pub struct CaptureStopHandle {
    pipeline: gst::Pipeline,
}

impl CaptureStopHandle {
    pub fn request_stop(&self) {
        if !self.pipeline.send_event(gst::event::Eos::new()) {
            warn!("Capture pipeline did not accept EOS");
        }
    }
}

impl GstCapture {
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        gst::init().map_err(|e| pipeline_err("Failed to initialize GStreamer", e))?;

        let pipeline_str = Self::build_pipeline_string(config);
        info!("Capture pipeline: {}", pipeline_str);

        let pipeline = gst::parse::launch(&pipeline_str)
            .map_err(|e| pipeline_err("Failed to parse pipeline", e))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| ReaderError::Pipeline("Failed to create pipeline".into()))?;

        let appsink = pipeline
            .by_name("appsink")
            .ok_or_else(|| ReaderError::Pipeline("Failed to find appsink element".into()))?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| ReaderError::Pipeline("Failed to cast to AppSink".into()))?;

        appsink.set_property("emit-signals", false);
        appsink.set_property("max-buffers", config.max_buffers);
        appsink.set_property("drop", true);
        appsink.set_property("sync", false);

        Ok(Self {
            pipeline,
            appsink,
            sequence: 0,
        })
    }

    fn build_pipeline_string(config: &CaptureConfig) -> String {
        let source = match (&config.custom_source, config.device.as_str()) {
            (Some(custom), _) => custom.clone(),
            (None, "test") => "videotestsrc is-live=true pattern=smpte".to_string(),
            (None, device) => format!("v4l2src device={device}"),
        };

        format!(
            "{source} name=source ! \
             queue max-size-buffers=2 max-size-time=0 max-size-bytes=0 ! \
             videoconvert ! videoscale ! \
             video/x-raw,format={},width={},height={},framerate={}/1 ! \
             appsink name=appsink",
            config.layout, config.width, config.height, config.fps
        )
    }

    pub fn stop_handle(&self) -> CaptureStopHandle {
        CaptureStopHandle {
            pipeline: self.pipeline.clone(),
        }
    }

    pub fn start_stream(&mut self) -> Result<()> {
        info!("Starting capture pipeline");

        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| pipeline_err("Failed to start pipeline", e))?;

        let (state_change, _, _) = self.pipeline.state(Some(gst::ClockTime::from_seconds(5)));
        match state_change {
            Ok(gst::StateChangeSuccess::Success) => {
                info!("Pipeline started successfully");
                Ok(())
            }
            Ok(gst::StateChangeSuccess::Async) | Ok(gst::StateChangeSuccess::NoPreroll) => {
                info!("Pipeline starting asynchronously");
                Ok(())
            }
            Err(e) => Err(pipeline_err("Failed to start pipeline", e)),
        }
    }

    pub fn stop_stream(&mut self) -> Result<()> {
        info!("Stopping capture pipeline");
        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| pipeline_err("Failed to stop pipeline", e))?;
        Ok(())
    }

    /// Pull the next frame, blocking. `Ok(None)` at end of stream.
    pub fn pull_frame(&mut self) -> Result<Option<VideoFrame>> {
        let timestamp = Instant::now();

        let sample = match self.appsink.pull_sample() {
            Ok(sample) => sample,
            Err(_) if self.appsink.is_eos() => {
                info!("Capture reached end of stream");
                return Ok(None);
            }
            Err(e) => return Err(pipeline_err("Failed to pull sample", e)),
        };

        let buffer = sample
            .buffer()
            .ok_or_else(|| ReaderError::Pipeline("Sample contains no buffer".into()))?;
        let caps = sample
            .caps()
            .ok_or_else(|| ReaderError::Pipeline("Sample has no caps".into()))?;
        let info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| pipeline_err("Failed to parse video info from caps", e))?;

        let layout = PixelLayout::from_video_format(info.format())
            .ok_or_else(|| ReaderError::UnsupportedLayout(info.format().to_str().to_string()))?;

        let map = buffer
            .map_readable()
            .map_err(|e| pipeline_err("Failed to map buffer", e))?;
        let data = BytesMut::from(map.as_slice());

        let stride = info.stride()[0];
        if stride <= 0 {
            warn!(stride, "Negative or zero stride, falling back to packed rows");
        }
        let geometry = if stride > 0 {
            FrameGeometry {
                width: info.width(),
                height: info.height(),
                stride: stride as usize,
            }
        } else {
            FrameGeometry::packed(layout, info.width(), info.height())
        };

        self.sequence += 1;
        debug!(sequence = self.sequence, %layout, bytes = data.len(), "Frame captured");

        Ok(Some(VideoFrame {
            data,
            meta: FrameMetadata {
                sequence: self.sequence,
                layout,
                geometry,
                pts: buffer.pts().map(|pts| pts.into()),
            },
            timestamp,
        }))
    }
}

impl Drop for GstCapture {
    fn drop(&mut self) {
        let _ = self.stop_stream();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_uses_configured_layout() {
        let config = CaptureConfig {
            device: "test".into(),
            layout: PixelLayout::Yuy2,
            ..CaptureConfig::default()
        };
        let pipeline = GstCapture::build_pipeline_string(&config);
        assert!(pipeline.starts_with("videotestsrc"));
        assert!(pipeline.contains("format=YUY2,width=640,height=480,framerate=30/1"));
        assert!(pipeline.ends_with("appsink name=appsink"));
    }

    #[test]
    fn custom_source_wins() {
        let config = CaptureConfig {
            custom_source: Some("filesrc location=codes.mp4 ! decodebin".into()),
            ..CaptureConfig::default()
        };
        assert!(GstCapture::build_pipeline_string(&config).starts_with("filesrc location=codes.mp4"));
    }
}
