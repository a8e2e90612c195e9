//! GStreamer appsrc sink showing annotated frames

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use tracing::{info, warn};

use crate::capture::frame::{FrameGeometry, PixelLayout, VideoFrame};
use crate::error::{ReaderError, Result};
use crate::DisplayConfig;

fn pipeline_err(context: &str, e: impl std::fmt::Debug) -> ReaderError {
    ReaderError::Pipeline(format!("{context}: {e:?}"))
}

/// Display pipeline fed with frames processed in Rust
pub struct GstFrameDisplay {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    layout: PixelLayout,
    geometry: FrameGeometry,
}

impl GstFrameDisplay {
    pub fn new(
        config: &DisplayConfig,
        layout: PixelLayout,
        geometry: FrameGeometry,
        fps: u32,
    ) -> Result<Self> {
        gst::init().map_err(|e| pipeline_err("Failed to initialize GStreamer", e))?;

        let video_sink = Self::detect_video_sink();
        info!("Using video sink: {}", video_sink);

        let pipeline_str = format!(
            "appsrc name=appsrc ! videoconvert ! {}",
            Self::build_video_sink(video_sink, config.fps_overlay)
        );

        let pipeline = gst::parse::launch(&pipeline_str)
            .map_err(|e| pipeline_err("Failed to parse pipeline", e))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| ReaderError::Pipeline("Failed to create pipeline".into()))?;

        let appsrc = pipeline
            .by_name("appsrc")
            .ok_or_else(|| ReaderError::Pipeline("Failed to find appsrc".into()))?
            .downcast::<gst_app::AppSrc>()
            .map_err(|_| ReaderError::Pipeline("Failed to cast to AppSrc".into()))?;

        let caps = gst_video::VideoInfo::builder(layout.video_format(), geometry.width, geometry.height)
            .fps(gst::Fraction::new(fps as i32, 1))
            .build()
            .map_err(|e| pipeline_err("Failed to build video info", e))?
            .to_caps()
            .map_err(|e| pipeline_err("Failed to build caps", e))?;

        appsrc.set_caps(Some(&caps));
        appsrc.set_property("is-live", true);
        appsrc.set_property("block", false);
        appsrc.set_property("do-timestamp", true);
        appsrc.set_property("format", gst::Format::Time);

        Ok(Self {
            pipeline,
            appsrc,
            layout,
            geometry,
        })
    }

    fn detect_video_sink() -> &'static str {
        let sinks = [
            "glimagesink",
            "waylandsink",
            "xvimagesink",
            "ximagesink",
            "autovideosink",
        ];

        for sink in &sinks {
            if gst::ElementFactory::find(sink).is_some() {
                return sink;
            }
        }

        warn!("Using auto video sink");
        "autovideosink"
    }

    fn build_video_sink(sink_name: &str, fps_overlay: bool) -> String {
        if fps_overlay {
            format!("fpsdisplaysink video-sink={sink_name} text-overlay=true sync=false")
        } else {
            format!("{sink_name} sync=false")
        }
    }

    /// Whether frames of this layout and geometry can be pushed as-is
    pub fn accepts(&self, frame: &VideoFrame) -> bool {
        frame.meta.layout == self.layout && frame.meta.geometry == self.geometry
    }

    pub fn push_frame(&self, frame: &VideoFrame) -> Result<()> {
        let mut buffer = gst::Buffer::with_size(frame.data.len())
            .map_err(|e| pipeline_err("Failed to allocate buffer", e))?;

        {
            let buffer_ref = buffer
                .get_mut()
                .ok_or_else(|| ReaderError::Pipeline("Buffer is not writable".into()))?;
            buffer_ref
                .copy_from_slice(0, &frame.data)
                .map_err(|e| pipeline_err("Failed to copy data to buffer", e))?;
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| pipeline_err("Failed to push buffer", e))?;

        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        info!("Starting display pipeline");
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| pipeline_err("Failed to start pipeline", e))?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping display pipeline");
        let _ = self.appsrc.end_of_stream();
        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| pipeline_err("Failed to stop pipeline", e))?;
        Ok(())
    }
}

impl Drop for GstFrameDisplay {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
