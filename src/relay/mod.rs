use crate::bus;
use crate::common::{link_chain, make_element, CAT};
use crate::error::{Error, Result};
use crate::pads::{connect_pad_added, PadRoute};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod imp;

// The public Rust wrapper type for our element
glib::wrapper! {
    pub struct RtmpRelayBin(ObjectSubclass<imp::RtmpRelayBin>)
        @extends gst::Bin, gst::Element, gst::Object;
}

// GStreamer elements need to be thread-safe. For the private implementation
// this is automatically enforced but for the public wrapper type we need
// to specify this manually.
unsafe impl Send for RtmpRelayBin {}
unsafe impl Sync for RtmpRelayBin {}

pub fn register(plugin: &gst::Plugin) -> std::result::Result<(), glib::BoolError> {
    gst::Element::register(
        Some(plugin),
        "rtmprelaybin",
        gst::Rank::NONE,
        RtmpRelayBin::static_type(),
    )
}

/// Adds `x264enc ! flvmux ! rtmpsink` to `bin` and returns the encoder,
/// which is where raw video has to be linked to.
pub fn add_publisher(bin: &gst::Bin, location: &str) -> Result<gst::Element> {
    let encoder = make_element("x264enc", "encoder")?;
    let muxer = make_element("flvmux", "muxer")?;
    let sink = make_element("rtmpsink", "sink")?;

    // B-frames are not allowed in FLV for most RTMP servers
    encoder.set_property("bframes", 0u32);
    muxer.set_property("streamable", true);
    sink.set_property("location", location);

    bin.add_many([&encoder, &muxer, &sink])?;
    link_chain(&[&encoder, &muxer, &sink])?;
    Ok(encoder)
}

/// Caps restricting raw video to `format`, e.g. `AYUV`.
pub fn raw_video_caps(format: &str) -> gst::Caps {
    gst::Caps::builder("video/x-raw").field("format", format).build()
}

/// Quits a running [`Relay`] from any thread.
#[derive(Clone)]
pub struct StopHandle {
    main_loop: glib::MainLoop,
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        println!("Stopping...");
        self.stopped.store(true, Ordering::SeqCst);

        // quit from inside the loop so a stop landing before `run` is not lost
        let main_loop = self.main_loop.clone();
        glib::idle_source_new(Some("rtmpmix-stop"), glib::Priority::HIGH, move || {
            main_loop.quit();
            glib::ControlFlow::Break
        })
        .attach(Some(&self.main_loop.context()));
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Pulls one RTMP stream, decodes it and publishes it again as H.264/FLV.
pub struct Relay {
    pipeline: gst::Pipeline,
    main_loop: glib::MainLoop,
    stopped: Arc<AtomicBool>,
}

impl Relay {
    pub fn new(source: &str, sink: &str, video_format: Option<&str>) -> Result<Self> {
        let pipeline = gst::Pipeline::with_name("relay");

        let rtmp_source = make_element("rtmpsrc", "source")?;
        rtmp_source.set_property("location", source);
        let decoder = make_element("decodebin", "decoder")?;
        let converter = make_element("videoconvert", "converter")?;
        pipeline.add_many([&rtmp_source, &decoder, &converter])?;

        let encoder = add_publisher(pipeline.upcast_ref(), sink)?;

        link_chain(&[&rtmp_source, &decoder])?;
        match video_format {
            Some(format) => {
                crate::common::link_filtered(&converter, &encoder, &raw_video_caps(format))?
            }
            None => link_chain(&[&converter, &encoder])?,
        }

        connect_pad_added(&decoder, PadRoute::video_only(&converter));
        gst::info!(CAT, obj = pipeline, "relaying {} to {}", source, sink);

        Ok(Self::from_pipeline(pipeline))
    }

    /// Publishes `videotestsrc` instead of an RTMP input.
    pub fn test_source(sink: &str) -> Result<Self> {
        let pipeline = gst::Pipeline::with_name("testsourcetortmp");

        let source = make_element("videotestsrc", "source")?;
        let converter = make_element("videoconvert", "converter")?;
        pipeline.add_many([&source, &converter])?;
        let encoder = add_publisher(pipeline.upcast_ref(), sink)?;
        link_chain(&[&source, &converter, &encoder])?;

        Ok(Self::from_pipeline(pipeline))
    }

    fn from_pipeline(pipeline: gst::Pipeline) -> Self {
        Self {
            pipeline,
            main_loop: glib::MainLoop::new(None, false),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            main_loop: self.main_loop.clone(),
            stopped: self.stopped.clone(),
        }
    }

    /// Plays until EOS, an error or [`StopHandle::stop`], then goes to NULL.
    pub fn run(&self) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(());
        }

        let is_live = bus::start_live(&self.pipeline)?;
        let _guard = bus::watch(&self.pipeline, &self.main_loop, is_live)?;

        self.main_loop.run();

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|_| Error::StateChange(gst::State::Null))?;
        Ok(())
    }
}
