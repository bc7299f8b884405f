//! `rtmprelaybin`: a self-contained bin re-publishing an RTMP stream.
//!
//! The bin has no pads. Its children are created when it first goes to
//! READY, so the element can be instantiated and configured even on systems
//! lacking the RTMP or x264 plugins; the state change fails there instead.
//!
//! # Properties
//! - `source-location`: RTMP URL to pull from
//! - `sink-location`: RTMP URL to publish to
//! - `video-format`: optional raw format forced before encoding (e.g. `AYUV`)
//!
//! # Pipeline Example
//! ```bash
//! gst-launch-1.0 rtmprelaybin \
//!     source-location=rtmp://192.168.1.124:1935/yanked/rabbit \
//!     sink-location=rtmp://192.168.1.124:1935/yanked/rabbit-echo
//! ```

use crate::common::{link_chain, link_filtered, make_element, CAT};
use crate::pads::{connect_pad_added, PadRoute};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer::subclass::prelude::*;
use once_cell::sync::Lazy;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct Settings {
    source_location: Option<String>,
    sink_location: Option<String>,
    video_format: Option<String>,
}

#[derive(Default)]
pub struct RtmpRelayBin {
    settings: Mutex<Settings>,
    built: Mutex<bool>,
}

#[glib::object_subclass]
impl ObjectSubclass for RtmpRelayBin {
    const NAME: &'static str = "GstRtmpRelayBin";
    type Type = super::RtmpRelayBin;
    type ParentType = gst::Bin;
}

impl RtmpRelayBin {
    fn build_children(&self, settings: &Settings) -> Result<(), crate::Error> {
        let bin = self.obj();
        let source = make_element("rtmpsrc", "source")?;
        if let Some(location) = &settings.source_location {
            source.set_property("location", location);
        }
        let decoder = make_element("decodebin", "decoder")?;
        let converter = make_element("videoconvert", "converter")?;
        bin.add_many([&source, &decoder, &converter])?;

        let sink_location = settings.sink_location.as_deref().unwrap_or_default();
        let encoder = super::add_publisher(bin.upcast_ref(), sink_location)?;

        link_chain(&[&source, &decoder])?;
        match &settings.video_format {
            Some(format) => link_filtered(&converter, &encoder, &super::raw_video_caps(format))?,
            None => link_chain(&[&converter, &encoder])?,
        }
        connect_pad_added(&decoder, PadRoute::video_only(&converter));
        Ok(())
    }

    /// Pushes a location change to an already built child.
    fn update_child(&self, child: &str, location: Option<&str>) {
        if let (Some(element), Some(location)) = (self.obj().by_name(child), location) {
            element.set_property("location", location);
        }
    }
}

impl ObjectImpl for RtmpRelayBin {
    fn properties() -> &'static [glib::ParamSpec] {
        static PROPERTIES: Lazy<Vec<glib::ParamSpec>> = Lazy::new(|| {
            vec![
                glib::ParamSpecString::builder("source-location")
                    .nick("Source Location")
                    .blurb("RTMP URL the stream is pulled from")
                    .build(),
                glib::ParamSpecString::builder("sink-location")
                    .nick("Sink Location")
                    .blurb("RTMP URL the stream is published to")
                    .build(),
                glib::ParamSpecString::builder("video-format")
                    .nick("Video Format")
                    .blurb("Raw video format forced before encoding, e.g. AYUV")
                    .mutable_ready()
                    .build(),
            ]
        });

        PROPERTIES.as_ref()
    }

    fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
        let mut settings = self.settings.lock().unwrap();
        match pspec.name() {
            "source-location" => {
                settings.source_location = value.get().expect("type checked upstream");
                gst::info!(CAT, imp = self, "source location set to {:?}", settings.source_location);
                self.update_child("source", settings.source_location.as_deref());
            }
            "sink-location" => {
                settings.sink_location = value.get().expect("type checked upstream");
                gst::info!(CAT, imp = self, "sink location set to {:?}", settings.sink_location);
                self.update_child("sink", settings.sink_location.as_deref());
            }
            "video-format" => {
                settings.video_format = value.get().expect("type checked upstream");
            }
            _ => unimplemented!(),
        }
    }

    fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
        let settings = self.settings.lock().unwrap();
        match pspec.name() {
            "source-location" => settings.source_location.to_value(),
            "sink-location" => settings.sink_location.to_value(),
            "video-format" => settings.video_format.to_value(),
            _ => unimplemented!(),
        }
    }
}

impl GstObjectImpl for RtmpRelayBin {}

impl ElementImpl for RtmpRelayBin {
    fn metadata() -> Option<&'static gst::subclass::ElementMetadata> {
        static ELEMENT_METADATA: Lazy<gst::subclass::ElementMetadata> = Lazy::new(|| {
            gst::subclass::ElementMetadata::new(
                "RTMP Relay Bin",
                "Generic/Bin",
                "Pulls an RTMP stream, re-encodes it as H.264/FLV and publishes it again",
                "Fernando Jiménez Moreno <fernando@edgeimpulse.com>",
            )
        });
        Some(&*ELEMENT_METADATA)
    }

    fn change_state(
        &self,
        transition: gst::StateChange,
    ) -> Result<gst::StateChangeSuccess, gst::StateChangeError> {
        if transition == gst::StateChange::NullToReady {
            let mut built = self.built.lock().unwrap();
            if !*built {
                let settings = self.settings.lock().unwrap().clone();
                if settings.source_location.is_none() || settings.sink_location.is_none() {
                    gst::element_imp_error!(
                        self,
                        gst::ResourceError::Settings,
                        ["source-location and sink-location must both be set"]
                    );
                    return Err(gst::StateChangeError);
                }
                if let Err(err) = self.build_children(&settings) {
                    // drop partial children so a retry fails for the same reason
                    let obj = self.obj();
                    for child in obj.children() {
                        let _ = obj.remove(&child);
                    }
                    gst::element_imp_error!(
                        self,
                        gst::CoreError::MissingPlugin,
                        ["Failed to build relay: {}", err]
                    );
                    return Err(gst::StateChangeError);
                }
                *built = true;
            }
        }

        self.parent_change_state(transition)
    }
}

impl BinImpl for RtmpRelayBin {}
