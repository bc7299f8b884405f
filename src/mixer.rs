use crate::bus;
use crate::common::{dump_dot, link_chain, link_pads, make_element, request_pad, static_pad, CAT};
use crate::error::{Error, Result};
use crate::layout::{MixerLayout, Stage, Tile};
use crate::pads::{connect_pad_added, PadRoute};
use crate::relay::add_publisher;
use gstreamer as gst;
use gstreamer::prelude::*;

/// Where the composited picture goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A local X window.
    Display,
    /// Re-published as H.264/FLV to an RTMP location.
    Rtmp(String),
}

impl Output {
    /// `display` or an `rtmp://` location.
    pub fn parse(value: &str) -> Self {
        if value == "display" {
            Output::Display
        } else {
            Output::Rtmp(value.to_string())
        }
    }
}

/// One RTMP input per layout tile, composited by `videomixer`.
pub struct MixerPipeline {
    pipeline: gst::Pipeline,
    mixer_pads: Vec<gst::Pad>,
}

impl MixerPipeline {
    pub fn build(layout: &MixerLayout, sources: &[String], output: &Output) -> Result<Self> {
        layout.validate()?;
        if sources.len() != layout.tiles.len() {
            return Err(Error::InvalidLayout(format!(
                "layout '{}' needs {} sources, got {}",
                layout.name,
                layout.tiles.len(),
                sources.len()
            )));
        }

        let pipeline = gst::Pipeline::with_name(&layout.name);
        dump_dot(&pipeline, "afterinit");

        let mixer = make_element("videomixer", "mixer")?;
        let output_converter = make_element("videoconvert", "output_converter")?;
        pipeline.add_many([&mixer, &output_converter])?;
        link_chain(&[&mixer, &output_converter])?;

        match output {
            Output::Display => {
                let sink = make_element("ximagesink", "output_sink")?;
                pipeline.add(&sink)?;
                link_chain(&[&output_converter, &sink])?;
            }
            Output::Rtmp(location) => {
                let encoder = add_publisher(pipeline.upcast_ref(), location)?;
                link_chain(&[&output_converter, &encoder])?;
            }
        }

        let mut mixer_pads = Vec::with_capacity(layout.tiles.len());
        for (index, (tile, location)) in layout.tiles.iter().zip(sources).enumerate() {
            let tail = Self::add_tile(&pipeline, index, tile, location)?;

            let mixer_pad = request_pad(&mixer, "sink_%u")?;
            link_pads(&static_pad(&tail, "src")?, &mixer_pad)?;
            Self::place(&mixer_pad, tile);
            mixer_pads.push(mixer_pad);
        }

        dump_dot(&pipeline, "afterelementlink");

        Ok(Self {
            pipeline,
            mixer_pads,
        })
    }

    /// Builds `rtmpsrc ! decodebin ! stage [! capsfilter] [! videobox]` for a
    /// tile and returns the last element of the branch.
    fn add_tile(
        pipeline: &gst::Pipeline,
        index: usize,
        tile: &Tile,
        location: &str,
    ) -> Result<gst::Element> {
        let label = &tile.label;
        let source = make_element("rtmpsrc", &format!("source{}", index + 1))?;
        source.set_property("location", location);
        let decoder = make_element("decodebin", &format!("{}_decoder", label))?;
        pipeline.add_many([&source, &decoder])?;
        link_chain(&[&source, &decoder])?;

        let mut chain = Vec::new();
        if tile.stage == Stage::Scale {
            chain.push(make_element("videoscale", &format!("{}_scaler", label))?);
        }
        chain.push(make_element("videoconvert", &format!("{}_converter", label))?);

        if let Some(caps) = tile.caps() {
            let filter = make_element("capsfilter", &format!("{}_caps", label))?;
            filter.set_property("caps", &caps);
            chain.push(filter);
        }

        if let Some(crop) = tile.crop {
            let videobox = make_element("videobox", &format!("{}_videobox", label))?;
            videobox.set_property("left", crop.left);
            videobox.set_property("right", crop.right);
            videobox.set_property("top", crop.top);
            videobox.set_property("bottom", crop.bottom);
            chain.push(videobox);
        }

        let refs: Vec<&gst::Element> = chain.iter().collect();
        pipeline.add_many(refs.iter().copied())?;
        link_chain(&refs)?;

        connect_pad_added(&decoder, PadRoute::video_only(&chain[0]));

        gst::debug!(CAT, obj = pipeline, "tile '{}' reads {}", label, location);
        Ok(chain[chain.len() - 1].clone())
    }

    fn place(pad: &gst::Pad, tile: &Tile) {
        pad.set_property("xpos", tile.xpos);
        pad.set_property("ypos", tile.ypos);
        if let Some(zorder) = tile.zorder {
            pad.set_property("zorder", zorder);
        }
        if let Some(alpha) = tile.alpha {
            pad.set_property("alpha", alpha);
        }
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    /// Plays until EOS or an error, then releases the mixer pads.
    pub fn run(self) -> Result<()> {
        let result = bus::run_live(&self.pipeline);

        if let Some(mixer) = self.pipeline.by_name("mixer") {
            for pad in &self.mixer_pads {
                mixer.release_request_pad(pad);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::init_for_tests;

    #[test]
    fn output_parsing() {
        assert_eq!(Output::parse("display"), Output::Display);
        assert_eq!(
            Output::parse("rtmp://host/app/stream"),
            Output::Rtmp("rtmp://host/app/stream".to_string())
        );
    }

    #[test]
    fn source_count_must_match_tiles() {
        init_for_tests();
        let layout = MixerLayout::preset("quad").unwrap();
        let sources = vec!["rtmp://host/app/a".to_string()];
        match MixerPipeline::build(&layout, &sources, &Output::Display) {
            Err(Error::InvalidLayout(msg)) => assert!(msg.contains("needs 4 sources, got 1")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("mismatched sources were accepted"),
        }
    }
}
