//! Decodes a URI with `uridecodebin` and links its audio and video pads as
//! they appear.
//!
//! Usage:
//!   cargo run --example dynamic -- --uri file:///home/vagrant/sintel_trailer-480p.webm

use anyhow::Context;
use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::bus::{run_until_done, RunOptions};
use gstrtmpmix::common::{link_chain, make_element};
use gstrtmpmix::pads::{connect_pad_added, PadRoute};

mod common;

#[derive(Parser, Debug)]
struct DynamicParams {
    /// Media URI to decode
    #[clap(short, long, default_value = "file:///home/vagrant/sintel_trailer-480p.webm")]
    uri: String,
}

fn create_pipeline(uri: &str) -> anyhow::Result<gst::Pipeline> {
    let pipeline = gst::Pipeline::with_name("test-pipeline");

    let source = make_element("uridecodebin", "source")?;
    let audio_converter = make_element("audioconvert", "audio_converter")?;
    let audio_sink = make_element("autoaudiosink", "audio_sink")?;
    let video_converter = make_element("videoconvert", "video_converter")?;
    let video_sink = make_element("ximagesink", "video_sink")?;

    pipeline.add_many([
        &source,
        &audio_converter,
        &video_converter,
        &audio_sink,
        &video_sink,
    ])?;
    link_chain(&[&audio_converter, &audio_sink])?;
    link_chain(&[&video_converter, &video_sink])?;

    source.set_property("uri", uri);
    connect_pad_added(&source, PadRoute::audio_video(&audio_converter, &video_converter));

    Ok(pipeline)
}

fn example_main() -> anyhow::Result<()> {
    let args = DynamicParams::parse();
    common::init()?;

    let pipeline = create_pipeline(&args.uri)?;
    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to set the pipeline to the playing state.")?;

    let opts = RunOptions {
        state_changes: true,
        ..Default::default()
    };
    let result = run_until_done(&pipeline, &opts);
    pipeline.set_state(gst::State::Null)?;
    result?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
