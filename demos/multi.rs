//! Splits an `audiotestsrc` with a `tee`: one branch is played, the other
//! is drawn by `wavescope`.
//!
//! Usage:
//!   cargo run --example multi -- --freq 215

use anyhow::Context;
use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::bus::{run_until_done, RunOptions};
use gstrtmpmix::common::{link_chain, make_element, request_linked_pad};

mod common;

#[derive(Parser, Debug)]
struct MultiParams {
    /// Test tone frequency in Hz
    #[clap(short, long, default_value = "215")]
    freq: f64,
}

fn example_main() -> anyhow::Result<()> {
    let args = MultiParams::parse();
    common::init()?;

    let audio_source = make_element("audiotestsrc", "audio_source")?;
    let tee = make_element("tee", "tee")?;
    let audio_queue = make_element("queue", "audio_queue")?;
    let audio_convert = make_element("audioconvert", "audio_convert")?;
    let audio_resample = make_element("audioresample", "audio_resample")?;
    let audio_sink = make_element("autoaudiosink", "audio_sink")?;
    let video_queue = make_element("queue", "video_queue")?;
    let visual = make_element("wavescope", "visual")?;
    let video_convert = make_element("videoconvert", "csp")?;
    let video_sink = make_element("ximagesink", "video_sink")?;

    audio_source.set_property("freq", args.freq);
    visual.set_property_from_str("shader", "0");
    visual.set_property_from_str("style", "1");

    let pipeline = gst::Pipeline::with_name("multi-stuff");
    pipeline.add_many([
        &audio_source,
        &tee,
        &audio_queue,
        &audio_convert,
        &audio_resample,
        &audio_sink,
        &video_queue,
        &visual,
        &video_convert,
        &video_sink,
    ])?;

    link_chain(&[&audio_source, &tee])?;
    link_chain(&[&audio_queue, &audio_convert, &audio_resample, &audio_sink])?;
    link_chain(&[&video_queue, &visual, &video_convert, &video_sink])?;

    let tee_pads = [
        request_linked_pad(&tee, &audio_queue, "audio")?,
        request_linked_pad(&tee, &video_queue, "video")?,
    ];

    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to start playing the pipeline.")?;
    let result = run_until_done(&pipeline, &RunOptions::default());

    for pad in &tee_pads {
        tee.release_request_pad(pad);
    }
    pipeline.set_state(gst::State::Null)?;
    result?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
