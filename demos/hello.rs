//! Plays a media file with `playbin` built from a launch line.
//!
//! Usage:
//!   cargo run --example hello -- --uri file:///code/ra.mp4

use anyhow::Context;
use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::bus::{run_until_done, RunOptions};

mod common;

#[derive(Parser, Debug)]
struct HelloParams {
    /// Media URI to play
    #[clap(short, long, default_value = "file:///code/ra.mp4")]
    uri: String,
}

fn example_main() -> anyhow::Result<()> {
    let args = HelloParams::parse();
    common::init()?;
    gstrtmpmix::ffi::rtmpmix_show_version();

    let pipeline = gst::parse::launch(&format!(
        "playbin uri={} video-sink=ximagesink",
        args.uri
    ))?
    .downcast::<gst::Pipeline>()
    .map_err(|_| anyhow::anyhow!("launch line did not produce a pipeline"))?;

    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to start playing the pipeline.")?;

    let result = run_until_done(&pipeline, &RunOptions::default());
    pipeline.set_state(gst::State::Null)?;
    result?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
