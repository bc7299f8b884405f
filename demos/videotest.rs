//! `videotestsrc ! shagadelictv ! ximagesink`
//!
//! Usage:
//!   cargo run --example videotest -- --pattern 0

use anyhow::Context;
use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::bus::{run_until_done, RunOptions};
use gstrtmpmix::common::{link_chain, make_element};

mod common;

#[derive(Parser, Debug)]
struct VideoTestParams {
    /// videotestsrc pattern number
    #[clap(short, long, default_value = "0")]
    pattern: i32,
}

fn create_pipeline(pattern: i32) -> anyhow::Result<gst::Pipeline> {
    let pipeline = gst::Pipeline::with_name("test-pipeline");

    let source = make_element("videotestsrc", "source")?;
    let filter = make_element("shagadelictv", "filter")?;
    let sink = make_element("ximagesink", "sink")?;
    source.set_property_from_str("pattern", &pattern.to_string());

    pipeline.add_many([&source, &filter, &sink])?;
    link_chain(&[&source, &filter, &sink])?;

    Ok(pipeline)
}

fn example_main() -> anyhow::Result<()> {
    let args = VideoTestParams::parse();
    common::init()?;

    let pipeline = create_pipeline(args.pattern)?;
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
