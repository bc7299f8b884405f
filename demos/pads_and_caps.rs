//! Prints the pad templates of `videotestsrc` and `ximagesink` and the
//! negotiated caps of the sink pad on every state change.

use anyhow::Context;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::bus::{run_until_done, RunOptions};
use gstrtmpmix::caps::{describe_pad_caps, describe_pad_templates};
use gstrtmpmix::common::link_chain;

mod common;

fn example_main() -> anyhow::Result<()> {
    common::init()?;

    let (Some(source_factory), Some(sink_factory)) = (
        gst::ElementFactory::find("videotestsrc"),
        gst::ElementFactory::find("ximagesink"),
    ) else {
        anyhow::bail!("Could not find either a source or a sink factory.");
    };

    print!("{}", describe_pad_templates(&source_factory));
    print!("{}", describe_pad_templates(&sink_factory));

    let source = source_factory
        .create()
        .name("source")
        .build()
        .context("Could not create the source.")?;
    let sink = sink_factory
        .create()
        .name("sink")
        .build()
        .context("Could not create the sink.")?;

    let pipeline = gst::Pipeline::with_name("test-pipeline");
    pipeline.add_many([&source, &sink])?;
    link_chain(&[&source, &sink])?;

    println!("In NULL state:");
    print!("{}", describe_pad_caps(&sink, "sink"));

    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to set pipeline to playing state")?;

    let print_sink_caps = |_old: gst::State, _new: gst::State| {
        print!("{}", describe_pad_caps(&sink, "sink"));
    };
    let opts = RunOptions {
        state_changes: true,
        on_state_changed: Some(&print_sink_caps),
    };
    let result = run_until_done(&pipeline, &opts);
    pipeline.set_state(gst::State::Null)?;
    result?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
