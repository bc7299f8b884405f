//! Rolls credits over a test pattern: `videotestsrc ! textoverlay ! ximagesink`.
//!
//! Usage:
//!   cargo run --example credits -- --seconds 60

use anyhow::Context;
use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::common::{link_chain, make_element};
use gstrtmpmix::credits::CreditRoll;

mod common;

#[derive(Parser, Debug)]
struct CreditsParams {
    /// How long to keep the window open
    #[clap(short, long, default_value = "60")]
    seconds: u64,
}

fn example_main() -> anyhow::Result<()> {
    let args = CreditsParams::parse();
    common::init()?;

    let pipeline = gst::Pipeline::with_name("pipeline");
    let clock = pipeline.pipeline_clock();

    let src = make_element("videotestsrc", "source")?;
    src.set_property_from_str("pattern", "checkers-8");
    let text = make_element("textoverlay", "text")?;
    text.set_property("font-desc", "Sans, 30");
    text.set_property_from_str("halignment", "center");
    text.set_property_from_str("valignment", "position");
    text.set_property("color", 0xffffffffu32);
    let sink = make_element("ximagesink", "sink")?;

    pipeline.add_many([&src, &text, &sink])?;
    link_chain(&[&src, &text, &sink])?;

    let roll = CreditRoll::default();
    let pages = roll.install(&text, &clock)?;

    let now: Option<gst::ClockTime> = clock.time().into();
    let deadline = now.unwrap_or(gst::ClockTime::ZERO) + gst::ClockTime::from_seconds(args.seconds);
    let stop = clock.new_single_shot_id(deadline);

    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to start playing the pipeline.")?;
    let (res, _jitter) = stop.wait();
    if let Err(err) = res {
        eprintln!("clock wait returned: {:?}", err);
    }

    pages.unschedule();
    pipeline.set_state(gst::State::Null)?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
