//! Plays a file with `playbin`, printing the position and jumping back to
//! the start once it passed ten seconds.
//!
//! Usage:
//!   cargo run --example seeking -- --uri file:///code/ra.mp4

use clap::Parser;
use gstreamer::prelude::*;
use gstrtmpmix::common::make_element;

mod common;

#[derive(Parser, Debug)]
struct SeekingParams {
    /// Media URI to play
    #[clap(short, long, default_value = "file:///code/ra.mp4")]
    uri: String,
}

fn example_main() -> anyhow::Result<()> {
    let args = SeekingParams::parse();
    common::init()?;

    let playbin = make_element("playbin", "playbin")?;
    let video_sink = make_element("ximagesink", "video_sink")?;
    playbin.set_property("uri", &args.uri);
    playbin.set_property("video-sink", &video_sink);

    let state = gstrtmpmix::seek::run(&playbin)?;
    if !state.seek_done {
        println!("Stream ended without seeking.");
    }
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
