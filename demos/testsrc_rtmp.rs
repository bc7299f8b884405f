//! Publishes `videotestsrc` as H.264/FLV to an RTMP server.
//!
//! Usage:
//!   cargo run --example testsrc_rtmp -- --sink rtmp://192.168.1.124:1935/yanked/stream-videotestsrc

use clap::Parser;
use gstrtmpmix::common::rtmp_url;
use gstrtmpmix::relay::Relay;

mod common;

#[derive(Parser, Debug)]
struct TestSrcParams {
    /// RTMP location to publish to
    #[clap(long)]
    sink: Option<String>,
}

fn example_main() -> anyhow::Result<()> {
    let args = TestSrcParams::parse();
    common::init()?;

    let sink = args.sink.unwrap_or_else(|| rtmp_url("stream-videotestsrc"));
    let relay = Relay::test_source(&sink)?;
    println!("Publishing test source to {}", sink);
    relay.run()?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
