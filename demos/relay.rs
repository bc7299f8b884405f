//! Re-publishes an RTMP stream and stops it from a timer thread, the same
//! way a host language drives the C ABI.
//!
//! Usage:
//!   cargo run --example relay -- \
//!       --source rtmp://192.168.1.114:1935/yanked/stream-fancy \
//!       --sink rtmp://192.168.1.114:1935/yanked/stream-videotestsrc \
//!       --seconds 30
//!
//!   # same relay through the rtmprelaybin element
//!   cargo run --example relay -- --bin

use clap::Parser;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstrtmpmix::common::rtmp_url;
use gstrtmpmix::ffi::{
    rtmpmix_allocate, rtmpmix_free, rtmpmix_setup, rtmpmix_start, rtmpmix_stop, RelayContext,
    STATUS_OK,
};
use std::ffi::CString;
use std::thread;
use std::time::Duration;

mod common;

#[derive(Parser, Debug)]
struct RelayParams {
    /// RTMP location to pull from
    #[clap(long)]
    source: Option<String>,

    /// RTMP location to publish to
    #[clap(long)]
    sink: Option<String>,

    /// Stop the relay after this many seconds
    #[clap(short, long, default_value = "30")]
    seconds: u64,

    /// Use the rtmprelaybin element instead of the C ABI
    #[clap(long)]
    bin: bool,
}

/// Context pointer handed to the timer thread.
struct SendContext(*mut RelayContext);

// SAFETY: rtmpmix_stop may be called from any thread
unsafe impl Send for SendContext {}

fn relay_with_context(source: &str, sink: &str, seconds: u64) -> anyhow::Result<()> {
    let source = CString::new(source)?;
    let sink = CString::new(sink)?;

    let context = rtmpmix_allocate();
    if context.is_null() {
        anyhow::bail!("Didn't get a context");
    }
    println!("Got the context pointer");

    let status = unsafe { rtmpmix_setup(source.as_ptr(), sink.as_ptr(), context) };
    if status.status_code != STATUS_OK {
        unsafe { rtmpmix_free(context) };
        anyhow::bail!("{} ({})", status.message(), status.status_code);
    }

    println!("Scheduling a timer");
    let timer_context = SendContext(context);
    let timer = thread::spawn(move || {
        let timer_context = timer_context;
        thread::sleep(Duration::from_secs(seconds));
        println!("Running the timer");
        unsafe { rtmpmix_stop(timer_context.0) };
        println!("Came out, didn't freeze");
    });

    let code = unsafe { rtmpmix_start(context) };
    let _ = timer.join();
    unsafe { rtmpmix_free(context) };
    println!("Exiting");

    if code != 0 {
        anyhow::bail!("relay exited with {}", code);
    }
    Ok(())
}

fn relay_with_bin(source: &str, sink: &str, seconds: u64) -> anyhow::Result<()> {
    common::init()?;

    let pipeline = gst::Pipeline::with_name("relaybin");
    let relay = gst::ElementFactory::make("rtmprelaybin")
        .property("source-location", source)
        .property("sink-location", sink)
        .build()?;
    pipeline.add(&relay)?;

    let weak = pipeline.downgrade();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        if let Some(pipeline) = weak.upgrade() {
            println!("Stopping...");
            pipeline.send_event(gst::event::Eos::new());
        }
    });

    gstrtmpmix::bus::run_live(&pipeline)?;
    Ok(())
}

fn example_main() -> anyhow::Result<()> {
    let args = RelayParams::parse();
    let source = args.source.unwrap_or_else(|| rtmp_url("stream-fancy"));
    let sink = args.sink.unwrap_or_else(|| rtmp_url("stream-videotestsrc"));

    if args.bin {
        relay_with_bin(&source, &sink, args.seconds)
    } else {
        relay_with_context(&source, &sink, args.seconds)
    }
}

fn main() {
    common::main_with(example_main);
}
