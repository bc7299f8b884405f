//! Feeds generated audio through `appsrc`, splits it three ways with a
//! `tee` and reads one branch back through `appsink`.
//!
//! Usage:
//!   cargo run --example shortcut

use anyhow::Context;
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstrtmpmix::common::{link_chain, make_element, request_linked_pad};
use gstrtmpmix::feed::{attach_sink_counter, Feeder};

mod common;

fn example_main() -> anyhow::Result<()> {
    common::init()?;

    let app_source = gst_app::AppSrc::builder().name("app_source").build();
    let tee = make_element("tee", "tee")?;
    let audio_queue = make_element("queue", "audio_queue")?;
    let audio_convert1 = make_element("audioconvert", "audio_convert1")?;
    let audio_resample = make_element("audioresample", "audio_resample")?;
    let audio_sink = make_element("autoaudiosink", "audio_sink")?;
    let video_queue = make_element("queue", "video_queue")?;
    let audio_convert2 = make_element("audioconvert", "audio_convert2")?;
    let visual = make_element("wavescope", "visual")?;
    let video_convert = make_element("videoconvert", "csp")?;
    let video_sink = make_element("ximagesink", "video_sink")?;
    let app_queue = make_element("queue", "app_queue")?;
    let app_sink = gst_app::AppSink::builder().name("app_sink").build();

    visual.set_property_from_str("shader", "0");
    visual.set_property_from_str("style", "0");

    let _feeder = Feeder::attach(&app_source)?;
    let _received = attach_sink_counter(&app_sink)?;

    let pipeline = gst::Pipeline::with_name("shorty-stuff");
    pipeline.add_many([
        app_source.upcast_ref::<gst::Element>(),
        &tee,
        &audio_queue,
        &audio_convert1,
        &audio_resample,
        &audio_sink,
        &video_queue,
        &audio_convert2,
        &visual,
        &video_convert,
        &video_sink,
        &app_queue,
        app_sink.upcast_ref(),
    ])?;

    link_chain(&[app_source.upcast_ref(), &tee])?;
    link_chain(&[&audio_queue, &audio_convert1, &audio_resample, &audio_sink])?;
    link_chain(&[&video_queue, &audio_convert2, &visual, &video_convert, &video_sink])?;
    link_chain(&[&app_queue, app_sink.upcast_ref()])?;

    let tee_pads = [
        request_linked_pad(&tee, &audio_queue, "audio")?,
        request_linked_pad(&tee, &video_queue, "video")?,
        request_linked_pad(&tee, &app_queue, "app")?,
    ];

    let main_loop = glib::MainLoop::new(None, false);
    let bus = pipeline.bus().context("pipeline without a bus")?;
    let loop_ref = main_loop.clone();
    let _watch = bus.add_watch(move |_, msg| {
        if let gst::MessageView::Error(err) = msg.view() {
            eprintln!(
                "Error received from element {}: {}",
                err.src()
                    .map(|s| s.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                err.error()
            );
            eprintln!("Debug info: {}", err.debug().as_deref().unwrap_or("none"));
            loop_ref.quit();
        }
        glib::ControlFlow::Continue
    })?;

    pipeline
        .set_state(gst::State::Playing)
        .context("Unable to start playing the pipeline.")?;
    main_loop.run();

    for pad in &tee_pads {
        tee.release_request_pad(pad);
    }
    pipeline.set_state(gst::State::Null)?;
    Ok(())
}

fn main() {
    common::main_with(example_main);
}
