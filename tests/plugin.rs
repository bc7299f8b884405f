use gstreamer as gst;
use gstreamer::prelude::*;

fn init() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        gst::init().unwrap();
        gstrtmpmix::plugin_register_static().expect("rtmpmix plugin registration failed");
    });
}

#[test]
fn relay_bin_is_registered() {
    init();

    let factory = gst::ElementFactory::find("rtmprelaybin").expect("rtmprelaybin not registered");
    assert_eq!(factory.longname(), "RTMP Relay Bin");
    assert_eq!(factory.klass(), "Generic/Bin");
}

#[test]
fn relay_bin_properties_round_trip() {
    init();

    let relay = gst::ElementFactory::make("rtmprelaybin")
        .property("source-location", "rtmp://host/app/in")
        .property("sink-location", "rtmp://host/app/out")
        .build()
        .unwrap();

    assert_eq!(
        relay.property::<Option<String>>("source-location").as_deref(),
        Some("rtmp://host/app/in")
    );
    assert_eq!(
        relay.property::<Option<String>>("sink-location").as_deref(),
        Some("rtmp://host/app/out")
    );
    assert_eq!(relay.property::<Option<String>>("video-format"), None);

    relay.set_property("video-format", "AYUV");
    assert_eq!(
        relay.property::<Option<String>>("video-format").as_deref(),
        Some("AYUV")
    );
}

#[test]
fn relay_bin_needs_both_locations() {
    init();

    let relay = gst::ElementFactory::make("rtmprelaybin")
        .property("source-location", "rtmp://host/app/in")
        .build()
        .unwrap();

    assert!(relay.set_state(gst::State::Ready).is_err());
    assert_eq!(relay.downcast_ref::<gst::Bin>().unwrap().children().len(), 0);
    let _ = relay.set_state(gst::State::Null);
}

#[test]
fn relay_bin_retry_reports_the_same_failure() {
    init();

    let pipeline = gst::Pipeline::with_name("relay-retry");
    let relay = gst::ElementFactory::make("rtmprelaybin")
        .property("source-location", "rtmp://host/app/in")
        .property("sink-location", "rtmp://host/app/out")
        .property("video-format", "bogus")
        .build()
        .unwrap();
    pipeline.add(&relay).unwrap();
    let bus = pipeline.bus().unwrap();

    let mut errors = Vec::new();
    for _ in 0..2 {
        assert!(pipeline.set_state(gst::State::Ready).is_err());
        assert_eq!(relay.downcast_ref::<gst::Bin>().unwrap().children().len(), 0);

        let msg = bus
            .timed_pop_filtered(gst::ClockTime::from_seconds(1), &[gst::MessageType::Error])
            .expect("failed READY should post an error");
        let gst::MessageView::Error(err) = msg.view() else {
            unreachable!();
        };
        errors.push(err.error().to_string());
        let _ = pipeline.set_state(gst::State::Null);
    }

    assert!(errors[0].starts_with("Failed to build relay"));
    assert_eq!(errors[0], errors[1]);
}

#[test]
fn relay_bin_has_no_pads() {
    init();

    let relay = gst::ElementFactory::make("rtmprelaybin").build().unwrap();
    assert_eq!(relay.num_pads(), 0);
}

#[test]
fn presets_are_valid_layouts() {
    init();

    for name in gstrtmpmix::layout::MixerLayout::PRESETS {
        let layout = gstrtmpmix::layout::MixerLayout::preset(name).unwrap();
        layout.validate().unwrap();
        let json = layout.to_json().unwrap();
        assert_eq!(
            gstrtmpmix::layout::MixerLayout::from_json(&json).unwrap(),
            layout
        );
    }
}
