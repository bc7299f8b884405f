use crate::error::{Error, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use once_cell::sync::Lazy;

pub static CAT: Lazy<gst::DebugCategory> = Lazy::new(|| {
    gst::DebugCategory::new(
        "rtmpmix",
        gst::DebugColorFlags::empty(),
        Some("RTMP relay and mixing pipelines"),
    )
});

/// RTMP application the demo streams are published under.
pub const DEFAULT_RTMP_SERVER: &str = "rtmp://192.168.1.124:1935/yanked";

/// Builds the location of `stream` on [`DEFAULT_RTMP_SERVER`].
pub fn rtmp_url(stream: &str) -> String {
    format!("{}/{}", DEFAULT_RTMP_SERVER, stream.trim_start_matches('/'))
}

/// Creates a named element, mapping a missing factory to [`Error::MissingElement`].
pub fn make_element(factory: &str, name: &str) -> Result<gst::Element> {
    gst::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|_| {
            gst::warning!(CAT, "need {} but the factory is not registered", factory);
            Error::MissingElement(factory.to_string())
        })
}

/// Links a linear chain of elements, reporting the first pair that fails.
pub fn link_chain(elements: &[&gst::Element]) -> Result<()> {
    for pair in elements.windows(2) {
        pair[0].link(pair[1]).map_err(|_| Error::Link {
            from: pair[0].name().to_string(),
            to: pair[1].name().to_string(),
        })?;
    }
    Ok(())
}

/// Links `src` to `dst` restricting the negotiated format to `caps`.
pub fn link_filtered(src: &gst::Element, dst: &gst::Element, caps: &gst::Caps) -> Result<()> {
    src.link_filtered(dst, caps).map_err(|_| Error::Link {
        from: src.name().to_string(),
        to: dst.name().to_string(),
    })
}

/// Fetches an always-pad of `element`.
pub fn static_pad(element: &gst::Element, name: &str) -> Result<gst::Pad> {
    element.static_pad(name).ok_or_else(|| Error::MissingPad {
        element: element.name().to_string(),
        pad: name.to_string(),
    })
}

/// Requests a new pad from `template` on `element`.
pub fn request_pad(element: &gst::Element, template: &str) -> Result<gst::Pad> {
    element
        .request_pad_simple(template)
        .ok_or_else(|| Error::PadRequest {
            element: element.name().to_string(),
            template: template.to_string(),
        })
}

/// Links two pads, keeping the pad names in the error.
pub fn link_pads(src: &gst::Pad, sink: &gst::Pad) -> Result<gst::PadLinkSuccess> {
    src.link(sink).map_err(|err| Error::PadLink {
        from: src.name().to_string(),
        to: sink.name().to_string(),
        reason: format!("{:?}", err),
    })
}

/// Requests a `src_%u` pad from a fan-out element and links it to the
/// `sink` pad of `downstream`. The pad is returned so it can be released.
pub fn request_linked_pad(
    fanout: &gst::Element,
    downstream: &gst::Element,
    branch: &str,
) -> Result<gst::Pad> {
    let src_pad = request_pad(fanout, "src_%u")?;
    println!(
        "Obtained request pad {} for {} branch.",
        src_pad.name(),
        branch
    );
    let sink_pad = static_pad(downstream, "sink")?;
    link_pads(&src_pad, &sink_pad)?;
    Ok(src_pad)
}

/// Writes a DOT graph of `pipeline`. Does nothing unless
/// `GST_DEBUG_DUMP_DOT_DIR` is set.
pub fn dump_dot(pipeline: &gst::Pipeline, name: &str) {
    gst::debug!(CAT, obj = pipeline, "dumping pipeline graph '{}'", name);
    pipeline.debug_to_dot_file(gst::DebugGraphDetails::MEDIA_TYPE, name);
}

#[cfg(test)]
pub(crate) fn init_for_tests() {
    gst::init().expect("GStreamer should initialize in tests");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtmp_url_joins_server_and_stream() {
        assert_eq!(
            rtmp_url("rabbit"),
            "rtmp://192.168.1.124:1935/yanked/rabbit"
        );
        assert_eq!(
            rtmp_url("/rabbit-echo"),
            "rtmp://192.168.1.124:1935/yanked/rabbit-echo"
        );
    }

    #[test]
    fn missing_factory_is_reported_by_name() {
        init_for_tests();
        match make_element("nosuchelementfactory", "nope") {
            Err(Error::MissingElement(factory)) => assert_eq!(factory, "nosuchelementfactory"),
            other => panic!("unexpected result: {:?}", other.map(|e| e.name())),
        }
    }

    #[test]
    fn link_chain_and_fanout_with_core_elements() {
        init_for_tests();
        let pipeline = gst::Pipeline::with_name("chain-test");
        let src = make_element("fakesrc", "src").unwrap();
        let tee = make_element("tee", "tee").unwrap();
        let queue = make_element("queue", "queue").unwrap();
        let sink = make_element("fakesink", "sink").unwrap();
        pipeline.add_many([&src, &tee, &queue, &sink]).unwrap();

        link_chain(&[&src, &tee]).unwrap();
        link_chain(&[&queue, &sink]).unwrap();
        let pad = request_linked_pad(&tee, &queue, "test").unwrap();
        assert!(pad.is_linked());
        assert!(static_pad(&queue, "sink").unwrap().is_linked());
    }

    #[test]
    fn missing_pad_names_element() {
        init_for_tests();
        let sink = make_element("fakesink", "lonely").unwrap();
        match static_pad(&sink, "src") {
            Err(Error::MissingPad { element, pad }) => {
                assert_eq!(element, "lonely");
                assert_eq!(pad, "src");
            }
            other => panic!("unexpected result: {:?}", other.map(|p| p.name())),
        }
    }
}
