//! Linking of "sometimes" pads that decoders expose once they know the media.

use crate::common::CAT;
use gstreamer as gst;
use gstreamer::prelude::*;

/// Raw media carried by a pad, judged from the name of its first caps structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    /// Anything that is not raw audio or video.
    Other,
}

impl MediaKind {
    pub fn from_caps_name(name: &str) -> Self {
        if name.starts_with("audio/x-raw") {
            MediaKind::Audio
        } else if name.starts_with("video/x-raw") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// Where new decoder pads should go. Kinds without a target are dropped.
#[derive(Debug, Clone, Default)]
pub struct PadRoute {
    pub audio: Option<gst::Element>,
    pub video: Option<gst::Element>,
}

impl PadRoute {
    pub fn video_only(target: &gst::Element) -> Self {
        Self {
            audio: None,
            video: Some(target.clone()),
        }
    }

    pub fn audio_video(audio: &gst::Element, video: &gst::Element) -> Self {
        Self {
            audio: Some(audio.clone()),
            video: Some(video.clone()),
        }
    }

    fn target(&self, kind: MediaKind) -> Option<&gst::Element> {
        match kind {
            MediaKind::Audio => self.audio.as_ref(),
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(MediaKind),
    AlreadyLinked(MediaKind),
    Failed(MediaKind),
    Ignored(String),
}

/// Links `new_pad` to the `sink` pad of the element routed for its media kind.
pub fn link_new_pad(new_pad: &gst::Pad, route: &PadRoute) -> LinkOutcome {
    let caps = new_pad.current_caps().unwrap_or_else(|| new_pad.query_caps(None));
    let pad_type = caps
        .structure(0)
        .map(|s| s.name().to_string())
        .unwrap_or_default();
    gst::debug!(CAT, obj = new_pad, "new pad carries '{}'", pad_type);

    let kind = MediaKind::from_caps_name(&pad_type);
    let Some(target) = route.target(kind) else {
        return LinkOutcome::Ignored(pad_type);
    };
    let Some(sink_pad) = target.static_pad("sink") else {
        gst::error!(CAT, obj = target, "routed element has no sink pad");
        return LinkOutcome::Failed(kind);
    };

    if sink_pad.is_linked() {
        return LinkOutcome::AlreadyLinked(kind);
    }

    match new_pad.link(&sink_pad) {
        Ok(_) => LinkOutcome::Linked(kind),
        Err(err) => {
            gst::warning!(CAT, obj = new_pad, "link failed: {:?}", err);
            LinkOutcome::Failed(kind)
        }
    }
}

/// Routes every pad the decoder adds according to `route`.
pub fn connect_pad_added(decoder: &gst::Element, route: PadRoute) {
    decoder.connect_pad_added(move |src, new_pad| {
        println!(
            "Received new pad '{}' from '{}'",
            new_pad.name(),
            src.name()
        );

        match link_new_pad(new_pad, &route) {
            LinkOutcome::Linked(kind) => println!("Link succeeded with type '{:?}'.", kind),
            LinkOutcome::AlreadyLinked(kind) => println!("{:?} pad linked already", kind),
            LinkOutcome::Failed(kind) => println!("Type is '{:?}', but linking failed", kind),
            LinkOutcome::Ignored(pad_type) => {
                println!("It has type '{}' which is not routed. Ignoring.", pad_type)
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{init_for_tests, make_element};

    #[test]
    fn media_kind_from_caps_names() {
        assert_eq!(MediaKind::from_caps_name("audio/x-raw"), MediaKind::Audio);
        assert_eq!(MediaKind::from_caps_name("video/x-raw"), MediaKind::Video);
        assert_eq!(MediaKind::from_caps_name("video/x-h264"), MediaKind::Other);
        assert_eq!(MediaKind::from_caps_name(""), MediaKind::Other);
    }

    #[test]
    fn video_pad_is_linked_once() {
        init_for_tests();
        let pipeline = gst::Pipeline::with_name("pads-test");
        let filter = gst::ElementFactory::make("capsfilter")
            .name("decoded")
            .property("caps", gst::Caps::builder("video/x-raw").build())
            .build()
            .unwrap();
        let queue = make_element("queue", "video_queue").unwrap();
        pipeline.add_many([&filter, &queue]).unwrap();

        let route = PadRoute::video_only(&queue);
        let src_pad = filter.static_pad("src").unwrap();

        assert_eq!(link_new_pad(&src_pad, &route), LinkOutcome::Linked(MediaKind::Video));
        assert_eq!(
            link_new_pad(&src_pad, &route),
            LinkOutcome::AlreadyLinked(MediaKind::Video)
        );
    }

    #[test]
    fn unrouted_audio_is_ignored() {
        init_for_tests();
        let pipeline = gst::Pipeline::with_name("pads-audio-test");
        let filter = gst::ElementFactory::make("capsfilter")
            .property("caps", gst::Caps::builder("audio/x-raw").build())
            .build()
            .unwrap();
        let queue = make_element("queue", "video_queue").unwrap();
        pipeline.add_many([&filter, &queue]).unwrap();

        let route = PadRoute::video_only(&queue);
        let src_pad = filter.static_pad("src").unwrap();
        assert_eq!(
            link_new_pad(&src_pad, &route),
            LinkOutcome::Ignored("audio/x-raw".to_string())
        );
    }
}
