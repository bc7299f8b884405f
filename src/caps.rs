//! Human readable dumps of element factories, pad templates and negotiated caps.

use gstreamer as gst;
use gstreamer::prelude::*;
use std::fmt::Write;

pub fn describe_caps(caps: &gst::CapsRef, prefix: &str) -> String {
    if caps.is_any() {
        return format!("{}ANY\n", prefix);
    }
    if caps.is_empty() {
        return format!("{}EMPTY\n", prefix);
    }

    let mut out = String::new();
    for structure in caps.iter() {
        let _ = writeln!(out, "{}{}", prefix, structure.name());
        for (field, value) in structure.iter() {
            let value = value
                .serialize()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| format!("{:?}", value));
            let _ = writeln!(out, "{} {:>15}: {}", prefix, field.as_str(), value);
        }
    }
    out
}

fn direction_label(direction: gst::PadDirection) -> &'static str {
    match direction {
        gst::PadDirection::Src => "SRC",
        gst::PadDirection::Sink => "SINK",
        gst::PadDirection::Unknown => "UNKNOWN!",
    }
}

fn presence_label(presence: gst::PadPresence) -> &'static str {
    match presence {
        gst::PadPresence::Always => "Always",
        gst::PadPresence::Sometimes => "Sometimes",
        gst::PadPresence::Request => "On Request",
    }
}

pub fn describe_pad_templates(factory: &gst::ElementFactory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pad Templates for {}:", factory.longname());

    if factory.num_pad_templates() == 0 {
        out.push_str(" none\n");
        return out;
    }

    for template in factory.static_pad_templates() {
        describe_template(
            &mut out,
            template.name_template(),
            template.direction(),
            template.presence(),
            &template.caps(),
        );
    }
    out
}

fn describe_template(
    out: &mut String,
    name: &str,
    direction: gst::PadDirection,
    presence: gst::PadPresence,
    caps: &gst::CapsRef,
) {
    let _ = writeln!(out, " {} template: '{}'", direction_label(direction), name);
    let _ = writeln!(out, " Availability: {}", presence_label(presence));

    if !caps.is_empty() {
        out.push_str(" Capabilities:\n");
        out.push_str(&describe_caps(caps, "        "));
    }
    out.push('\n');
}

/// Current caps of one of `element`'s static pads. Nothing is printed for a
/// pad that has not negotiated yet.
pub fn describe_pad_caps(element: &gst::Element, pad_name: &str) -> String {
    let Some(pad) = element.static_pad(pad_name) else {
        return format!("Could not retrieve pad '{}'\n", pad_name);
    };

    match pad.current_caps() {
        Some(caps) => format!(
            "Caps for the {} pad:\n{}",
            pad_name,
            describe_caps(&caps, "      ")
        ),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::init_for_tests;

    #[test]
    fn any_and_empty_caps() {
        init_for_tests();
        assert_eq!(describe_caps(&gst::Caps::new_any(), "  "), "  ANY\n");
        assert_eq!(describe_caps(&gst::Caps::new_empty(), "  "), "  EMPTY\n");
    }

    #[test]
    fn fields_are_listed_under_structure_name() {
        init_for_tests();
        let caps = gst::Caps::builder("video/x-raw")
            .field("format", "AYUV")
            .field("width", 320i32)
            .build();
        let text = describe_caps(&caps, ">");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(">video/x-raw"));
        assert_eq!(lines.next(), Some(">          format: AYUV"));
        assert_eq!(lines.next(), Some(">           width: 320"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn core_factory_templates() {
        init_for_tests();
        let factory = gst::ElementFactory::find("fakesink").unwrap();
        let text = describe_pad_templates(&factory);
        assert!(text.starts_with("Pad Templates for Fake Sink:"));
        assert!(text.contains(" SINK template: 'sink'"));
        assert!(text.contains(" Availability: Always"));
        assert!(text.contains("        ANY"));

        let tee = gst::ElementFactory::find("tee").unwrap();
        let text = describe_pad_templates(&tee);
        assert!(text.contains(" SRC template: 'src_%u'"));
        assert!(text.contains(" Availability: On Request"));
    }

    #[test]
    fn templates_without_caps_skip_the_capabilities_block() {
        init_for_tests();
        let mut out = String::new();
        describe_template(
            &mut out,
            "sink",
            gst::PadDirection::Sink,
            gst::PadPresence::Sometimes,
            &gst::Caps::new_empty(),
        );
        assert_eq!(out, " SINK template: 'sink'\n Availability: Sometimes\n\n");

        let mut out = String::new();
        describe_template(
            &mut out,
            "src",
            gst::PadDirection::Src,
            gst::PadPresence::Always,
            &gst::Caps::new_any(),
        );
        assert!(out.contains(" Capabilities:\n        ANY\n"));
    }

    #[test]
    fn unknown_pad_is_reported() {
        init_for_tests();
        let sink = gst::ElementFactory::make("fakesink").build().unwrap();
        assert_eq!(
            describe_pad_caps(&sink, "src"),
            "Could not retrieve pad 'src'\n"
        );
        assert_eq!(describe_pad_caps(&sink, "sink"), "");
    }
}
