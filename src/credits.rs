//! Rolling credits on a `textoverlay`.
//!
//! The overlay colour is driven by an ARGB control binding: the alpha
//! channel fades each page in, holds it and fades it out again, while the
//! colour channels stay at full white. A periodic clock id swaps the text
//! once per page period.

use crate::common::CAT;
use crate::error::{Error, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_controller::prelude::*;
use gstreamer_controller::{ARGBControlBinding, InterpolationControlSource, InterpolationMode};
use std::sync::Mutex;

pub const DEFAULT_PAGES: [&str; 5] = [
    "Siva's Power Hour",
    "Produced by\nJJ",
    "Directed by\nMP",
    "Something by\nDL",
    "Starring \nSiva",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CreditRoll {
    pub pages: Vec<String>,
    /// Fade in and fade out time.
    pub transition: gst::ClockTime,
    /// Time a page stays fully visible.
    pub hold: gst::ClockTime,
}

impl Default for CreditRoll {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES.iter().map(|p| p.to_string()).collect(),
            transition: gst::ClockTime::SECOND,
            hold: gst::ClockTime::from_seconds(3),
        }
    }
}

impl CreditRoll {
    /// Time between two pages.
    pub fn period(&self) -> gst::ClockTime {
        self.transition * 2 + self.hold
    }

    pub fn total_duration(&self) -> gst::ClockTime {
        self.period() * self.pages.len() as u64
    }

    /// `(timestamp, alpha)` pairs fading every page in and holding it.
    /// The fade out is the ramp towards the next page's leading 0.0.
    pub fn alpha_keyframes(&self) -> Vec<(gst::ClockTime, f64)> {
        let mut keyframes = Vec::with_capacity(self.pages.len() * 3);
        let mut time = gst::ClockTime::ZERO;
        for _ in &self.pages {
            keyframes.push((time, 0.0));
            keyframes.push((time + self.transition, 1.0));
            keyframes.push((time + self.transition + self.hold, 1.0));
            time += self.period();
        }
        keyframes
    }

    /// Binds the overlay `color` to the alpha keyframes and schedules the
    /// page changes on `clock`. Unschedule the returned id to stop early.
    pub fn install(&self, text: &gst::Element, clock: &gst::Clock) -> Result<gst::PeriodicClockId> {
        let Some(first) = self.pages.first() else {
            return Err(Error::Pipeline("credit roll has no pages".to_string()));
        };
        text.set_property("text", first);

        let color = InterpolationControlSource::new();
        color.set_mode(InterpolationMode::None);
        if !color.set(gst::ClockTime::ZERO, 1.0) {
            return Err(Error::Clock("failed to set the colour value".to_string()));
        }

        let alpha = InterpolationControlSource::new();
        alpha.set_mode(InterpolationMode::Linear);
        for (time, value) in self.alpha_keyframes() {
            if !alpha.set(time, value) {
                return Err(Error::Clock(format!("failed to set alpha keyframe at {}", time)));
            }
        }

        let binding = ARGBControlBinding::new(text, "color", &alpha, &color, &color, &color);
        text.add_control_binding(&binding)?;

        let now: Option<gst::ClockTime> = clock.time().into();
        let periodic = clock.new_periodic_id(now.unwrap_or(gst::ClockTime::ZERO), self.period());
        let pages = Mutex::new(PageCursor::new(self.pages.clone()));
        let text = text.clone();
        periodic
            .wait_async(move |_clock, _time, id| {
                let mut pages = pages.lock().unwrap();
                if let Some((page, last)) = pages.advance() {
                    gst::debug!(CAT, obj = text, "showing credit page {:?}", page);
                    text.set_property("text", page);
                    if last {
                        id.unschedule();
                    }
                }
            })
            .map_err(|err| Error::Clock(format!("{:?}", err)))?;

        Ok(periodic)
    }
}

/// Hands out the pages in order, flagging the last one.
#[derive(Debug)]
struct PageCursor {
    pages: Vec<String>,
    current: usize,
}

impl PageCursor {
    fn new(pages: Vec<String>) -> Self {
        Self { pages, current: 0 }
    }

    fn advance(&mut self) -> Option<(&str, bool)> {
        let page = self.pages.get(self.current)?;
        self.current += 1;
        Some((page.as_str(), self.current >= self.pages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::init_for_tests;

    #[test]
    fn default_roll() {
        let roll = CreditRoll::default();
        assert_eq!(roll.pages.len(), 5);
        assert_eq!(roll.pages[0], "Siva's Power Hour");
        assert_eq!(roll.period(), gst::ClockTime::from_seconds(5));
        assert_eq!(roll.total_duration(), gst::ClockTime::from_seconds(25));
    }

    #[test]
    fn keyframes_fade_in_and_hold_each_page() {
        let roll = CreditRoll {
            pages: vec!["one".into(), "two".into()],
            ..Default::default()
        };
        let secs: Vec<(u64, f64)> = roll
            .alpha_keyframes()
            .into_iter()
            .map(|(t, v)| (t.seconds(), v))
            .collect();
        assert_eq!(
            secs,
            vec![(0, 0.0), (1, 1.0), (4, 1.0), (5, 0.0), (6, 1.0), (9, 1.0)]
        );
    }

    #[test]
    fn cursor_flags_last_page() {
        let mut cursor = PageCursor::new(vec!["a".into(), "b".into()]);
        assert_eq!(cursor.advance(), Some(("a", false)));
        assert_eq!(cursor.advance(), Some(("b", true)));
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn empty_roll_is_rejected() {
        init_for_tests();
        let roll = CreditRoll {
            pages: Vec::new(),
            ..Default::default()
        };
        let identity = gst::ElementFactory::make("identity").build().unwrap();
        let clock = gst::SystemClock::obtain();
        assert!(roll.install(&identity, &clock).is_err());
    }

    #[test]
    fn pages_advance_with_the_clock() {
        init_for_tests();
        let roll = CreditRoll {
            pages: vec!["first".into(), "second".into()],
            transition: gst::ClockTime::from_mseconds(50),
            hold: gst::ClockTime::from_mseconds(100),
        };
        let text = gst::ElementFactory::make("textoverlay").build().unwrap();
        let clock = gst::SystemClock::obtain();

        let periodic = roll.install(&text, &clock).unwrap();
        assert_eq!(text.property::<String>("text"), "first");

        // first tick fires immediately, the second one a period later
        std::thread::sleep(std::time::Duration::from_millis(500));
        assert_eq!(text.property::<String>("text"), "second");
        periodic.unschedule();
    }
}
