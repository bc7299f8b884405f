//! Time queries and a one-shot seek on a playing pipeline.
//!
//! The bus is polled with a 100 ms timeout. Each time it comes back empty
//! the current position is printed and, once playback passed ten seconds, a
//! single flushing key-unit seek jumps back to the start.

use crate::common::CAT;
use crate::error::{Error, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use std::io::Write;

/// Position after which the seek back to the start happens.
pub const SEEK_THRESHOLD: gst::ClockTime = gst::ClockTime::from_seconds(10);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub playing: bool,
    pub terminate: bool,
    pub seek_enabled: bool,
    pub seek_done: bool,
    pub duration: Option<gst::ClockTime>,
}

impl PlaybackState {
    /// Updates the state from a bus message posted by `playbin` or one of
    /// its children.
    pub fn handle_message(&mut self, playbin: &gst::Element, msg: &gst::Message) {
        use gst::MessageView;

        match msg.view() {
            MessageView::Error(err) => {
                eprintln!(
                    "Error received from element {}: {}",
                    err.src()
                        .map(|s| s.name().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    err.error()
                );
                eprintln!("Debug info: {}", err.debug().as_deref().unwrap_or("none"));
                self.terminate = true;
            }
            MessageView::Eos(..) => {
                println!("\nEnd-Of-Stream reached.");
                self.terminate = true;
            }
            MessageView::DurationChanged(..) => {
                // queried again on the next position update
                self.duration = gst::ClockTime::NONE;
            }
            MessageView::StateChanged(state) => {
                if state.src() != Some(playbin.upcast_ref::<gst::Object>()) {
                    return;
                }
                println!(
                    "Pipeline state changed from {:?} to {:?}",
                    state.old(),
                    state.current()
                );

                self.playing = state.current() == gst::State::Playing;
                if self.playing {
                    self.query_seeking(playbin);
                }
            }
            _ => (),
        }
    }

    fn query_seeking(&mut self, playbin: &gst::Element) {
        let mut seeking = gst::query::Seeking::new(gst::Format::Time);
        if !playbin.query(&mut seeking) {
            eprintln!("Seeking query failed.");
            return;
        }

        let (seekable, start, end) = seeking.result();
        self.seek_enabled = seekable;
        if seekable {
            println!("Seeking is ENABLED from {} to {}", start, end);
        } else {
            println!("Seek DISABLED for this stream.");
        }
    }

    /// True once for a seekable stream that played past [`SEEK_THRESHOLD`].
    pub fn should_seek(&self, position: gst::ClockTime) -> bool {
        self.seek_enabled && !self.seek_done && position > SEEK_THRESHOLD
    }
}

/// Plays `playbin` to the end, printing the position and seeking back to
/// the start once.
pub fn run(playbin: &gst::Element) -> Result<PlaybackState> {
    let bus = playbin
        .bus()
        .ok_or_else(|| Error::Pipeline("element without a bus".to_string()))?;

    playbin
        .set_state(gst::State::Playing)
        .map_err(|_| Error::StateChange(gst::State::Playing))?;

    let mut state = PlaybackState::default();
    while !state.terminate {
        match bus.timed_pop(100 * gst::ClockTime::MSECOND) {
            Some(msg) => state.handle_message(playbin, &msg),
            None => {
                if !state.playing {
                    continue;
                }
                let Some(position) = playbin.query_position::<gst::ClockTime>() else {
                    eprintln!("Could not query current position.");
                    continue;
                };
                if state.duration.is_none() {
                    state.duration = playbin.query_duration::<gst::ClockTime>();
                    if state.duration.is_none() {
                        eprintln!("Could not query current duration.");
                    }
                }

                print!("Position {} of {}\r", position, state.duration.display());
                let _ = std::io::stdout().flush();

                if state.should_seek(position) {
                    println!("\nReached 10s, performing seek...");
                    playbin
                        .seek_simple(
                            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                            gst::ClockTime::ZERO,
                        )
                        .map_err(|err| Error::Pipeline(format!("seek failed: {}", err)))?;
                    gst::debug!(CAT, obj = playbin, "seeked back to the start");
                    state.seek_done = true;
                }
            }
        }
    }

    playbin
        .set_state(gst::State::Null)
        .map_err(|_| Error::StateChange(gst::State::Null))?;
    Ok(state)
}
