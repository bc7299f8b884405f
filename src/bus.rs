//! Bus message handling shared by every pipeline in the crate.
//!
//! Two flavours are provided:
//!
//! 1. [`run_until_done`] pops messages synchronously until EOS or an error,
//!    which is all the simple file/test-source programs need.
//! 2. [`LiveBusHandler`] reacts to messages from a GLib main loop and keeps
//!    network (RTMP) pipelines alive across buffering and clock loss.

use crate::common::{dump_dot, CAT};
use crate::error::{Error, Result};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;

/// What the caller should do after a message has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusAction {
    Continue,
    Quit,
}

/// Options for [`run_until_done`].
#[derive(Default)]
pub struct RunOptions<'a> {
    /// Also report pipeline state changes.
    pub state_changes: bool,
    /// Called after a pipeline state change has been printed.
    pub on_state_changed: Option<&'a dyn Fn(gst::State, gst::State)>,
}

fn describe_error(err: &gst::message::Error) -> (String, String) {
    let src = err
        .src()
        .map(|s| s.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    (src, err.error().to_string())
}

/// Blocks on the pipeline bus until end-of-stream or an error.
///
/// Errors are printed the way the demos report them and returned as
/// [`Error::Pipeline`]. EOS yields `Ok(())`.
pub fn run_until_done(pipeline: &gst::Pipeline, opts: &RunOptions<'_>) -> Result<()> {
    let bus = pipeline.bus().ok_or_else(|| {
        Error::Pipeline("pipeline without a bus".to_string())
    })?;

    let mut types = vec![gst::MessageType::Error, gst::MessageType::Eos];
    if opts.state_changes {
        types.push(gst::MessageType::StateChanged);
    }

    while let Some(msg) = bus.timed_pop_filtered(gst::ClockTime::NONE, &types) {
        use gst::MessageView;

        match msg.view() {
            MessageView::Error(err) => {
                let (src, text) = describe_error(&err);
                eprintln!("Error received from element {}: {}", src, text);
                eprintln!(
                    "Debug info: {}",
                    err.debug().as_deref().unwrap_or("none")
                );
                return Err(Error::Pipeline(text));
            }
            MessageView::Eos(..) => {
                println!("End of stream reached.");
                return Ok(());
            }
            MessageView::StateChanged(state) => {
                if state.src() == Some(pipeline.upcast_ref::<gst::Object>()) {
                    println!(
                        "State changed from {:?} to {:?}",
                        state.old(),
                        state.current()
                    );
                    if let Some(callback) = opts.on_state_changed {
                        callback(state.old(), state.current());
                    }
                }
            }
            _ => gst::warning!(CAT, obj = pipeline, "unexpected message {:?}", msg.type_()),
        }
    }

    Ok(())
}

/// State a non-live pipeline should move to for a buffering percentage.
///
/// Live sources cannot be paused to refill, so buffering is ignored for them.
pub fn buffering_target(percent: i32, is_live: bool) -> Option<gst::State> {
    if is_live {
        None
    } else if percent < 100 {
        Some(gst::State::Paused)
    } else {
        Some(gst::State::Playing)
    }
}

/// Sets the pipeline to PLAYING and reports whether it is live.
pub fn start_live(pipeline: &gst::Pipeline) -> Result<bool> {
    match pipeline.set_state(gst::State::Playing) {
        Ok(gst::StateChangeSuccess::NoPreroll) => {
            gst::info!(CAT, obj = pipeline, "pipeline is live");
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(_) => Err(Error::StateChange(gst::State::Playing)),
    }
}

/// Message policy for pipelines fed from the network.
pub struct LiveBusHandler {
    pipeline: glib::WeakRef<gst::Pipeline>,
    main_loop: glib::MainLoop,
    is_live: bool,
}

impl LiveBusHandler {
    pub fn new(pipeline: &gst::Pipeline, main_loop: &glib::MainLoop, is_live: bool) -> Self {
        Self {
            pipeline: pipeline.downgrade(),
            main_loop: main_loop.clone(),
            is_live,
        }
    }

    fn set_state(pipeline: &gst::Pipeline, state: gst::State) {
        if let Err(err) = pipeline.set_state(state) {
            gst::error!(CAT, obj = pipeline, "failed to go to {:?}: {}", state, err);
        }
    }

    pub fn handle(&self, msg: &gst::Message) -> BusAction {
        use gst::MessageView;

        let Some(pipeline) = self.pipeline.upgrade() else {
            self.main_loop.quit();
            return BusAction::Quit;
        };

        match msg.view() {
            MessageView::Error(err) => {
                println!("Error: {}", err.error());
                gst::debug!(CAT, obj = pipeline, "error details: {:?}", err.debug());
                Self::set_state(&pipeline, gst::State::Ready);
                self.main_loop.quit();
                BusAction::Quit
            }
            MessageView::Eos(..) => {
                Self::set_state(&pipeline, gst::State::Ready);
                self.main_loop.quit();
                BusAction::Quit
            }
            MessageView::Buffering(buffering) => {
                let percent = buffering.percent();
                if let Some(state) = buffering_target(percent, self.is_live) {
                    print!("Buffering ({:3}%)\r", percent);
                    Self::set_state(&pipeline, state);
                }
                BusAction::Continue
            }
            MessageView::ClockLost(..) => {
                gst::info!(CAT, obj = pipeline, "clock lost, selecting a new one");
                Self::set_state(&pipeline, gst::State::Paused);
                Self::set_state(&pipeline, gst::State::Playing);
                BusAction::Continue
            }
            MessageView::StateChanged(..) => {
                dump_dot(&pipeline, "playing");
                BusAction::Continue
            }
            _ => BusAction::Continue,
        }
    }
}

/// Installs a [`LiveBusHandler`] on the pipeline bus. Messages are dispatched
/// while `main_loop` runs; dropping the guard removes the watch.
pub fn watch(
    pipeline: &gst::Pipeline,
    main_loop: &glib::MainLoop,
    is_live: bool,
) -> Result<gst::bus::BusWatchGuard> {
    let bus = pipeline
        .bus()
        .ok_or_else(|| Error::Pipeline("pipeline without a bus".to_string()))?;
    let handler = LiveBusHandler::new(pipeline, main_loop, is_live);

    let guard = bus.add_watch(move |_, msg| match handler.handle(msg) {
        BusAction::Continue => glib::ControlFlow::Continue,
        BusAction::Quit => glib::ControlFlow::Break,
    })?;

    Ok(guard)
}

/// Starts `pipeline`, runs a main loop until EOS/error and shuts down.
pub fn run_live(pipeline: &gst::Pipeline) -> Result<()> {
    let is_live = start_live(pipeline)?;
    let main_loop = glib::MainLoop::new(None, false);
    let _guard = watch(pipeline, &main_loop, is_live)?;

    main_loop.run();

    dump_dot(pipeline, "aftermainlooprun");
    pipeline
        .set_state(gst::State::Null)
        .map_err(|_| Error::StateChange(gst::State::Null))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{init_for_tests, link_chain, make_element};

    #[test]
    fn buffering_is_ignored_for_live_sources() {
        assert_eq!(buffering_target(10, true), None);
        assert_eq!(buffering_target(100, true), None);
    }

    #[test]
    fn buffering_pauses_until_full() {
        assert_eq!(buffering_target(0, false), Some(gst::State::Paused));
        assert_eq!(buffering_target(99, false), Some(gst::State::Paused));
        assert_eq!(buffering_target(100, false), Some(gst::State::Playing));
    }

    fn finite_pipeline(name: &str) -> gst::Pipeline {
        let pipeline = gst::Pipeline::with_name(name);
        let src = gst::ElementFactory::make("fakesrc")
            .property("num-buffers", 5i32)
            .build()
            .unwrap();
        let sink = make_element("fakesink", "sink").unwrap();
        pipeline.add_many([&src, &sink]).unwrap();
        link_chain(&[&src, &sink]).unwrap();
        pipeline
    }

    #[test]
    fn run_until_done_returns_on_eos() {
        init_for_tests();
        let pipeline = finite_pipeline("eos-test");
        let seen = std::cell::Cell::new(0);
        let on_change = |_old: gst::State, _new: gst::State| seen.set(seen.get() + 1);
        let opts = RunOptions {
            state_changes: true,
            on_state_changed: Some(&on_change),
        };

        pipeline.set_state(gst::State::Playing).unwrap();
        run_until_done(&pipeline, &opts).unwrap();
        pipeline.set_state(gst::State::Null).unwrap();

        assert!(seen.get() >= 1);
    }

    #[test]
    fn live_handler_quits_on_eos() {
        init_for_tests();
        let pipeline = finite_pipeline("live-eos-test");
        let main_loop = glib::MainLoop::new(None, false);
        let handler = LiveBusHandler::new(&pipeline, &main_loop, false);

        let eos = gst::message::Eos::new();
        assert_eq!(handler.handle(&eos), BusAction::Quit);
        assert_eq!(pipeline.current_state(), gst::State::Ready);

        let buffering = gst::message::Buffering::new(50);
        assert_eq!(handler.handle(&buffering), BusAction::Continue);

        pipeline.set_state(gst::State::Null).unwrap();
    }
}
