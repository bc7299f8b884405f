//! Feeding application generated audio into a pipeline and reading it back.
//!
//! `appsrc` asks for data with `need-data` and tells us to back off with
//! `enough-data`. While data is wanted an idle source on the main context
//! keeps pushing 1024 byte buffers of a synthetic waveform.

use crate::common::CAT;
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_audio as gst_audio;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Bytes sent in each buffer.
pub const CHUNK_SIZE: usize = 1024;
/// Samples per second.
pub const SAMPLE_RATE: u32 = 44_100;
/// S16 mono, so two bytes per sample.
pub const SAMPLES_PER_CHUNK: usize = CHUNK_SIZE / 2;

/// Caps of the generated stream: S16LE, mono, 44.1 kHz.
pub fn audio_caps() -> Result<gst::Caps, glib::BoolError> {
    gst_audio::AudioInfo::builder(gst_audio::AudioFormat::S16le, SAMPLE_RATE, 1)
        .build()?
        .to_caps()
}

/// Psychedelic waveform: a sine whose frequency itself oscillates.
#[derive(Debug, Clone)]
pub struct WaveGenerator {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    num_samples: u64,
}

impl Default for WaveGenerator {
    fn default() -> Self {
        Self {
            a: 0.0,
            b: 1.0,
            c: 0.0,
            d: 1.0,
            num_samples: 0,
        }
    }
}

impl WaveGenerator {
    /// Samples produced so far.
    pub fn num_samples(&self) -> u64 {
        self.num_samples
    }

    /// Fills `samples` with the next part of the waveform.
    pub fn fill(&mut self, samples: &mut [i16]) {
        self.c += self.d;
        self.d -= self.c / 1000.0;
        let freq = 1100.0 + 1000.0 * self.d;

        for sample in samples.iter_mut() {
            self.a += self.b;
            self.b -= self.a / freq;
            *sample = (500.0 * self.a) as i16;
        }
        self.num_samples += samples.len() as u64;
    }

    /// Timestamp and duration of a chunk of `samples` starting at `start`.
    pub fn timing(start: u64, samples: u64) -> (gst::ClockTime, gst::ClockTime) {
        let rate = u64::from(SAMPLE_RATE);
        let pts = gst::ClockTime::SECOND
            .mul_div_floor(start, rate)
            .unwrap_or(gst::ClockTime::MAX);
        let duration = gst::ClockTime::SECOND
            .mul_div_floor(samples, rate)
            .unwrap_or(gst::ClockTime::ZERO);
        (pts, duration)
    }

    /// Produces the next timestamped [`CHUNK_SIZE`] byte buffer.
    pub fn next_buffer(&mut self) -> Result<gst::Buffer, glib::BoolError> {
        let mut samples = [0i16; SAMPLES_PER_CHUNK];
        let (pts, duration) = Self::timing(self.num_samples, SAMPLES_PER_CHUNK as u64);
        self.fill(&mut samples);

        let mut buffer = gst::Buffer::with_size(CHUNK_SIZE)?;
        {
            let buffer = buffer
                .get_mut()
                .ok_or_else(|| glib::bool_error!("new buffer is not writable"))?;
            buffer.set_pts(pts);
            buffer.set_duration(duration);
            let mut map = buffer
                .map_writable()
                .map_err(|_| glib::bool_error!("failed to map buffer writable"))?;
            for (bytes, sample) in map.chunks_exact_mut(2).zip(samples.iter()) {
                bytes.copy_from_slice(&sample.to_le_bytes());
            }
        }
        Ok(buffer)
    }
}

#[derive(Default)]
struct FeedState {
    generator: WaveGenerator,
    source: Option<glib::Source>,
}

/// Keeps an `appsrc` supplied with [`WaveGenerator`] output.
///
/// Buffers are pushed from an idle source on the thread default main context
/// of the thread calling [`Feeder::attach`], so that context must be iterated.
pub struct Feeder {
    state: Arc<Mutex<FeedState>>,
}

impl Feeder {
    /// Configures `appsrc` for the generated caps and installs the callbacks.
    /// The feed stops when the returned value is dropped.
    pub fn attach(appsrc: &gst_app::AppSrc) -> Result<Self, glib::BoolError> {
        appsrc.set_caps(Some(&audio_caps()?));
        appsrc.set_format(gst::Format::Time);

        let context = glib::MainContext::ref_thread_default();
        let state = Arc::new(Mutex::new(FeedState::default()));
        let need_state = Arc::downgrade(&state);
        let enough_state = Arc::downgrade(&state);

        appsrc.set_callbacks(
            gst_app::AppSrcCallbacks::builder()
                .need_data(move |appsrc, _size| {
                    let Some(state) = need_state.upgrade() else {
                        return;
                    };
                    let mut guard = state.lock().unwrap();
                    if guard.source.is_none() {
                        println!("Start the feed.");
                        guard.source = Some(Self::start_idle_push(appsrc, &state, &context));
                    }
                })
                .enough_data(move |_| {
                    let Some(state) = enough_state.upgrade() else {
                        return;
                    };
                    let source = state.lock().unwrap().source.take();
                    if let Some(source) = source {
                        println!("Stop the feed.");
                        source.destroy();
                    }
                })
                .build(),
        );

        Ok(Self { state })
    }

    fn start_idle_push(
        appsrc: &gst_app::AppSrc,
        state: &Arc<Mutex<FeedState>>,
        context: &glib::MainContext,
    ) -> glib::Source {
        let appsrc = appsrc.clone();
        let state = Arc::downgrade(state);

        let source = glib::idle_source_new(Some("rtmpmix-feed"), glib::Priority::DEFAULT_IDLE, move || {
            let Some(state) = state.upgrade() else {
                return glib::ControlFlow::Break;
            };

            let next = state.lock().unwrap().generator.next_buffer();
            let pushed = next
                .map_err(|err| {
                    gst::error!(CAT, obj = appsrc, "failed to generate audio: {}", err);
                })
                .and_then(|buffer| {
                    appsrc.push_buffer(buffer).map_err(|err| {
                        gst::debug!(CAT, obj = appsrc, "push stopped: {:?}", err);
                    })
                });

            match pushed {
                Ok(_) => glib::ControlFlow::Continue,
                Err(()) => {
                    // returning Break destroys the source
                    state.lock().unwrap().source = None;
                    glib::ControlFlow::Break
                }
            }
        });
        source.attach(Some(context));
        source
    }

    /// Samples pushed so far.
    pub fn num_samples(&self) -> u64 {
        self.state.lock().unwrap().generator.num_samples()
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        let source = self.state.lock().unwrap().source.take();
        if let Some(source) = source {
            source.destroy();
        }
    }
}

/// Pulls every sample reaching `appsink` and prints a `*` for each one.
/// Returns the running count.
pub fn attach_sink_counter(appsink: &gst_app::AppSink) -> Result<Arc<AtomicU64>, glib::BoolError> {
    appsink.set_caps(Some(&audio_caps()?));

    let received = Arc::new(AtomicU64::new(0));
    let counter = received.clone();
    appsink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let _sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                counter.fetch_add(1, Ordering::Relaxed);
                print!("*");
                let _ = std::io::stdout().flush();
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );

    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{init_for_tests, link_chain};

    #[test]
    fn timing_follows_sample_count() {
        let (pts, duration) = WaveGenerator::timing(0, SAMPLES_PER_CHUNK as u64);
        assert_eq!(pts, gst::ClockTime::ZERO);
        assert_eq!(duration.nseconds(), 512 * 1_000_000_000 / 44_100);

        let (pts, _) = WaveGenerator::timing(44_100, 512);
        assert_eq!(pts, gst::ClockTime::SECOND);
    }

    #[test]
    fn waveform_starts_from_rest_and_advances() {
        let mut generator = WaveGenerator::default();
        let mut samples = [0i16; 4];
        generator.fill(&mut samples);

        // a accumulates b, which starts at 1.0
        assert_eq!(samples[0], 500);
        assert!(samples.iter().all(|&s| s > 0));
        assert_eq!(generator.num_samples(), 4);

        let mut next = [0i16; 4];
        generator.fill(&mut next);
        assert_ne!(samples, next);
        assert_eq!(generator.num_samples(), 8);
    }

    #[test]
    fn buffers_are_contiguous() {
        init_for_tests();
        let mut generator = WaveGenerator::default();
        let first = generator.next_buffer().unwrap();
        let second = generator.next_buffer().unwrap();

        assert_eq!(first.size(), CHUNK_SIZE);
        assert_eq!(first.pts(), Some(gst::ClockTime::ZERO));
        assert_eq!(
            first.pts().unwrap() + first.duration().unwrap(),
            second.pts().unwrap()
        );
    }

    #[test]
    fn pushed_buffers_reach_the_appsink() {
        init_for_tests();
        let pipeline = gst::Pipeline::with_name("feed-test");
        let appsrc = gst_app::AppSrc::builder().name("app_source").build();
        let appsink = gst_app::AppSink::builder().name("app_sink").sync(false).build();
        pipeline.add_many([appsrc.upcast_ref::<gst::Element>(), appsink.upcast_ref()]).unwrap();
        link_chain(&[appsrc.upcast_ref(), appsink.upcast_ref()]).unwrap();

        appsrc.set_caps(Some(&audio_caps().unwrap()));
        appsrc.set_format(gst::Format::Time);
        let received = attach_sink_counter(&appsink).unwrap();
        pipeline.set_state(gst::State::Playing).unwrap();

        let mut generator = WaveGenerator::default();
        for _ in 0..3 {
            appsrc.push_buffer(generator.next_buffer().unwrap()).unwrap();
        }
        appsrc.end_of_stream().unwrap();

        let bus = pipeline.bus().unwrap();
        let msg = bus
            .timed_pop_filtered(
                gst::ClockTime::from_seconds(5),
                &[gst::MessageType::Eos, gst::MessageType::Error],
            )
            .expect("pipeline should finish");
        assert_eq!(msg.type_(), gst::MessageType::Eos);
        pipeline.set_state(gst::State::Null).unwrap();

        assert_eq!(received.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn feeder_pushes_until_the_queue_is_full() {
        init_for_tests();
        let context = glib::MainContext::new();
        context
            .with_thread_default(|| {
                let pipeline = gst::Pipeline::with_name("feeder-test");
                let appsrc = gst_app::AppSrc::builder()
                    .name("app_source")
                    .max_bytes(4 * CHUNK_SIZE as u64)
                    .build();
                let appsink = gst_app::AppSink::builder().name("app_sink").sync(false).build();
                pipeline.add_many([appsrc.upcast_ref::<gst::Element>(), appsink.upcast_ref()]).unwrap();
                link_chain(&[appsrc.upcast_ref(), appsink.upcast_ref()]).unwrap();

                let feeder = Feeder::attach(&appsrc).unwrap();
                let received = attach_sink_counter(&appsink).unwrap();

                let main_loop = glib::MainLoop::new(Some(&context), false);
                let quit = main_loop.clone();
                glib::timeout_source_new(
                    std::time::Duration::from_millis(500),
                    None,
                    glib::Priority::DEFAULT,
                    move || {
                        quit.quit();
                        glib::ControlFlow::Break
                    },
                )
                .attach(Some(&context));

                pipeline.set_state(gst::State::Playing).unwrap();
                main_loop.run();
                pipeline.set_state(gst::State::Null).unwrap();

                let received = received.load(Ordering::Relaxed);
                assert!(received > 0);
                assert!(feeder.num_samples() >= received * SAMPLES_PER_CHUNK as u64);

                drop(feeder);
            })
            .unwrap();
    }
}
