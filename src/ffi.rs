//! C ABI for driving a relay from other languages (JNA, ctypes, ...).
//!
//! The host allocates an opaque context, configures it with the source and
//! sink locations, calls `rtmpmix_start` on a thread it is willing to block
//! and calls `rtmpmix_stop` from any other thread to end playback:
//!
//! ```c
//! RelayContext *ctx = rtmpmix_allocate();
//! RelayStatus st = rtmpmix_setup("rtmp://host/app/in", "rtmp://host/app/out", ctx);
//! if (st.status_code == 200)
//!     rtmpmix_start(ctx);   /* returns once rtmpmix_stop() ran */
//! rtmpmix_free(ctx);
//! ```

use crate::common::{rtmp_url, CAT};
use crate::error::Error;
use crate::relay::{Relay, StopHandle};
use gstreamer as gst;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Mutex;

pub const STATUS_OK: c_int = 200;
pub const STATUS_BAD_ARGUMENT: c_int = 400;
pub const STATUS_PIPELINE_ERROR: c_int = 500;

/// Result of a setup call. `message` points to a static NUL terminated
/// string and must not be freed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RelayStatus {
    pub message: *const c_char,
    pub status_code: c_int,
}

impl RelayStatus {
    fn new(status_code: c_int, message: &'static [u8]) -> Self {
        debug_assert_eq!(message.last(), Some(&0));
        Self {
            message: message.as_ptr() as *const c_char,
            status_code,
        }
    }

    fn from_error(err: &Error) -> Self {
        gst::error!(CAT, "relay setup failed: {}", err);
        match err {
            Error::MissingElement(_) => {
                Self::new(STATUS_PIPELINE_ERROR, b"Could not create elements.\0")
            }
            Error::Link { .. } | Error::PadLink { .. } => {
                Self::new(STATUS_PIPELINE_ERROR, b"Could not link the relay elements.\0")
            }
            _ => Self::new(STATUS_PIPELINE_ERROR, b"Could not set up the relay.\0"),
        }
    }

    /// The status message as a Rust string.
    pub fn message(&self) -> &'static str {
        // SAFETY: every message is a static, NUL terminated ASCII literal
        unsafe { CStr::from_ptr(self.message) }
            .to_str()
            .unwrap_or_default()
    }
}

/// Opaque handle owned by the host.
#[derive(Default)]
pub struct RelayContext {
    relay: Mutex<Option<Relay>>,
    stop: Mutex<Option<StopHandle>>,
}

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Initializes GStreamer and allocates a context. Returns NULL when
/// GStreamer cannot be initialized.
#[no_mangle]
pub extern "C" fn rtmpmix_allocate() -> *mut RelayContext {
    if let Err(err) = gst::init() {
        eprintln!("Failed to initialize GStreamer: {}", err);
        return std::ptr::null_mut();
    }
    println!("Set up the context and returning the pointer.");
    Box::into_raw(Box::default())
}

/// Builds the relay pipeline inside `context`.
///
/// # Safety
/// `context` must come from [`rtmpmix_allocate`]; the locations must be NULL
/// or valid NUL terminated strings.
#[no_mangle]
pub unsafe extern "C" fn rtmpmix_setup(
    source: *const c_char,
    sink: *const c_char,
    context: *mut RelayContext,
) -> RelayStatus {
    let Some(context) = context.as_ref() else {
        return RelayStatus::new(STATUS_BAD_ARGUMENT, b"Invalid context.\0");
    };
    let (Some(source), Some(sink)) = (str_arg(source), str_arg(sink)) else {
        return RelayStatus::new(
            STATUS_BAD_ARGUMENT,
            b"Source and sink must be valid UTF-8 strings.\0",
        );
    };

    match Relay::new(source, sink, None) {
        Ok(relay) => {
            *context.stop.lock().unwrap() = Some(relay.stop_handle());
            *context.relay.lock().unwrap() = Some(relay);
            println!("Returning successfully...");
            RelayStatus::new(STATUS_OK, b"Success\0")
        }
        Err(err) => RelayStatus::from_error(&err),
    }
}

/// Plays the configured relay, blocking until it is stopped, reaches EOS or
/// fails. Returns 0 on a clean stop and -1 otherwise. A context can only be
/// started once.
///
/// # Safety
/// `context` must come from [`rtmpmix_allocate`] and not be freed while the
/// call is running.
#[no_mangle]
pub unsafe extern "C" fn rtmpmix_start(context: *mut RelayContext) -> c_int {
    let Some(context) = context.as_ref() else {
        return -1;
    };
    let Some(relay) = context.relay.lock().unwrap().take() else {
        eprintln!("The relay has not been set up.");
        return -1;
    };

    match relay.run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Unable to start playing the pipeline: {}", err);
            -1
        }
    }
}

/// Asks a running relay to stop. Safe to call from any thread.
///
/// # Safety
/// `context` must come from [`rtmpmix_allocate`].
#[no_mangle]
pub unsafe extern "C" fn rtmpmix_stop(context: *mut RelayContext) {
    if let Some(context) = context.as_ref() {
        if let Some(stop) = context.stop.lock().unwrap().as_ref() {
            stop.stop();
        }
    }
}

/// Releases a context.
///
/// # Safety
/// `context` must come from [`rtmpmix_allocate`] and must not be used again.
#[no_mangle]
pub unsafe extern "C" fn rtmpmix_free(context: *mut RelayContext) {
    if !context.is_null() {
        drop(Box::from_raw(context));
    }
}

/// Describes a GStreamer version the way `gst_version` reports it.
pub fn version_line(major: u32, minor: u32, micro: u32, nano: u32) -> String {
    let nano = match nano {
        1 => "(CVS)",
        2 => "(Prerelease)",
        _ => "",
    };
    format!(
        "This program is linked against gstreamer version {}.{}.{} {}",
        major, minor, micro, nano
    )
}

/// Prints the version of the GStreamer library in use.
#[no_mangle]
pub extern "C" fn rtmpmix_show_version() {
    let (major, minor, micro, nano) = gst::version();
    println!("{}", version_line(major, minor, micro, nano));
}

/// Publishes `videotestsrc` to `sink`, or to the `stream-videotestsrc`
/// stream on the default server when `sink` is NULL. Blocks until EOS or an
/// error. Returns -1 when the pipeline cannot be built or started.
///
/// # Safety
/// `sink` must be NULL or a valid NUL terminated string.
#[no_mangle]
pub unsafe extern "C" fn rtmpmix_play_test_source(sink: *const c_char) -> c_int {
    let sink = match str_arg(sink) {
        Some(sink) => sink.to_string(),
        None if sink.is_null() => rtmp_url("stream-videotestsrc"),
        None => {
            eprintln!("The sink location must be a valid UTF-8 string.");
            return -1;
        }
    };
    if let Err(err) = gst::init() {
        eprintln!("Failed to initialize GStreamer: {}", err);
        return -1;
    }

    match Relay::test_source(&sink).and_then(|relay| relay.run()) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Unable to play the test source: {}", err);
            -1
        }
    }
}
