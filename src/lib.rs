use gstreamer as gst;
use gstreamer::glib;

pub mod bus;
pub mod caps;
pub mod common;
pub mod credits;
pub mod error;
pub mod feed;
pub mod ffi;
pub mod layout;
pub mod mixer;
pub mod pads;
pub mod relay;
pub mod seek;

pub use error::Error;

fn plugin_init(plugin: &gst::Plugin) -> Result<(), glib::BoolError> {
    relay::register(plugin)
}

gst::plugin_define!(
    rtmpmix,
    env!("CARGO_PKG_DESCRIPTION"),
    plugin_init,
    env!("CARGO_PKG_VERSION"),
    "MIT/X11",
    env!("CARGO_PKG_NAME"),
    env!("CARGO_PKG_NAME"),
    "https://github.com/edgeimpulse/gst-plugins-rtmpmix",
    env!("BUILD_REL_DATE")
);
