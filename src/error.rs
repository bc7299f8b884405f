use gstreamer as gst;
use gstreamer::glib;

/// Errors raised while assembling or driving a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GStreamer could not be initialized: {0}")]
    Init(#[from] glib::Error),

    #[error("element factory '{0}' is not available, is the plugin installed?")]
    MissingElement(String),

    #[error("could not link '{from}' to '{to}'")]
    Link { from: String, to: String },

    #[error("could not link pad '{from}' to '{to}': {reason}")]
    PadLink {
        from: String,
        to: String,
        reason: String,
    },

    #[error("could not request a '{template}' pad from '{element}'")]
    PadRequest { element: String, template: String },

    #[error("element '{element}' has no '{pad}' pad")]
    MissingPad { element: String, pad: String },

    #[error("unable to set the pipeline to the {0:?} state")]
    StateChange(gst::State),

    #[error("pipeline reported an error: {0}")]
    Pipeline(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("clock wait failed: {0}")]
    Clock(String),

    #[error(transparent)]
    Bool(#[from] glib::BoolError),
}

pub type Result<T> = std::result::Result<T, Error>;
