//! Tagged error taxonomy for the engine, in the same hand-rolled
//! `Display`-enum style as `peaks/error.rs`'s `PeaksError` and pre-trim
//! `dsp/impulse_response.rs`'s `ImpulseResponseError`, rather than a
//! `thiserror` derive — nothing else in this codebase reaches for one even
//! though the CLI pulls in plenty of other crates.

use std::fmt::{Display, Formatter};

/// Errors surfaced to the external `ERROR` event.
#[derive(Debug, Clone)]
pub enum PlaybackError {
    Source(String),
    Renderer { renderer_index: usize, message: String },
    Unexpected(String),
    OutOfMemory,
    Remote(String),
}

impl PlaybackError {
    /// Whether recovering from this error should force-reset renderers:
    /// renderer/unexpected/OOM do; a source error does not.
    pub fn requires_force_reset(&self) -> bool {
        !matches!(self, PlaybackError::Source(_))
    }
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(msg) => write!(f, "source error: {}", msg),
            Self::Renderer { renderer_index, message } => {
                write!(f, "renderer {} error: {}", renderer_index, message)
            }
            Self::Unexpected(msg) => write!(f, "unexpected error: {}", msg),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Remote(msg) => write!(f, "remote error: {}", msg),
        }
    }
}

impl std::error::Error for PlaybackError {}

impl From<std::io::Error> for PlaybackError {
    fn from(value: std::io::Error) -> Self {
        Self::Source(value.to_string())
    }
}
