//! `rodio` sample buffer helpers shared by the audio renderer and mixer code.

pub mod buffer;
pub mod samples;
