//! Diagnostic and benchmarking helpers that sit outside the playback engine core.

pub mod bench;
