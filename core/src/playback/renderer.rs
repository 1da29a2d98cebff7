//! The renderer capability set and its `DISABLED -> ENABLED -> STARTED`
//! state machine.
//!
//! Grounded on the `PlayerState` transitions in `playback/player/mod.rs`/
//! `controls.rs` (`Init -> Resuming -> Playing`, `Playing -> Pausing ->
//! Paused`, `any -> Stopping -> Stopped`): this is the same shape at finer
//! grain, one machine per renderer instead of one per player.
//! `replace_stream`'s seamless-transition precondition mirrors the
//! seamless-reconfiguration guard in `effects.rs`'s `set_effects` vs
//! `set_effects_inline` — one path tears down and rebuilds, the other swaps
//! state in place without interrupting output.

use super::error::PlaybackError;
use super::media_period::SampleStream;

/// What kind of samples a renderer consumes. `None` renderers receive no
/// `SampleStream` and are excluded from enabled-renderer counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    None,
    Audio,
    Video,
    Text,
    Metadata,
}

/// Static description of what a renderer supports, consulted by track
/// selection and the queue's ad/period transition logic.
#[derive(Debug, Clone)]
pub struct RendererCapabilities {
    pub track_type: TrackType,
}

/// The fixed configuration identity of a renderer's decode pipeline.
/// `replace_stream` is only legal between streams whose configuration
/// compares equal — this is what "seamless" means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfiguration {
    pub codec_tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Disabled,
    Enabled,
    Started,
}

/// Capability set implemented by a concrete renderer (audio decoder, video
/// decoder, text track, ...). Owned exclusively by the engine while enabled;
/// released to `Disabled` before any handoff, `reset()` before teardown.
pub trait Renderer: Send {
    fn track_type(&self) -> TrackType;
    fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            track_type: self.track_type(),
        }
    }
    fn state(&self) -> RendererState;

    /// `Disabled -> Enabled`.
    fn enable(
        &mut self,
        configuration: RendererConfiguration,
        stream: Box<dyn SampleStream>,
        start_position_us: i64,
        joining: bool,
        renderer_offset_us: i64,
    ) -> Result<(), PlaybackError>;

    /// `Enabled -> Started`.
    fn start(&mut self) -> Result<(), PlaybackError>;
    /// `Started -> Enabled`.
    fn stop(&mut self);
    /// `any -> Disabled`, drops the stream without releasing codec resources.
    fn disable(&mut self);
    /// `any -> Disabled`, additionally releases codec-level resources.
    /// Legal from any state, including `Disabled` (no-op then).
    fn reset(&mut self);

    /// Swap in a new stream of the same `RendererConfiguration` without
    /// leaving `Enabled`/`Started`. Only legal once the current stream has
    /// been read to end.
    fn replace_stream(
        &mut self,
        configuration: RendererConfiguration,
        stream: Box<dyn SampleStream>,
        renderer_offset_us: i64,
    ) -> Result<(), PlaybackError>;

    /// Consume available input and produce output for one tick. Legal in
    /// `Started` (and in `Enabled` for pre-roll render).
    fn render(&mut self, position_us: i64, elapsed_realtime_us: i64) -> Result<(), PlaybackError>;

    fn is_ready(&self) -> bool;
    fn is_ended(&self) -> bool;

    fn has_read_stream_to_end(&self) -> bool;
    fn set_current_stream_final(&mut self);
    fn is_current_stream_final(&self) -> bool;

    /// Invalidates any read-ahead. Legal in `Enabled`/`Started`.
    fn reset_position(&mut self, position_us: i64);
    fn get_reading_position_us(&self) -> i64;

    fn set_operating_rate(&mut self, speed: f64);
}
