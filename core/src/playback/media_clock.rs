//! The playback clock: a position in microseconds advancing at
//! `speed` either standalone or delegated to a renderer's own clock.
//!
//! Grounded on the `ts: Arc<Mutex<f64>>` position tracking in `Player`
//! (pre-trim `playback/player/mod.rs`) and the fade-driven rate
//! changes in `controls.rs`, generalized from an implicit fixed rate of 1.0
//! to an explicit [`PlaybackParameters`].

use std::sync::Arc;

use super::clock::Clock;

/// Speed/pitch applied to the media clock. Pitch has no effect on position
/// accounting; it is carried through for renderer-side resampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParameters {
    pub speed: f64,
    pub pitch: f64,
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self { speed: 1.0, pitch: 1.0 }
    }
}

#[derive(Debug, Clone, Copy)]
struct StandaloneState {
    last_set_position_us: i64,
    set_at_elapsed_ms: i64,
    started: bool,
}

/// Trait implemented by a renderer that exposes its own clock (e.g. an audio
/// renderer whose output device is the real pacing source). When delegated,
/// `sync_and_get_position_us` reads from it instead of extrapolating.
pub trait RendererClockSource: Send {
    fn get_position_us(&self) -> Option<i64>;
    fn is_ready(&self) -> bool;
    fn has_read_stream_to_end(&self) -> bool;
}

pub struct MediaClock {
    clock: Arc<dyn Clock>,
    playback_parameters: PlaybackParameters,
    standalone: StandaloneState,
    delegate: Option<Box<dyn RendererClockSource>>,
}

impl MediaClock {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            playback_parameters: PlaybackParameters::default(),
            standalone: StandaloneState {
                last_set_position_us: 0,
                set_at_elapsed_ms: 0,
                started: false,
            },
            delegate: None,
        }
    }

    /// `last_set_position + (now - set_time) * speed`, or the delegated
    /// renderer's own reported position when one is active and ready.
    pub fn sync_and_get_position_us(&mut self) -> i64 {
        if let Some(delegate) = &self.delegate {
            if delegate.is_ready() || delegate.has_read_stream_to_end() {
                if let Some(position_us) = delegate.get_position_us() {
                    self.standalone.last_set_position_us = position_us;
                    self.standalone.set_at_elapsed_ms = self.clock.elapsed_realtime_ms();
                    return position_us;
                }
            }
        }
        self.extrapolate_standalone_position_us()
    }

    fn extrapolate_standalone_position_us(&self) -> i64 {
        if !self.standalone.started {
            return self.standalone.last_set_position_us;
        }
        let elapsed_ms = self.clock.elapsed_realtime_ms() - self.standalone.set_at_elapsed_ms;
        let elapsed_us = (elapsed_ms as f64 * 1000.0 * self.playback_parameters.speed) as i64;
        self.standalone.last_set_position_us + elapsed_us
    }

    pub fn reset_position(&mut self, position_us: i64) {
        self.standalone.last_set_position_us = position_us;
        self.standalone.set_at_elapsed_ms = self.clock.elapsed_realtime_ms();
    }

    pub fn start(&mut self) {
        if !self.standalone.started {
            self.standalone.last_set_position_us = self.extrapolate_standalone_position_us();
            self.standalone.set_at_elapsed_ms = self.clock.elapsed_realtime_ms();
            self.standalone.started = true;
        }
    }

    pub fn stop(&mut self) {
        if self.standalone.started {
            self.standalone.last_set_position_us = self.extrapolate_standalone_position_us();
            self.standalone.started = false;
        }
    }

    pub fn set_playback_parameters(&mut self, parameters: PlaybackParameters) {
        // Re-baseline so the speed change takes effect only going forward.
        self.standalone.last_set_position_us = self.extrapolate_standalone_position_us();
        self.standalone.set_at_elapsed_ms = self.clock.elapsed_realtime_ms();
        self.playback_parameters = parameters;
    }

    pub fn playback_parameters(&self) -> PlaybackParameters {
        self.playback_parameters
    }

    /// Bind to a renderer-provided clock; the standalone clock keeps its
    /// last observed position so it can resume seamlessly if the renderer is
    /// later disabled.
    pub fn on_renderer_enabled(&mut self, delegate: Box<dyn RendererClockSource>) {
        self.delegate = Some(delegate);
    }

    pub fn on_renderer_disabled(&mut self) {
        if let Some(delegate) = self.delegate.take() {
            if let Some(position_us) = delegate.get_position_us() {
                self.standalone.last_set_position_us = position_us;
                self.standalone.set_at_elapsed_ms = self.clock.elapsed_realtime_ms();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::VirtualClock;

    #[test]
    fn standalone_position_extrapolates_with_speed() {
        let clock = Arc::new(VirtualClock::new());
        let mut media_clock = MediaClock::new(clock.clone());
        media_clock.reset_position(1_000_000);
        media_clock.start();
        clock.advance(500); // 500ms of wall time
        assert_eq!(media_clock.sync_and_get_position_us(), 1_500_000);
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let clock = Arc::new(VirtualClock::new());
        let mut media_clock = MediaClock::new(clock.clone());
        media_clock.reset_position(1_000_000);
        media_clock.start();
        clock.advance(200);
        media_clock.stop();
        let at_stop = media_clock.sync_and_get_position_us();
        clock.advance(300);
        assert_eq!(media_clock.sync_and_get_position_us(), at_stop);
    }

    #[test]
    fn disabling_delegate_resumes_from_last_observed_position() {
        struct FixedDelegate(i64);
        impl RendererClockSource for FixedDelegate {
            fn get_position_us(&self) -> Option<i64> {
                Some(self.0)
            }
            fn is_ready(&self) -> bool {
                true
            }
            fn has_read_stream_to_end(&self) -> bool {
                false
            }
        }

        let clock = Arc::new(VirtualClock::new());
        let mut media_clock = MediaClock::new(clock.clone());
        media_clock.on_renderer_enabled(Box::new(FixedDelegate(2_000_000)));
        assert_eq!(media_clock.sync_and_get_position_us(), 2_000_000);

        media_clock.on_renderer_disabled();
        clock.advance(0);
        assert_eq!(media_clock.sync_and_get_position_us(), 2_000_000);
    }
}
