//! Buffering policy consulted by the engine's scheduler tick.
//!
//! `get_back_buffer_duration_us`/`retain_back_buffer_from_keyframe` mirror
//! `PlaybackBufferSettings`'s shape (a small value struct handed to the
//! runtime rather than a config-file layer); `should_continue_loading` /
//! `should_start_playback` are new policy hooks this multi-period queue
//! needs that the single-track `start_buffer_ms` buffering model didn't.

use std::sync::{Arc, Mutex};

pub trait LoadControl: Send {
    fn on_prepared(&mut self);
    fn on_tracks_selected(&mut self, renderer_count: usize);
    fn on_stopped(&mut self);
    fn on_released(&mut self);

    fn get_back_buffer_duration_us(&self) -> i64;
    fn retain_back_buffer_from_keyframe(&self) -> bool;

    fn should_continue_loading(&self, buffered_duration_us: i64, playback_speed: f64) -> bool;
    fn should_start_playback(&self, buffered_duration_us: i64, playback_speed: f64, rebuffering: bool) -> bool;
}

/// Buffering thresholds, the engine's analogue of `PlaybackBufferSettings`.
#[derive(Debug, Clone, Copy)]
pub struct LoadControlSettings {
    pub min_buffer_us: i64,
    pub max_buffer_us: i64,
    pub buffer_for_playback_us: i64,
    pub buffer_for_playback_after_rebuffer_us: i64,
    pub back_buffer_duration_us: i64,
    pub retain_back_buffer_from_keyframe: bool,
}

impl LoadControlSettings {
    pub fn new(min_buffer_us: i64, max_buffer_us: i64) -> Self {
        Self {
            min_buffer_us,
            max_buffer_us: max_buffer_us.max(min_buffer_us),
            buffer_for_playback_us: (min_buffer_us / 2).max(0),
            buffer_for_playback_after_rebuffer_us: min_buffer_us,
            back_buffer_duration_us: 0,
            retain_back_buffer_from_keyframe: false,
        }
    }
}

impl Default for LoadControlSettings {
    fn default() -> Self {
        // 2.5s / 15s buffer window, comparable in spirit to the
        // `start_buffer_ms` default of 20ms-per-chunk pacing scaled up to a
        // single-period buffering horizon.
        Self::new(2_500_000, 15_000_000)
    }
}

#[derive(Debug, Default)]
struct LoadControlState {
    prepared: bool,
}

/// Default `LoadControl`: continue loading until `max_buffer_us`, and start
/// playback once either the full `buffer_for_playback*` threshold is met or
/// the source has reported it cannot load any more.
#[derive(Debug, Clone)]
pub struct DefaultLoadControl {
    settings: LoadControlSettings,
    state: Arc<Mutex<LoadControlState>>,
}

impl DefaultLoadControl {
    pub fn new(settings: LoadControlSettings) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(LoadControlState::default())),
        }
    }
}

impl Default for DefaultLoadControl {
    fn default() -> Self {
        Self::new(LoadControlSettings::default())
    }
}

impl LoadControl for DefaultLoadControl {
    fn on_prepared(&mut self) {
        self.state.lock().unwrap().prepared = true;
    }

    fn on_tracks_selected(&mut self, _renderer_count: usize) {}

    fn on_stopped(&mut self) {
        self.state.lock().unwrap().prepared = false;
    }

    fn on_released(&mut self) {}

    fn get_back_buffer_duration_us(&self) -> i64 {
        self.settings.back_buffer_duration_us
    }

    fn retain_back_buffer_from_keyframe(&self) -> bool {
        self.settings.retain_back_buffer_from_keyframe
    }

    fn should_continue_loading(&self, buffered_duration_us: i64, _playback_speed: f64) -> bool {
        buffered_duration_us < self.settings.max_buffer_us
    }

    fn should_start_playback(&self, buffered_duration_us: i64, _playback_speed: f64, rebuffering: bool) -> bool {
        let threshold = if rebuffering {
            self.settings.buffer_for_playback_after_rebuffer_us
        } else {
            self.settings.buffer_for_playback_us
        };
        buffered_duration_us >= threshold
    }
}
