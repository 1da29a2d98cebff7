//! The cooperative scheduler: one worker, one message queue, one owned
//! engine instance driving renderers, the media-period queue, and the
//! external `PlaybackInfo` event stream.
//!
//! Grounded on the playback worker loop in
//! `playback/player/runtime/worker/runner.rs` (pre-trim): a thread that
//! blocks, drains pending work, computes how long to sleep, and repeats.
//! `PlaybackEngine` generalizes that single hard-coded "check state, act,
//! sleep" cycle into a typed command queue consumed via a
//! [`HandlerWrapper`], with the renderer array and [`MediaPeriodQueue`]
//! standing in for a single audio pipeline. Reset-on-error mirrors the
//! `kill_current`/`stop` sequence in `controls.rs` (flip state, join the
//! worker, reset position), generalized to walk every renderer to
//! `Disabled` and clear the queue.

use std::sync::{Arc, Condvar, Mutex};

use super::clock::{Clock, VirtualClock};
use super::error::PlaybackError;
use super::handler::HandlerWrapper;
use super::load_control::LoadControl;
use super::media_clock::{MediaClock, PlaybackParameters};
use super::media_period::MediaPeriodId;
use super::media_period_queue::MediaPeriodQueue;
use super::media_source::MediaSource;
use super::message::{PendingMessageInfo, PlayerMessage, Resolution, sort_pending_messages};
use super::playback_info::{DiscontinuityReason, PlaybackInfo, PlaybackInfoUpdate, PlaybackState};
use super::renderer::{Renderer, RendererCapabilities, RendererConfiguration, RendererState};
use super::timeline::{RepeatMode, Timeline};
use super::track_selector::TrackSelector;

const PREPARING_SOURCE_INTERVAL_MS: i64 = 10;
const RENDERING_INTERVAL_MS: i64 = 10;
const IDLE_INTERVAL_MS: i64 = 1000;
const MAX_QUEUED_PERIODS: usize = 3;

/// Seek tolerance, consulted by `get_adjusted_seek_position_us` on the
/// target `MediaPeriod`. Open question: whether this applies again on a
/// queue-internal reseek (triggered by a repeat/shuffle change) is left to
/// the source; this engine does not re-apply tolerance on those internal
/// reseeks, since they don't originate from a user seek request. See
/// DESIGN.md.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekParameters {
    pub tolerance_before_us: i64,
    pub tolerance_after_us: i64,
}

/// Observer of the engine's external event channel.
pub trait EngineEventListener: Send {
    fn on_playback_info_changed(
        &mut self,
        operation_acks: u32,
        discontinuity_reason: Option<DiscontinuityReason>,
        info: PlaybackInfo,
    );
    fn on_playback_parameters_changed(&mut self, parameters: PlaybackParameters) {
        let _ = parameters;
    }
    fn on_error(&mut self, error: PlaybackError) {
        let _ = error;
    }
}

/// Discards every event. Useful as a placeholder and in tests that only
/// assert on `PlaybackEngine::snapshot()`.
#[derive(Default)]
pub struct NullEventListener;
impl EngineEventListener for NullEventListener {
    fn on_playback_info_changed(&mut self, _: u32, _: Option<DiscontinuityReason>, _: PlaybackInfo) {}
}

/// Handle a caller blocks (production) or polls (virtual-clock tests) to
/// learn that a `SET_FOREGROUND_MODE(false)`/`RELEASE` command has been
/// processed by the worker. Named after the `playback_thread_exists`-style
/// liveness flag already polled for the same purpose elsewhere in the
/// crate.
#[derive(Clone)]
pub struct AckHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl AckHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn signal(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    /// Block until the worker has processed the command. Only meaningful
    /// against a real worker thread ([`PlaybackEngine::new`]); against a
    /// virtual-clock engine nothing runs until the test calls
    /// [`VirtualClock::advance`], so blocking here would deadlock — use
    /// [`AckHandle::is_set`] instead in tests.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut done = lock.lock().unwrap();
        while !*done {
            done = cvar.wait(done).unwrap();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.inner.0.lock().unwrap()
    }
}

/// Public handle to a running engine. Every command enqueues a closure on
/// the engine's own `HandlerWrapper`; nothing mutates engine state off the
/// worker.
pub struct PlaybackEngine {
    handler: Arc<HandlerWrapper>,
    state: Arc<Mutex<EngineState>>,
}

impl PlaybackEngine {
    /// Start a real background worker thread driven by wall-clock time.
    pub fn new(
        clock: Arc<dyn Clock>,
        renderers: Vec<Box<dyn Renderer>>,
        track_selector: Box<dyn TrackSelector>,
        load_control: Box<dyn LoadControl>,
        listener: Box<dyn EngineEventListener>,
    ) -> Self {
        let handler = Arc::new(HandlerWrapper::spawn(clock.clone(), |_: i32| {}));
        Self::with_handler(handler, clock, renderers, track_selector, load_control, listener)
    }

    /// Bind to a [`VirtualClock`]; nothing runs until the caller advances it.
    pub fn new_virtual(
        clock: VirtualClock,
        renderers: Vec<Box<dyn Renderer>>,
        track_selector: Box<dyn TrackSelector>,
        load_control: Box<dyn LoadControl>,
        listener: Box<dyn EngineEventListener>,
    ) -> Self {
        let handler = Arc::new(HandlerWrapper::new_virtual(clock.clone(), |_: i32| {}));
        Self::with_handler(handler, Arc::new(clock), renderers, track_selector, load_control, listener)
    }

    fn with_handler(
        handler: Arc<HandlerWrapper>,
        clock: Arc<dyn Clock>,
        renderers: Vec<Box<dyn Renderer>>,
        track_selector: Box<dyn TrackSelector>,
        load_control: Box<dyn LoadControl>,
        listener: Box<dyn EngineEventListener>,
    ) -> Self {
        let renderer_capabilities = renderers.iter().map(|r| r.capabilities()).collect();
        let state = Arc::new(Mutex::new(EngineState::new(
            clock,
            renderers,
            renderer_capabilities,
            track_selector,
            load_control,
            listener,
        )));
        Self { handler, state }
    }

    fn post_command(&self, f: impl FnOnce(&mut EngineState) + Send + 'static) {
        let state = self.state.clone();
        let handler = self.handler.clone();
        self.handler.post(move || {
            let mut guard = state.lock().unwrap();
            if guard.released {
                return;
            }
            f(&mut guard);
            flush_update(&mut guard);
            ensure_tick_scheduled(&handler, &state, &mut guard);
        });
    }

    pub fn prepare(&self, source: Box<dyn MediaSource>, reset_position: bool, reset_state: bool) {
        self.post_command(move |s| s.handle_prepare(source, reset_position, reset_state));
    }

    pub fn set_play_when_ready(&self, play_when_ready: bool) {
        self.post_command(move |s| s.handle_set_play_when_ready(play_when_ready));
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.post_command(move |s| s.handle_set_repeat_mode(mode));
    }

    pub fn set_shuffle_mode_enabled(&self, enabled: bool) {
        self.post_command(move |s| s.handle_set_shuffle_mode_enabled(enabled));
    }

    pub fn seek_to(&self, window_index: usize, position_us: i64) {
        self.post_command(move |s| s.handle_seek_to(window_index, position_us));
    }

    pub fn set_playback_parameters(&self, parameters: PlaybackParameters) {
        self.post_command(move |s| s.handle_set_playback_parameters(parameters));
    }

    pub fn set_seek_parameters(&self, parameters: SeekParameters) {
        self.post_command(move |s| s.seek_parameters = parameters);
    }

    pub fn stop(&self, reset: bool) {
        self.post_command(move |s| s.handle_stop(reset));
    }

    pub fn send_message(&self, message: PlayerMessage) {
        self.post_command(move |s| s.handle_send_message(message));
    }

    /// `SET_FOREGROUND_MODE(bool)`. Returns an [`AckHandle`] the caller can
    /// block on (real worker) or poll (virtual-clock tests).
    pub fn set_foreground_mode(&self, enabled: bool) -> AckHandle {
        let ack = AckHandle::new();
        let ack_for_worker = ack.clone();
        self.post_command(move |s| {
            s.handle_set_foreground_mode(enabled);
            ack_for_worker.signal();
        });
        ack
    }

    /// `RELEASE`. Terminates the engine; further commands are dropped.
    pub fn release(&self) -> AckHandle {
        let ack = AckHandle::new();
        let ack_for_worker = ack.clone();
        self.post_command(move |s| {
            s.handle_release();
            ack_for_worker.signal();
        });
        ack
    }

    /// For tests bound to a [`VirtualClock`]: process whatever is currently
    /// due without advancing time.
    pub fn pump(&self) {
        self.handler.pump();
    }

    pub fn snapshot(&self) -> PlaybackInfo {
        self.state.lock().unwrap().playback_info.clone()
    }
}

fn flush_update(state: &mut EngineState) {
    if !state.playback_info_update.has_pending_update() {
        return;
    }
    let parameters_changed = state.playback_info_update.has_playback_parameters_change;
    let (acks, reason, info) = state.playback_info_update.take_for_publish();
    if parameters_changed {
        state.listener.on_playback_parameters_changed(state.playback_parameters);
    }
    state.listener.on_playback_info_changed(acks, reason, info);
}

fn ensure_tick_scheduled(handler: &Arc<HandlerWrapper>, state_arc: &Arc<Mutex<EngineState>>, state: &mut EngineState) {
    if state.released || state.tick_scheduled {
        return;
    }
    state.tick_scheduled = true;
    schedule_tick(handler.clone(), state_arc.clone(), 0);
}

fn schedule_tick(handler: Arc<HandlerWrapper>, state_arc: Arc<Mutex<EngineState>>, delay_ms: i64) {
    let handler_for_closure = handler.clone();
    let state_for_closure = state_arc.clone();
    handler.post_delayed(
        move || run_tick(&handler_for_closure, &state_for_closure),
        delay_ms,
    );
}

fn run_tick(handler: &Arc<HandlerWrapper>, state_arc: &Arc<Mutex<EngineState>>) {
    let mut guard = state_arc.lock().unwrap();
    if guard.released {
        return;
    }
    guard.tick_scheduled = false;
    let next_delay = guard.do_some_work();
    flush_update(&mut guard);
    if let Some(delay) = next_delay {
        guard.tick_scheduled = true;
        drop(guard);
        schedule_tick(handler.clone(), state_arc.clone(), delay);
    }
}

struct EngineState {
    clock: Arc<dyn Clock>,
    renderers: Vec<Box<dyn Renderer>>,
    renderer_capabilities: Vec<RendererCapabilities>,
    track_selector: Box<dyn TrackSelector>,
    load_control: Box<dyn LoadControl>,
    listener: Box<dyn EngineEventListener>,

    source: Option<Box<dyn MediaSource>>,
    queue: MediaPeriodQueue,
    media_clock: MediaClock,

    playback_info: PlaybackInfo,
    playback_info_update: PlaybackInfoUpdate,

    play_when_ready: bool,
    repeat_mode: RepeatMode,
    shuffle_mode_enabled: bool,
    playback_parameters: PlaybackParameters,
    seek_parameters: SeekParameters,
    foreground_mode: bool,
    rebuffering: bool,

    pending_messages: Vec<PendingMessageInfo>,
    pending_seek_adjustment: bool,

    tick_scheduled: bool,
    released: bool,
}

impl EngineState {
    fn new(
        clock: Arc<dyn Clock>,
        renderers: Vec<Box<dyn Renderer>>,
        renderer_capabilities: Vec<RendererCapabilities>,
        track_selector: Box<dyn TrackSelector>,
        load_control: Box<dyn LoadControl>,
        listener: Box<dyn EngineEventListener>,
    ) -> Self {
        let mut playback_info_update = PlaybackInfoUpdate::new();
        playback_info_update.reset(PlaybackInfo::dormant(Timeline::empty(), 0, false));
        Self {
            media_clock: MediaClock::new(clock.clone()),
            clock,
            renderers,
            renderer_capabilities,
            track_selector,
            load_control,
            listener,
            source: None,
            queue: MediaPeriodQueue::new(MAX_QUEUED_PERIODS),
            playback_info: PlaybackInfo::dormant(Timeline::empty(), 0, false),
            playback_info_update,
            play_when_ready: false,
            repeat_mode: RepeatMode::Off,
            shuffle_mode_enabled: false,
            playback_parameters: PlaybackParameters::default(),
            seek_parameters: SeekParameters::default(),
            foreground_mode: true,
            rebuffering: false,
            pending_messages: Vec::new(),
            pending_seek_adjustment: false,
            tick_scheduled: false,
            released: false,
        }
    }

    fn publish(&mut self) {
        self.playback_info_update.set_playback_info(self.playback_info.clone());
    }

    // --- commands -----------------------------------------------------

    fn handle_prepare(&mut self, mut source: Box<dyn MediaSource>, reset_position: bool, reset_state: bool) {
        self.disable_and_reset_all_renderers();
        self.queue.clear(!reset_state);
        self.pending_messages.clear();
        source.prepare_source();
        self.source = Some(source);
        self.load_control.on_prepared();
        let start_position_us = if reset_position { 0 } else { self.playback_info.position_us };
        self.playback_info = PlaybackInfo::dormant(Timeline::empty(), start_position_us, self.play_when_ready);
        self.media_clock.reset_position(start_position_us);
        self.playback_info_update.increment_acks();
        self.publish();
    }

    fn handle_set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
        self.playback_info.play_when_ready = play_when_ready;
        if play_when_ready && self.playback_info.playback_state == PlaybackState::Ready {
            self.start_renderers();
            self.media_clock.start();
        } else {
            self.stop_renderers();
            self.media_clock.stop();
        }
        self.playback_info_update.increment_acks();
        self.publish();
    }

    fn handle_set_repeat_mode(&mut self, mode: RepeatMode) {
        let still_valid = self.queue.update_repeat_mode(mode);
        self.repeat_mode = mode;
        self.playback_info_update.increment_acks();
        if !still_valid {
            self.reseek_current_internal();
        }
        self.publish();
    }

    fn handle_set_shuffle_mode_enabled(&mut self, enabled: bool) {
        let still_valid = self.queue.update_shuffle_mode_enabled(enabled);
        self.shuffle_mode_enabled = enabled;
        self.playback_info_update.increment_acks();
        if !still_valid {
            self.reseek_current_internal();
        }
        self.publish();
    }

    fn handle_set_playback_parameters(&mut self, parameters: PlaybackParameters) {
        self.playback_parameters = parameters;
        self.media_clock.set_playback_parameters(parameters);
        self.playback_info.playback_parameters = parameters;
        self.playback_info_update.has_playback_parameters_change = true;
        self.publish();
    }

    fn handle_set_foreground_mode(&mut self, enabled: bool) {
        self.foreground_mode = enabled;
        if !enabled {
            for renderer in &mut self.renderers {
                if renderer.state() == RendererState::Disabled {
                    renderer.reset();
                }
            }
        }
        self.playback_info_update.increment_acks();
        self.publish();
    }

    fn handle_stop(&mut self, reset: bool) {
        self.disable_and_reset_all_renderers();
        self.queue.clear(!reset);
        self.media_clock.stop();
        self.load_control.on_stopped();
        let position_us = if reset { 0 } else { self.playback_info.position_us };
        self.playback_info = PlaybackInfo::dormant(self.playback_info.timeline.clone(), position_us, self.play_when_ready);
        self.media_clock.reset_position(position_us);
        self.playback_info_update.increment_acks();
        self.publish();
    }

    fn handle_release(&mut self) {
        self.disable_and_reset_all_renderers();
        if let Some(mut source) = self.source.take() {
            source.release_source();
        }
        self.queue.clear(false);
        self.load_control.on_released();
        self.pending_messages.clear();
        self.released = true;
    }

    fn handle_send_message(&mut self, message: PlayerMessage) {
        let window_index = message.window_index;
        let position_us = message.position_ms.saturating_mul(1000);
        let mut info = PendingMessageInfo::new(message);
        match self.queue.timeline().get_period_position(window_index, position_us) {
            Some((period_uid, period_time_us)) => {
                let period_index = self.queue.timeline().get_index_of_period(period_uid);
                info.resolution = Resolution::Resolved { period_index, period_time_us };
                self.pending_messages.push(info);
                sort_pending_messages(&mut self.pending_messages);
            }
            None => {
                info.message.mark_as_processed(false);
            }
        }
    }

    // --- internal helpers ----------------------------------------------

    /// Run track selection for the playing holder and bind the resulting
    /// streams to matching renderers. Track selection policy itself is out
    /// of scope for this engine, but the call itself — select, then enable
    /// each renderer the result turns on — is not.
    fn activate_tracks_for_playing_holder(&mut self) {
        let Some(playing_id) = self.queue.get_playing_period().map(|h| h.info.id) else {
            return;
        };
        let available_track_types = self
            .queue
            .get_playing_period()
            .map(|h| h.media_period.get_track_groups())
            .unwrap_or_default();
        let timeline = self.queue.timeline().clone();
        let result = self
            .track_selector
            .select_tracks(&self.renderer_capabilities, &available_track_types, playing_id, &timeline);
        self.track_selector.on_selection_activated(&result);

        let start_position_us = self
            .queue
            .get_playing_period()
            .map(|h| h.start_position_in_renderer_time_us())
            .unwrap_or(0);
        let renderer_offset_us = self.queue.get_playing_period().map(|h| h.renderer_offset_us).unwrap_or(0);

        let mut streams = match self.queue.get_playing_period_mut() {
            Some(holder) => holder.media_period.select_tracks(&self.renderer_capabilities, &result),
            None => return,
        };

        for (index, renderer) in self.renderers.iter_mut().enumerate() {
            if !result.is_renderer_enabled(index) {
                continue;
            }
            let Some(stream) = streams.remove(&index) else { continue };
            let configuration = RendererConfiguration {
                codec_tag: format!("{:?}", renderer.track_type()),
            };
            if renderer
                .enable(configuration, stream, start_position_us, false, renderer_offset_us)
                .is_ok()
            {
                let _ = renderer.start();
            }
        }

        if let Some(holder) = self.queue.get_playing_period_mut() {
            holder.has_enabled_tracks = result.selected_track_types.iter().any(|t| t.is_some());
            holder.track_selector_result = Some(result);
        }
    }

    fn disable_and_reset_all_renderers(&mut self) {
        for renderer in &mut self.renderers {
            renderer.disable();
            renderer.reset();
        }
    }

    fn start_renderers(&mut self) {
        for renderer in &mut self.renderers {
            if renderer.state() == RendererState::Enabled {
                let _ = renderer.start();
            }
        }
    }

    fn stop_renderers(&mut self) {
        for renderer in &mut self.renderers {
            if renderer.state() == RendererState::Started {
                renderer.stop();
            }
        }
    }

    fn reseek_current_internal(&mut self) {
        if let Some(playing) = self.queue.get_playing_period() {
            let id = playing.info.id;
            let position_us = self.playback_info.position_us;
            self.seek_to_period_position(id, position_us, DiscontinuityReason::Internal);
        }
    }

    fn seek_to_period_position(&mut self, id: MediaPeriodId, position_us: i64, reason: DiscontinuityReason) {
        self.queue.clear(false);
        if let Some(source) = self.source.as_mut() {
            let info = self.queue.resolve_first_media_period_info(id.period_uid, position_us);
            let resolved_id = info.id;
            self.queue.enqueue_next_media_period(source.as_mut(), info);
            if let Some(holder) = self.queue.get_playing_period_mut() {
                holder.media_period.seek_to_us(position_us);
            }
            self.playback_info.playing_period_id = Some(resolved_id);
            self.disable_and_reset_all_renderers();
        }
        self.media_clock.reset_position(position_us);
        self.playback_info.position_us = position_us;
        self.playback_info.content_position_us = position_us;
        self.playback_info.start_position_us = position_us;
        self.playback_info_update.set_discontinuity_reason(reason);
        self.publish();
    }

    fn handle_seek_to(&mut self, window_index: usize, requested_position_us: i64) {
        let clamped = self
            .queue
            .timeline()
            .get_window(window_index)
            .and_then(|w| w.duration_us)
            .map(|duration| requested_position_us > duration)
            .unwrap_or(false);

        match self.queue.timeline().get_period_position(window_index, requested_position_us) {
            None => {
                self.playback_info_update.set_discontinuity_reason(DiscontinuityReason::SeekAdjustment);
                self.playback_info.position_us = super::timeline::TIME_UNSET;
                self.playback_info_update.increment_acks();
                self.publish();
            }
            Some((period_uid, period_position_us)) => {
                let resolved_id = self.queue.resolve_media_period_id_for_ads(period_uid, period_position_us);
                let is_noop = self
                    .queue
                    .get_playing_period()
                    .map(|h| h.info.id == resolved_id && positions_within_one_ms(self.playback_info.position_us, period_position_us))
                    .unwrap_or(false);
                self.playback_info_update.increment_acks();
                if !is_noop {
                    self.seek_to_period_position(resolved_id, period_position_us, DiscontinuityReason::Seek);
                    self.pending_seek_adjustment = clamped;
                } else {
                    self.publish();
                }
            }
        }
    }

    // --- scheduler tick --------------------------------------------------

    /// One `DO_SOME_WORK` tick. Returns the delay, in ms, before the next
    /// tick should run, or `None` if no further ticking is needed right now
    /// (a command will re-arm scheduling when that changes).
    fn do_some_work(&mut self) -> Option<i64> {
        self.maybe_refresh_source_info();
        self.maybe_enqueue_next_period();
        self.maybe_prepare_and_load_periods();
        self.maybe_activate_playing_tracks();

        if !self.queue.has_playing_period() {
            if let Some(source) = &self.source {
                if let Err(err) = source.maybe_throw_source_info_refresh_error() {
                    self.recover_from_error(err);
                    return Some(PREPARING_SOURCE_INTERVAL_MS);
                }
            }
            return Some(PREPARING_SOURCE_INTERVAL_MS);
        }

        let (old_position_us, new_position_us, current_period_index) = self.update_playback_positions();
        self.maybe_trigger_pending_messages(current_period_index, old_position_us, new_position_us);
        self.discard_back_buffer();
        self.queue.reevaluate_buffer(new_position_us);
        self.render_enabled_renderers(new_position_us);
        self.maybe_advance_playing_period(new_position_us);
        self.update_state_transition(new_position_us);

        if self.pending_seek_adjustment {
            self.pending_seek_adjustment = false;
            self.playback_info_update.set_discontinuity_reason(DiscontinuityReason::SeekAdjustment);
        }

        self.publish();

        match self.playback_info.playback_state {
            PlaybackState::Ready | PlaybackState::Buffering => Some(RENDERING_INTERVAL_MS),
            PlaybackState::Idle | PlaybackState::Ended => {
                if self.play_when_ready {
                    Some(IDLE_INTERVAL_MS)
                } else {
                    None
                }
            }
        }
    }

    fn maybe_refresh_source_info(&mut self) {
        let Some(source) = self.source.as_mut() else { return };
        if let Some(timeline) = source.poll_timeline_refresh() {
            self.queue.set_timeline(timeline.clone());
            self.playback_info.timeline = timeline;
            self.playback_info_update.set_discontinuity_reason(DiscontinuityReason::Internal);
            if !self.queue.update_queued_periods(self.playback_info.position_us) {
                self.reseek_current_internal();
            }
        }
    }

    fn maybe_enqueue_next_period(&mut self) {
        let Some(source) = self.source.as_mut() else { return };
        if self.queue.timeline().is_empty() {
            return;
        }
        if !self.queue.has_playing_period() {
            let first_uid = match self.queue.timeline().get_uid_of_period(0) {
                Some(uid) => uid,
                None => return,
            };
            let start_position_us = self.playback_info.start_position_us;
            let info = self.queue.resolve_first_media_period_info(first_uid, start_position_us);
            let resolved_id = info.id;
            self.queue.enqueue_next_media_period(source.as_mut(), info);
            self.playback_info.playing_period_id = Some(resolved_id);
            self.playback_info.loading_period_id = Some(resolved_id);
            self.playback_info.playback_state = PlaybackState::Buffering;
            self.playback_info_update.increment_acks();
            return;
        }
        if self.queue.should_load_next_media_period() {
            if let Some(info) = self.queue.get_next_media_period_info() {
                let loading_id = info.id;
                self.queue.enqueue_next_media_period(source.as_mut(), info);
                self.playback_info.loading_period_id = Some(loading_id);
            }
        }
    }

    /// Drive `prepare`/`continue_loading` for every queued holder. The real
    /// collaborator only returns non-empty streams from `select_tracks` once
    /// its decode thread has actually started, so nothing downstream can
    /// bind tracks until this has run at least once for the playing holder.
    fn maybe_prepare_and_load_periods(&mut self) {
        let holder_count = self.queue.holder_count();
        let speed = self.playback_parameters.speed;
        let mut prepare_error = None;

        for i in 0..holder_count {
            let Some(holder) = self.queue.get_holder_mut(i) else { continue };

            if !holder.prepared {
                if holder.media_period.is_prepared() {
                    holder.prepared = true;
                } else if let Err(err) = holder.media_period.prepare() {
                    prepare_error.get_or_insert(err);
                    continue;
                } else {
                    holder.prepared = holder.media_period.is_prepared();
                }
            }

            if let Err(err) = holder.media_period.maybe_throw_prepare_error() {
                prepare_error.get_or_insert(err);
                continue;
            }

            if !holder.prepared {
                continue;
            }

            let start_us = holder.start_position_in_renderer_time_us();
            let buffered_ahead_us = (holder.media_period.get_buffered_position_us() - start_us).max(0);
            if self.load_control.should_continue_loading(buffered_ahead_us, speed) {
                let load_position_us = holder.media_period.get_next_load_position_us();
                holder.media_period.continue_loading(load_position_us);
            }
        }

        if let Some(err) = prepare_error {
            self.recover_from_error(err);
        }
    }

    /// Bind streams for the playing holder once it reports prepared. Track
    /// selection is otherwise a one-shot operation per holder (re-running it
    /// on an already-activated holder would rebuild its renderer streams for
    /// nothing), so this is a no-op once `track_selector_result` is set.
    fn maybe_activate_playing_tracks(&mut self) {
        let Some(playing) = self.queue.get_playing_period() else { return };
        if !playing.prepared || playing.track_selector_result.is_some() {
            return;
        }
        self.activate_tracks_for_playing_holder();
        self.load_control.on_tracks_selected(self.renderers.len());
        self.playback_info_update.increment_acks();
    }

    /// Returns `(old_position_us, new_position_us, current_period_index)`.
    fn update_playback_positions(&mut self) -> (i64, i64, usize) {
        let old_position_us = self.playback_info.position_us;
        let renderer_offset_us = self.queue.get_playing_period().map(|h| h.renderer_offset_us).unwrap_or(0);

        let discontinuity_us = self
            .queue
            .get_playing_period_mut()
            .and_then(|h| h.media_period.read_discontinuity());

        let new_position_us = match discontinuity_us {
            Some(period_local_us) => {
                self.media_clock.reset_position(period_local_us + renderer_offset_us);
                self.playback_info_update.set_discontinuity_reason(DiscontinuityReason::Internal);
                period_local_us
            }
            None => {
                let renderer_position_us = self.media_clock.sync_and_get_position_us();
                renderer_position_us - renderer_offset_us
            }
        };

        self.playback_info.position_us = new_position_us;
        self.playback_info.content_position_us = new_position_us;

        let current_period_index = self
            .queue
            .get_playing_period()
            .map(|h| self.queue.timeline().get_index_of_period(h.info.id.period_uid))
            .unwrap_or(super::timeline::INDEX_UNSET);

        (old_position_us, new_position_us, current_period_index)
    }

    fn maybe_trigger_pending_messages(&mut self, current_period_index: usize, old_position_us: i64, new_position_us: i64) {
        if self.pending_messages.is_empty() || old_position_us >= new_position_us {
            return;
        }
        let mut delivered = vec![false; self.pending_messages.len()];
        for (i, info) in self.pending_messages.iter().enumerate() {
            if info.message.is_canceled() {
                continue;
            }
            if let Resolution::Resolved { period_index, period_time_us } = info.resolution {
                if period_index == current_period_index
                    && period_time_us > old_position_us
                    && period_time_us <= new_position_us
                {
                    delivered[i] = true;
                }
            }
        }
        for (i, info) in self.pending_messages.iter().enumerate() {
            if delivered[i] {
                {
                    let mut target = info.message.target.lock().unwrap();
                    target.handle_message(0, info.message.payload.as_ref());
                }
                info.message.mark_as_processed(true);
            }
        }
        let mut i = 0;
        self.pending_messages.retain(|info| {
            let keep = if delivered[i] {
                !info.message.delete_after_delivery
            } else {
                !info.message.is_canceled()
            };
            i += 1;
            keep
        });
    }

    fn discard_back_buffer(&mut self) {
        let back_buffer_us = self.load_control.get_back_buffer_duration_us();
        let position_us = self.playback_info.position_us;
        if let Some(holder) = self.queue.get_playing_period_mut() {
            holder.media_period.discard_buffer((position_us - back_buffer_us).max(0));
        }
    }

    fn render_enabled_renderers(&mut self, renderer_position_us: i64) {
        let elapsed_realtime_us = self.clock.elapsed_realtime_ms() * 1000;
        let mut first_error = None;
        for (index, renderer) in self.renderers.iter_mut().enumerate() {
            if renderer.state() != RendererState::Started {
                continue;
            }
            let Err(err) = renderer.render(renderer_position_us, elapsed_realtime_us) else {
                continue;
            };
            // A renderer that is still ready or waiting to drain its current
            // stream may have thrown a transient error; only a renderer that
            // has stalled outright is treated as fatal.
            if renderer.is_ready() || renderer.has_read_stream_to_end() {
                continue;
            }
            first_error.get_or_insert(PlaybackError::Renderer {
                renderer_index: index,
                message: err.to_string(),
            });
        }
        if let Some(error) = first_error {
            self.recover_from_error(error);
        }
    }

    /// Surface `error` to the listener, then apply the §7 recovery policy:
    /// source errors stop without resetting position, renderer/unexpected/OOM
    /// errors force a full reset.
    fn recover_from_error(&mut self, error: PlaybackError) {
        let force_reset = error.requires_force_reset();
        self.listener.on_error(error);
        self.handle_stop(force_reset);
    }

    fn all_enabled_renderers_ended(&self) -> bool {
        self.renderers
            .iter()
            .filter(|r| r.state() != RendererState::Disabled)
            .all(|r| r.is_ended())
    }

    fn maybe_advance_playing_period(&mut self, renderer_position_us: i64) {
        if !self.play_when_ready {
            return;
        }
        loop {
            let should_advance = match (self.queue.get_playing_period(), self.next_holder_start_us()) {
                (Some(_playing), Some(next_start_us)) => renderer_position_us >= next_start_us,
                _ => false,
            };
            if !should_advance {
                break;
            }
            let old_id = self.queue.get_playing_period().map(|h| h.info.id);
            if self.queue.advance_playing_period().is_none() {
                break;
            }
            let new_id = self.queue.get_playing_period().map(|h| h.info.id);
            let reason = match (old_id, new_id) {
                (Some(old), Some(new)) if old.is_ad() || new.is_ad() => DiscontinuityReason::AdInsertion,
                _ => DiscontinuityReason::PeriodTransition,
            };
            self.playback_info.playing_period_id = new_id;
            self.playback_info_update.set_discontinuity_reason(reason);
            // A full disable/reactivate rather than `Renderer::replace_stream`:
            // correct either way, just not the seamless path available for a
            // matching `RendererConfiguration`. Reactivation itself happens
            // on a later tick, once `maybe_activate_playing_tracks` sees the
            // new playing holder report prepared.
            self.disable_and_reset_all_renderers();
        }
    }

    /// Renderer-timebase start of the holder immediately after the playing
    /// one, regardless of how many holders are queued beyond it.
    fn next_holder_start_us(&self) -> Option<i64> {
        self.queue.get_holder(1).map(|h| h.start_position_in_renderer_time_us())
    }

    fn update_state_transition(&mut self, position_us: i64) {
        let Some(playing) = self.queue.get_playing_period() else { return };
        let duration_us = playing.info.duration_us;
        let is_final = playing.info.is_final;
        let no_successor = self.queue.holder_count() < 2;

        let content_passed = duration_us.map(|d| position_us >= d).unwrap_or(false);
        let renderers_ended = self.all_enabled_renderers_ended();

        if content_passed && is_final && no_successor && renderers_ended {
            self.playback_info.playback_state = PlaybackState::Ended;
            self.playback_info.position_us = duration_us.unwrap_or(position_us);
            self.stop_renderers();
            self.media_clock.stop();
            return;
        }

        let is_loading = self.queue.is_loading(playing.info.id) && !content_passed;
        self.playback_info.is_loading = is_loading;

        match self.playback_info.playback_state {
            PlaybackState::Buffering => {
                let renderers_ready = self.renderers.iter().all(|r| r.state() == RendererState::Disabled || r.is_ready());
                let buffered_us = playing.media_period.get_buffered_position_us().max(0);
                if renderers_ready
                    && (!is_loading
                        || self
                            .load_control
                            .should_start_playback(buffered_us, self.playback_parameters.speed, self.rebuffering))
                {
                    self.playback_info.playback_state = PlaybackState::Ready;
                    self.rebuffering = false;
                    if self.play_when_ready {
                        self.start_renderers();
                        self.media_clock.start();
                    }
                }
            }
            PlaybackState::Ready => {
                let timeline_ready = duration_us.is_none() || position_us < duration_us.unwrap() || !no_successor;
                let renderers_ready = self.renderers.iter().all(|r| r.state() == RendererState::Disabled || r.is_ready());
                if !timeline_ready && !renderers_ready {
                    self.playback_info.playback_state = PlaybackState::Buffering;
                    self.rebuffering = self.play_when_ready;
                    self.stop_renderers();
                    self.media_clock.stop();
                }
            }
            _ => {}
        }
    }
}

fn positions_within_one_ms(a_us: i64, b_us: i64) -> bool {
    (a_us - b_us).abs() <= 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::media_period::{MediaPeriod, SampleStream};
    use crate::playback::renderer::TrackType;
    use crate::playback::timeline::{Ad, AdGroup, Period, PeriodUid, Window};
    use crate::playback::track_selector::{FixedTrackSelector, TrackSelectorResult};
    use crate::playback::load_control::DefaultLoadControl;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoTrackMediaPeriod {
        duration_us: i64,
    }
    impl MediaPeriod for NoTrackMediaPeriod {
        fn prepare(&mut self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn is_prepared(&self) -> bool {
            true
        }
        fn get_track_groups(&self) -> Vec<TrackType> {
            Vec::new()
        }
        fn select_tracks(
            &mut self,
            _renderer_capabilities: &[RendererCapabilities],
            _selector_result: &TrackSelectorResult,
        ) -> HashMap<usize, Box<dyn SampleStream>> {
            HashMap::new()
        }
        fn discard_buffer(&mut self, _position_us: i64) {}
        fn read_discontinuity(&mut self) -> Option<i64> {
            None
        }
        fn get_buffered_position_us(&self) -> i64 {
            self.duration_us
        }
        fn continue_loading(&mut self, _load_position_us: i64) -> bool {
            false
        }
        fn get_next_load_position_us(&self) -> i64 {
            super::super::timeline::TIME_UNSET
        }
        fn reevaluate_buffer(&mut self, _renderer_position_us: i64) {}
        fn seek_to_us(&mut self, position_us: i64) -> i64 {
            position_us
        }
        fn get_adjusted_seek_position_us(&self, position_us: i64) -> i64 {
            position_us
        }
        fn maybe_throw_prepare_error(&self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn release(&mut self) {}
    }

    struct FixedTimelineSource {
        timeline: Option<Timeline>,
        period_durations: HashMap<PeriodUid, i64>,
    }
    impl FixedTimelineSource {
        fn new(timeline: Timeline) -> Self {
            let period_durations = (0..timeline.get_period_count())
                .filter_map(|i| {
                    let p = timeline.get_period(i)?;
                    Some((p.uid, p.duration_us.unwrap_or(0)))
                })
                .collect();
            Self {
                timeline: Some(timeline),
                period_durations,
            }
        }
    }
    impl MediaSource for FixedTimelineSource {
        fn prepare_source(&mut self) {}
        fn maybe_throw_source_info_refresh_error(&self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn create_period(&mut self, id: MediaPeriodId, _start_position_us: i64) -> Box<dyn MediaPeriod> {
            let duration_us = self.period_durations.get(&id.period_uid).copied().unwrap_or(0);
            Box::new(NoTrackMediaPeriod { duration_us })
        }
        fn release_period(&mut self, _id: MediaPeriodId) {}
        fn release_source(&mut self) {}
        fn poll_timeline_refresh(&mut self) -> Option<Timeline> {
            self.timeline.take()
        }
    }

    struct RecordingListener {
        events: Arc<Mutex<Vec<(u32, Option<DiscontinuityReason>, PlaybackState, i64)>>>,
    }
    impl EngineEventListener for RecordingListener {
        fn on_playback_info_changed(
            &mut self,
            acks: u32,
            reason: Option<DiscontinuityReason>,
            info: PlaybackInfo,
        ) {
            self.events
                .lock()
                .unwrap()
                .push((acks, reason, info.playback_state, info.position_us));
        }
    }

    fn single_period_timeline(duration_us: i64) -> Timeline {
        let uid = PeriodUid::new();
        let period = Period {
            uid,
            window_index: 0,
            duration_us: Some(duration_us),
            position_in_window_us: 0,
            ad_groups: Vec::new(),
        };
        let window = Window {
            tag: None,
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(duration_us),
            first_period_index: 0,
            period_count: 1,
        };
        Timeline::new(vec![window], vec![period])
    }

    fn new_test_engine(events: Arc<Mutex<Vec<(u32, Option<DiscontinuityReason>, PlaybackState, i64)>>>) -> (PlaybackEngine, VirtualClock) {
        let clock = VirtualClock::new();
        let engine = PlaybackEngine::new_virtual(
            clock.clone(),
            Vec::new(),
            Box::new(FixedTrackSelector),
            Box::new(DefaultLoadControl::default()),
            Box::new(RecordingListener { events }),
        );
        (engine, clock)
    }

    #[test]
    fn simple_play_through_reaches_ended_at_full_duration() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());
        let timeline = single_period_timeline(10_000_000);
        let source = Box::new(FixedTimelineSource::new(timeline));

        engine.prepare(source, true, true);
        engine.set_play_when_ready(true);
        clock.advance(0);

        for _ in 0..1100 {
            clock.advance(10);
        }

        let last = events.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.2, PlaybackState::Ended);
        assert_eq!(last.3, 10_000_000);
    }

    #[test]
    fn seek_produces_exactly_one_seek_discontinuity() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());
        let timeline = single_period_timeline(10_000_000);
        let source = Box::new(FixedTimelineSource::new(timeline));

        engine.prepare(source, true, true);
        engine.set_play_when_ready(true);
        clock.advance(0);
        clock.advance(2_000);

        engine.seek_to(0, 5_000_000);
        clock.advance(0);

        let seek_events: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, reason, _, _)| *reason == Some(DiscontinuityReason::Seek))
            .cloned()
            .collect();
        assert_eq!(seek_events.len(), 1);
        assert_eq!(seek_events[0].3, 5_000_000);
    }

    #[test]
    fn period_transition_fires_when_crossing_boundary() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());

        let p0 = Period {
            uid: PeriodUid::new(),
            window_index: 0,
            duration_us: Some(3_000_000),
            position_in_window_us: 0,
            ad_groups: Vec::new(),
        };
        let p1 = Period {
            uid: PeriodUid::new(),
            window_index: 0,
            duration_us: Some(2_000_000),
            position_in_window_us: 3_000_000,
            ad_groups: Vec::new(),
        };
        let window = Window {
            tag: None,
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(5_000_000),
            first_period_index: 0,
            period_count: 2,
        };
        let timeline = Timeline::new(vec![window], vec![p0.clone(), p1]);
        let source = Box::new(FixedTimelineSource::new(timeline));

        engine.prepare(source, true, true);
        engine.set_play_when_ready(true);
        clock.advance(0);

        for _ in 0..400 {
            clock.advance(10);
        }

        let transitions: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, reason, _, _)| *reason == Some(DiscontinuityReason::PeriodTransition))
            .cloned()
            .collect();
        assert_eq!(transitions.len(), 1);
    }

    #[test]
    fn ad_group_inserts_and_returns_to_content() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());

        let ad_group = AdGroup::new(4_000_000, vec![Ad { duration_us: 1_500_000 }]);
        let uid = PeriodUid::new();
        let period = Period {
            uid,
            window_index: 0,
            duration_us: Some(10_000_000),
            position_in_window_us: 0,
            ad_groups: vec![ad_group],
        };
        let window = Window {
            tag: None,
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(10_000_000),
            first_period_index: 0,
            period_count: 1,
        };
        let timeline = Timeline::new(vec![window], vec![period]);
        let source = Box::new(FixedTimelineSource::new(timeline));

        engine.prepare(source, true, true);
        engine.set_play_when_ready(true);
        clock.advance(0);

        for _ in 0..450 {
            clock.advance(10);
        }

        let ad_events: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, reason, _, _)| *reason == Some(DiscontinuityReason::AdInsertion))
            .cloned()
            .collect();
        assert!(ad_events.len() >= 1);
    }

    #[test]
    fn timed_message_delivers_exactly_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());
        let timeline = single_period_timeline(10_000_000);
        let source = Box::new(FixedTimelineSource::new(timeline));

        struct CountingTarget(Arc<AtomicUsize>);
        impl super::super::message::MessageTarget for CountingTarget {
            fn handle_message(&mut self, _message_type: i32, _payload: &(dyn std::any::Any + Send)) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        let target: Arc<std::sync::Mutex<dyn super::super::message::MessageTarget>> =
            Arc::new(std::sync::Mutex::new(CountingTarget(count.clone())));
        let message = PlayerMessage::new(target, Box::new(()), 0, 3_500).delete_after_delivery(true);

        engine.prepare(source, true, true);
        engine.send_message(message);
        engine.set_play_when_ready(true);
        clock.advance(0);

        for _ in 0..1100 {
            clock.advance(10);
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeat_all_keeps_engine_ready_past_two_full_plays() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (engine, clock) = new_test_engine(events.clone());

        let uid0 = PeriodUid::new();
        let uid1 = PeriodUid::new();
        let p0 = Period {
            uid: uid0,
            window_index: 0,
            duration_us: Some(1_000_000),
            position_in_window_us: 0,
            ad_groups: Vec::new(),
        };
        let p1 = Period {
            uid: uid1,
            window_index: 1,
            duration_us: Some(1_000_000),
            position_in_window_us: 0,
            ad_groups: Vec::new(),
        };
        let w0 = Window {
            tag: None,
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(1_000_000),
            first_period_index: 0,
            period_count: 1,
        };
        let w1 = Window {
            tag: None,
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(1_000_000),
            first_period_index: 1,
            period_count: 1,
        };
        let timeline = Timeline::new(vec![w0, w1], vec![p0, p1]);
        let source = Box::new(FixedTimelineSource::new(timeline.clone()));

        engine.prepare(source, true, true);
        engine.set_repeat_mode(RepeatMode::Off);
        engine.set_play_when_ready(true);
        clock.advance(0);
        for _ in 0..220 {
            clock.advance(10);
        }

        engine.set_repeat_mode(RepeatMode::All);
        engine.seek_to(0, 0);
        engine.set_play_when_ready(true);
        clock.advance(0);

        for _ in 0..420 {
            clock.advance(10);
        }

        let never_ended = events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(20)
            .all(|(_, _, state, _)| *state != PlaybackState::Ended);
        assert!(never_ended);
    }
}
