//! Immutable playback snapshot and the diff accumulator that decides when to
//! publish one to the external handler.
//!
//! The accumulate-then-flush-on-exit pattern is grounded on `Reporter`
//! (pre-trim `diagnostics/reporter.rs`): it already polled shared
//! state and only invoked its callback when the snapshot changed from the
//! last one sent. `PlaybackInfoUpdate` generalizes "changed from last" into
//! "accumulated since last flush," keyed off message-loop ticks instead of a
//! timer.

use super::media_period::MediaPeriodId;
use super::media_clock::PlaybackParameters;
use super::timeline::Timeline;
use super::track_selector::TrackSelectorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscontinuityReason {
    PeriodTransition,
    Seek,
    SeekAdjustment,
    AdInsertion,
    Internal,
}

impl DiscontinuityReason {
    /// Any non-internal reason outranks `Internal`; two non-internal reasons
    /// never coexist within one tick.
    fn precedence(self) -> u8 {
        match self {
            DiscontinuityReason::Internal => 0,
            _ => 1,
        }
    }
}

/// Immutable snapshot of playback state, published to the external handler
/// as `PLAYBACK_INFO_CHANGED`.
#[derive(Debug, Clone)]
pub struct PlaybackInfo {
    pub timeline: Timeline,
    pub manifest_tag: Option<String>,
    pub playing_period_id: Option<MediaPeriodId>,
    pub loading_period_id: Option<MediaPeriodId>,
    pub start_position_us: i64,
    pub content_position_us: i64,
    pub position_us: i64,
    pub buffered_position_us: i64,
    pub total_buffered_duration_us: i64,
    pub playback_state: PlaybackState,
    pub is_loading: bool,
    pub play_when_ready: bool,
    pub playback_parameters: PlaybackParameters,
    pub track_selector_result: Option<TrackSelectorResult>,
}

impl PlaybackInfo {
    /// The dormant snapshot published by `prepare`/`stop` before any period
    /// has been prepared.
    pub fn dormant(timeline: Timeline, start_position_us: i64, play_when_ready: bool) -> Self {
        Self {
            timeline,
            manifest_tag: None,
            playing_period_id: None,
            loading_period_id: None,
            start_position_us,
            content_position_us: start_position_us,
            position_us: start_position_us,
            buffered_position_us: start_position_us,
            total_buffered_duration_us: 0,
            playback_state: PlaybackState::Idle,
            is_loading: false,
            play_when_ready,
            playback_parameters: PlaybackParameters::default(),
            track_selector_result: None,
        }
    }

    pub fn with_state(&self, playback_state: PlaybackState) -> Self {
        let mut next = self.clone();
        next.playback_state = playback_state;
        next
    }

    pub fn with_position_us(&self, position_us: i64) -> Self {
        let mut next = self.clone();
        next.position_us = position_us;
        next
    }
}

/// Accumulates acknowledgements and the discontinuity reason for the message
/// currently being processed; flushed to `PLAYBACK_INFO_CHANGED` once the
/// handler exits, then reset.
#[derive(Debug, Default)]
pub struct PlaybackInfoUpdate {
    playback_info: Option<PlaybackInfo>,
    operation_acks: u32,
    discontinuity_reason: Option<DiscontinuityReason>,
    pub has_playback_parameters_change: bool,
}

impl PlaybackInfoUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, playback_info: PlaybackInfo) {
        self.playback_info = Some(playback_info);
        self.operation_acks = 0;
        self.discontinuity_reason = None;
        self.has_playback_parameters_change = false;
    }

    pub fn set_playback_info(&mut self, playback_info: PlaybackInfo) {
        self.playback_info = Some(playback_info);
    }

    pub fn playback_info(&self) -> &PlaybackInfo {
        self.playback_info.as_ref().expect("playback info not initialized")
    }

    pub fn increment_acks(&mut self) {
        self.operation_acks += 1;
    }

    /// Record a discontinuity, respecting precedence: a non-internal reason
    /// always wins over `Internal`; two non-internal reasons in one tick
    /// would indicate an engine bug, so the first one recorded is kept.
    pub fn set_discontinuity_reason(&mut self, reason: DiscontinuityReason) {
        match self.discontinuity_reason {
            Some(existing) if existing.precedence() >= reason.precedence() => {}
            _ => self.discontinuity_reason = Some(reason),
        }
    }

    pub fn has_pending_update(&self) -> bool {
        self.operation_acks > 0 || self.discontinuity_reason.is_some() || self.has_playback_parameters_change
    }

    /// Drain the accumulated update for publication, leaving the playback
    /// info in place (the next tick continues from it) but clearing acks and
    /// reason.
    pub fn take_for_publish(&mut self) -> (u32, Option<DiscontinuityReason>, PlaybackInfo) {
        let acks = self.operation_acks;
        let reason = self.discontinuity_reason.take();
        self.operation_acks = 0;
        self.has_playback_parameters_change = false;
        (acks, reason, self.playback_info().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_reason_does_not_override_nothing_then_gets_overridden() {
        let mut update = PlaybackInfoUpdate::new();
        update.reset(PlaybackInfo::dormant(Timeline::empty(), 0, false));
        update.set_discontinuity_reason(DiscontinuityReason::Internal);
        update.set_discontinuity_reason(DiscontinuityReason::Seek);
        let (_, reason, _) = update.take_for_publish();
        assert_eq!(reason, Some(DiscontinuityReason::Seek));
    }

    #[test]
    fn non_internal_reason_is_not_overridden_by_internal() {
        let mut update = PlaybackInfoUpdate::new();
        update.reset(PlaybackInfo::dormant(Timeline::empty(), 0, false));
        update.set_discontinuity_reason(DiscontinuityReason::PeriodTransition);
        update.set_discontinuity_reason(DiscontinuityReason::Internal);
        let (_, reason, _) = update.take_for_publish();
        assert_eq!(reason, Some(DiscontinuityReason::PeriodTransition));
    }

    #[test]
    fn has_pending_update_is_false_after_publish() {
        let mut update = PlaybackInfoUpdate::new();
        update.reset(PlaybackInfo::dormant(Timeline::empty(), 0, false));
        update.increment_acks();
        assert!(update.has_pending_update());
        update.take_for_publish();
        assert!(!update.has_pending_update());
    }
}
