//! Ordered queue of loading/reading/playing media periods, plus ad
//! resolution.
//!
//! The per-renderer `sample_streams` bookkeeping generalizes the per-track
//! ring-buffer map (pre-trim `playback/engine/mod.rs`'s
//! `buffer_map: HashMap<u16, TrackBuffer>`, `audio/buffer.rs`): both are
//! "several independently-advancing data sources behind one mixed output,"
//! both retire an entry once its producer reports finished
//! (`finished_tracks` there, `holder.info.is_final` here). Ad-group
//! resolution reuses the same "resolve a schedule entry against a content
//! position" shape as `Timeline`'s navigation, grounded on
//! `Prot::get_shuffle_schedule`/`ShuffleScheduleEntry`.

use std::collections::VecDeque;

use super::media_period::{MediaPeriod, MediaPeriodHolder, MediaPeriodId, MediaPeriodInfo};
use super::media_source::MediaSource;
use super::renderer::RendererCapabilities;
use super::timeline::{PeriodUid, RepeatMode, Timeline, TIME_UNSET};
use super::track_selector::TrackSelectorResult;

/// Owns the ordered set of [`MediaPeriodHolder`]s the engine is playing
/// through and loading ahead of.
///
/// The front of the queue (index 0) is always the playing period; the tail
/// is always the loading period (the two coincide when only one holder is
/// queued).
pub struct MediaPeriodQueue {
    timeline: Timeline,
    repeat_mode: RepeatMode,
    shuffle_mode_enabled: bool,
    holders: VecDeque<MediaPeriodHolder>,
    max_period_count: usize,
}

impl MediaPeriodQueue {
    pub fn new(max_period_count: usize) -> Self {
        Self {
            timeline: Timeline::empty(),
            repeat_mode: RepeatMode::Off,
            shuffle_mode_enabled: false,
            holders: VecDeque::new(),
            max_period_count: max_period_count.max(1),
        }
    }

    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.timeline = timeline;
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns `false` when the mode change invalidates the current
    /// successor — the engine must then reseek the playing period.
    pub fn update_repeat_mode(&mut self, repeat_mode: RepeatMode) -> bool {
        let valid = self.successor_is_still_valid(repeat_mode, self.shuffle_mode_enabled);
        self.repeat_mode = repeat_mode;
        valid
    }

    /// Returns `false` when the mode change invalidates the current
    /// successor — the engine must then reseek the playing period.
    pub fn update_shuffle_mode_enabled(&mut self, enabled: bool) -> bool {
        let valid = self.successor_is_still_valid(self.repeat_mode, enabled);
        self.shuffle_mode_enabled = enabled;
        valid
    }

    fn successor_is_still_valid(&self, repeat_mode: RepeatMode, shuffle_mode_enabled: bool) -> bool {
        if self.holders.len() < 2 {
            return true;
        }
        let playing = &self.holders[0];
        let Some(period_index) = self.period_index_of(playing.info.id.period_uid) else {
            return true;
        };
        let expected_next = self
            .timeline
            .get_next_period_index(period_index, repeat_mode, shuffle_mode_enabled);
        let actual_next_uid = self.holders[1].info.id.period_uid;
        match expected_next.and_then(|idx| self.timeline.get_uid_of_period(idx)) {
            Some(expected_uid) => expected_uid == actual_next_uid,
            None => false,
        }
    }

    fn period_index_of(&self, uid: PeriodUid) -> Option<usize> {
        let index = self.timeline.get_index_of_period(uid);
        (index != super::timeline::INDEX_UNSET).then_some(index)
    }

    pub fn has_playing_period(&self) -> bool {
        !self.holders.is_empty()
    }

    pub fn get_playing_period(&self) -> Option<&MediaPeriodHolder> {
        self.holders.front()
    }

    pub fn get_playing_period_mut(&mut self) -> Option<&mut MediaPeriodHolder> {
        self.holders.front_mut()
    }

    pub fn get_front_period(&self) -> Option<&MediaPeriodHolder> {
        self.get_playing_period()
    }

    /// Holder at `index` counting forward from the playing holder (`0`),
    /// regardless of how deep the queue is loaded.
    pub fn get_holder(&self, index: usize) -> Option<&MediaPeriodHolder> {
        self.holders.get(index)
    }

    pub fn get_holder_mut(&mut self, index: usize) -> Option<&mut MediaPeriodHolder> {
        self.holders.get_mut(index)
    }

    pub fn get_loading_period(&self) -> Option<&MediaPeriodHolder> {
        self.holders.back()
    }

    pub fn get_loading_period_mut(&mut self) -> Option<&mut MediaPeriodHolder> {
        self.holders.back_mut()
    }

    pub fn is_loading(&self, id: MediaPeriodId) -> bool {
        self.get_loading_period().map(|h| h.info.id) == Some(id)
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    /// Whether there is room in the queue and an adjacent period exists to
    /// load next.
    pub fn should_load_next_media_period(&self) -> bool {
        if self.timeline.is_empty() || self.holders.len() >= self.max_period_count {
            return false;
        }
        self.get_next_media_period_info_internal().is_some()
    }

    fn get_next_media_period_info_internal(&self) -> Option<MediaPeriodInfo> {
        match self.holders.back() {
            None => None, // caller resolves the very first period separately
            Some(loading) => self.info_for_successor_of(loading),
        }
    }

    /// Info for the period that should be loaded after the current loading
    /// holder, or `None` if the timeline has no successor.
    pub fn get_next_media_period_info(&self) -> Option<MediaPeriodInfo> {
        self.get_next_media_period_info_internal()
    }

    fn info_for_successor_of(&self, holder: &MediaPeriodHolder) -> Option<MediaPeriodInfo> {
        if holder.info.id.is_ad() {
            // After an ad, resume content at the same position, advancing
            // past the ad group that just played.
            let next_ad_group = holder.info.id.ad_group_index.map(|g| g + 1);
            let id = MediaPeriodId::content_with_next_ad_group(holder.info.id.period_uid, next_ad_group);
            return Some(self.build_content_info(id, holder.info.content_position_us, false));
        }

        let period_index = self.period_index_of(holder.info.id.period_uid)?;
        let period = self.timeline.get_period(period_index)?;
        let content_end_us = period.duration_us.unwrap_or(0);
        let resolved = self.resolve_media_period_id_for_ads(holder.info.id.period_uid, content_end_us.max(holder.info.content_position_us));

        if resolved.period_uid == holder.info.id.period_uid && !resolved.is_ad() {
            // Same content period has no more ads ahead; move to the next
            // period in source order.
            let next_index = self
                .timeline
                .get_next_period_index(period_index, self.repeat_mode, self.shuffle_mode_enabled)?;
            let next_uid = self.timeline.get_uid_of_period(next_index)?;
            let start_resolved = self.resolve_media_period_id_for_ads(next_uid, 0);
            return Some(self.build_info_for_id(start_resolved, 0));
        }

        Some(self.build_info_for_id(resolved, content_end_us))
    }

    fn build_content_info(&self, id: MediaPeriodId, content_position_us: i64, is_last: bool) -> MediaPeriodInfo {
        let period = self.period_index_of(id.period_uid).and_then(|i| self.timeline.get_period(i));
        MediaPeriodInfo {
            id,
            start_position_us: content_position_us,
            content_position_us,
            is_last_in_timeline_period: is_last,
            is_final: is_last && self.is_last_period_in_timeline(id.period_uid),
            duration_us: period.and_then(|p| p.duration_us),
        }
    }

    fn build_info_for_id(&self, id: MediaPeriodId, content_position_us: i64) -> MediaPeriodInfo {
        if id.is_ad() {
            let period = self.timeline.get_period_by_uid(id.period_uid);
            let duration_us = period
                .and_then(|p| p.ad_groups.get(id.ad_group_index.unwrap()))
                .and_then(|g| g.ads.get(id.ad_index_in_group.unwrap()))
                .map(|ad| ad.duration_us)
                .filter(|&d| d != TIME_UNSET);
            return MediaPeriodInfo {
                id,
                start_position_us: 0,
                content_position_us,
                is_last_in_timeline_period: false,
                is_final: false,
                duration_us,
            };
        }
        let period_index = self.period_index_of(id.period_uid);
        let period = period_index.and_then(|i| self.timeline.get_period(i));
        let is_last_in_window = period_index
            .zip(period)
            .and_then(|(i, p)| self.timeline.get_window(p.window_index).map(|w| i == w.last_period_index()))
            .unwrap_or(true);
        MediaPeriodInfo {
            id,
            start_position_us: content_position_us,
            content_position_us,
            is_last_in_timeline_period: is_last_in_window,
            is_final: is_last_in_window && self.is_last_period_in_timeline(id.period_uid),
            duration_us: period.and_then(|p| p.duration_us),
        }
    }

    fn is_last_period_in_timeline(&self, period_uid: PeriodUid) -> bool {
        let Some(index) = self.period_index_of(period_uid) else {
            return true;
        };
        self.timeline
            .get_next_period_index(index, self.repeat_mode, self.shuffle_mode_enabled)
            .is_none()
    }

    /// Info for the very first period to load, resolved from `(period_uid,
    /// start_position_us)` (typically from a seek or initial prepare).
    pub fn resolve_first_media_period_info(&self, period_uid: PeriodUid, start_position_us: i64) -> MediaPeriodInfo {
        let id = self.resolve_media_period_id_for_ads(period_uid, start_position_us);
        self.build_info_for_id(id, start_position_us)
    }

    /// Returns either a content id with a computed `next_ad_group_index`, or
    /// an ad id if an ad group fires at `content_position_us`: the first
    /// unplayed ad group whose time is `<= content_position_us`, lowest
    /// `ad_group_index` first.
    pub fn resolve_media_period_id_for_ads(&self, period_uid: PeriodUid, content_position_us: i64) -> MediaPeriodId {
        let Some(period) = self.timeline.get_period_by_uid(period_uid) else {
            return MediaPeriodId::content(period_uid);
        };

        let mut next_unplayed_group_index = None;
        for (group_index, group) in period.ad_groups.iter().enumerate() {
            if group.is_fully_played() {
                continue;
            }
            if group.content_position_us <= content_position_us {
                if let Some(ad_index) = group.first_unplayed_ad() {
                    return MediaPeriodId::ad(period_uid, group_index, ad_index);
                }
                continue;
            }
            next_unplayed_group_index.get_or_insert(group_index);
        }

        MediaPeriodId::content_with_next_ad_group(period_uid, next_unplayed_group_index)
    }

    /// Append a new holder at the tail for `info`, creating the
    /// `MediaPeriod` via `source`. Precondition: `should_load_next_media_period()`
    /// held (or this is the very first period in an empty queue).
    pub fn enqueue_next_media_period(
        &mut self,
        source: &mut dyn MediaSource,
        info: MediaPeriodInfo,
    ) {
        let renderer_offset_us = match self.holders.back() {
            Some(predecessor) => {
                predecessor.renderer_offset_us + predecessor.info.duration_us.unwrap_or(0)
            }
            None => 0,
        };
        let media_period = source.create_period(info.id, info.start_position_us);
        let holder = MediaPeriodHolder::new(media_period, info, renderer_offset_us);
        self.holders.push_back(holder);
    }

    /// Rotate the playing cursor forward. Precondition: a prepared successor
    /// exists at index 1.
    pub fn advance_playing_period(&mut self) -> Option<MediaPeriodId> {
        if self.holders.len() < 2 {
            return None;
        }
        let mut removed = self.holders.pop_front().unwrap();
        removed.media_period.release();
        self.holders.front().map(|h| h.info.id)
    }

    /// Release every holder strictly after the one identified by `period_id`.
    /// Returns `true` if anything was actually released.
    pub fn remove_after(&mut self, period_id: MediaPeriodId) -> bool {
        let Some(pos) = self.holders.iter().position(|h| h.info.id == period_id) else {
            return false;
        };
        let mut removed_any = false;
        while self.holders.len() > pos + 1 {
            let mut removed = self.holders.pop_back().unwrap();
            removed.media_period.release();
            removed_any = true;
        }
        removed_any
    }

    /// Release all holders. If `keep_front_period_uid`, the caller is
    /// expected to re-resolve playback starting from the previous front
    /// period's uid (position masking across a full reset).
    pub fn clear(&mut self, _keep_front_period_uid: bool) {
        while let Some(mut holder) = self.holders.pop_back() {
            holder.media_period.release();
        }
    }

    /// Let the loading holder's `MediaPeriod` adjust how far ahead it wants
    /// to buffer, now that playback has reached `renderer_position_us`.
    pub fn reevaluate_buffer(&mut self, renderer_position_us: i64) {
        if let Some(loading) = self.holders.back_mut() {
            loading.media_period.reevaluate_buffer(renderer_position_us);
        }
    }

    /// Recompute holder infos against the current timeline. Returns `false`
    /// if the playing period became incompatible and the engine must reseek.
    pub fn update_queued_periods(&mut self, max_renderer_read_position_us: i64) -> bool {
        for i in 0..self.holders.len() {
            let uid = self.holders[i].info.id.period_uid;
            let Some(period_index) = self.period_index_of(uid) else {
                return i > 0 || self.holders[i].info.start_position_us > max_renderer_read_position_us;
            };
            if let Some(period) = self.timeline.get_period(period_index) {
                self.holders[i].info.duration_us = period.duration_us;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::error::PlaybackError;
    use crate::playback::media_period::SampleStream;
    use crate::playback::timeline::{Period, Window};
    use std::collections::HashMap;

    struct StubMediaPeriod;
    impl MediaPeriod for StubMediaPeriod {
        fn prepare(&mut self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn is_prepared(&self) -> bool {
            true
        }
        fn get_track_groups(&self) -> Vec<super::super::renderer::TrackType> {
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
            0
        }
        fn continue_loading(&mut self, _load_position_us: i64) -> bool {
            false
        }
        fn get_next_load_position_us(&self) -> i64 {
            TIME_UNSET
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

    struct StubSource;
    impl MediaSource for StubSource {
        fn prepare_source(&mut self) {}
        fn maybe_throw_source_info_refresh_error(&self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn create_period(&mut self, _id: MediaPeriodId, _start_position_us: i64) -> Box<dyn MediaPeriod> {
            Box::new(StubMediaPeriod)
        }
        fn release_period(&mut self, _id: MediaPeriodId) {}
        fn release_source(&mut self) {}
        fn poll_timeline_refresh(&mut self) -> Option<Timeline> {
            None
        }
    }

    fn two_period_timeline() -> Timeline {
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
        Timeline::new(vec![window], vec![p0, p1])
    }

    #[test]
    fn renderer_offset_accumulates_across_holders() {
        let timeline = two_period_timeline();
        let mut queue = MediaPeriodQueue::new(3);
        queue.set_timeline(timeline.clone());
        let mut source = StubSource;

        let first_uid = timeline.get_uid_of_period(0).unwrap();
        let first_info = queue.resolve_first_media_period_info(first_uid, 0);
        queue.enqueue_next_media_period(&mut source, first_info);
        assert_eq!(queue.get_playing_period().unwrap().renderer_offset_us, 0);

        let next_info = queue.get_next_media_period_info().unwrap();
        queue.enqueue_next_media_period(&mut source, next_info);
        assert_eq!(queue.get_loading_period().unwrap().renderer_offset_us, 3_000_000);
    }

    #[test]
    fn advance_playing_period_pops_front() {
        let timeline = two_period_timeline();
        let mut queue = MediaPeriodQueue::new(3);
        queue.set_timeline(timeline.clone());
        let mut source = StubSource;

        let first_uid = timeline.get_uid_of_period(0).unwrap();
        let first_info = queue.resolve_first_media_period_info(first_uid, 0);
        queue.enqueue_next_media_period(&mut source, first_info);
        let next_info = queue.get_next_media_period_info().unwrap();
        queue.enqueue_next_media_period(&mut source, next_info);

        let new_playing = queue.advance_playing_period().unwrap();
        assert_eq!(queue.get_playing_period().unwrap().info.id, new_playing);
        assert_eq!(queue.holder_count(), 1);
    }

    #[test]
    fn advance_playing_period_is_noop_with_a_single_holder() {
        let timeline = two_period_timeline();
        let mut queue = MediaPeriodQueue::new(3);
        queue.set_timeline(timeline.clone());
        let mut source = StubSource;

        let first_uid = timeline.get_uid_of_period(0).unwrap();
        let first_info = queue.resolve_first_media_period_info(first_uid, 0);
        queue.enqueue_next_media_period(&mut source, first_info);

        assert!(queue.advance_playing_period().is_none());
        assert_eq!(queue.holder_count(), 1);
    }

    #[test]
    fn ad_group_resolves_before_its_content_position() {
        let ad_group = super::super::timeline::AdGroup::new(4_000_000, vec![super::super::timeline::Ad { duration_us: 1_500_000 }]);
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
        let mut queue = MediaPeriodQueue::new(3);
        queue.set_timeline(timeline);

        let resolved = queue.resolve_media_period_id_for_ads(uid, 4_000_000);
        assert!(resolved.is_ad());
        assert_eq!(resolved.ad_group_index, Some(0));
        assert_eq!(resolved.ad_index_in_group, Some(0));

        let before = queue.resolve_media_period_id_for_ads(uid, 3_999_999);
        assert!(!before.is_ad());
    }
}
