//! Immutable window/period topology and navigation.
//!
//! No windowed timeline exists elsewhere in this crate, but the shape of
//! "resolve a schedule entry against a content position" is grounded on
//! `Prot`'s shuffle-schedule resolution (`container/prot.rs`,
//! `ShuffleScheduleEntry`) and the container's track/position bookkeeping in
//! `container/info.rs`: both are "pick the right alternate content for a
//! position," generalized here into ad-group resolution and window/period
//! navigation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;

/// Sentinel for an unknown/unresolved duration or position.
pub const TIME_UNSET: i64 = i64::MIN;
/// Sentinel for "not present" index results.
pub const INDEX_UNSET: usize = usize::MAX;

/// Stable opaque identity for a period, independent of its index in the
/// timeline (indices shift as a dynamic timeline grows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodUid(u64);

static NEXT_PERIOD_UID: AtomicU64 = AtomicU64::new(1);

impl PeriodUid {
    /// Mint a new, process-unique period identity.
    pub fn new() -> Self {
        Self(NEXT_PERIOD_UID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PeriodUid {
    fn default() -> Self {
        Self::new()
    }
}

/// How the timeline wraps at its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    Off,
    One,
    All,
}

/// A single ad within an ad group. `duration_us` is [`TIME_UNSET`] if the
/// source hasn't reported it yet (it loads lazily, same as a content period).
#[derive(Debug, Clone)]
pub struct Ad {
    pub duration_us: i64,
}

/// An ad break attached to a period at a fixed content position.
///
/// Played-state is tracked here (on the period's own data), not in the
/// queue, via an atomic bitmask shared by every clone of this `AdGroup` —
/// `Timeline` is otherwise immutable and shared by reference, but ad-group
/// playback bookkeeping has to survive timeline refreshes that rebuild the
/// surrounding `Window`/`Period` structs.
#[derive(Debug, Clone)]
pub struct AdGroup {
    pub content_position_us: i64,
    pub ads: Vec<Ad>,
    played_mask: Arc<AtomicU64>,
}

impl AdGroup {
    pub fn new(content_position_us: i64, ads: Vec<Ad>) -> Self {
        Self {
            content_position_us,
            ads,
            played_mask: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn ad_count(&self) -> usize {
        self.ads.len()
    }

    pub fn is_ad_played(&self, ad_index: usize) -> bool {
        self.played_mask.load(Ordering::SeqCst) & (1 << ad_index) != 0
    }

    pub fn mark_ad_played(&self, ad_index: usize) {
        self.played_mask.fetch_or(1 << ad_index, Ordering::SeqCst);
    }

    pub fn is_fully_played(&self) -> bool {
        let full_mask = if self.ad_count() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.ad_count()) - 1
        };
        self.played_mask.load(Ordering::SeqCst) & full_mask == full_mask
    }

    /// Lowest-indexed ad in this group that has not yet played.
    pub fn first_unplayed_ad(&self) -> Option<usize> {
        (0..self.ad_count()).find(|&i| !self.is_ad_played(i))
    }
}

/// A contiguous content span within a window.
#[derive(Debug, Clone)]
pub struct Period {
    pub uid: PeriodUid,
    pub window_index: usize,
    /// `None` if the period's duration is not yet known (live/dynamic).
    pub duration_us: Option<i64>,
    /// Offset of this period's start from its window's start.
    pub position_in_window_us: i64,
    /// Ad groups within this period, ordered by `content_position_us`.
    pub ad_groups: Vec<AdGroup>,
}

impl Period {
    pub fn duration_us_or_unset(&self) -> i64 {
        self.duration_us.unwrap_or(TIME_UNSET)
    }
}

/// A logical presentation unit — one playlist item — composed of one or
/// more periods.
#[derive(Debug, Clone)]
pub struct Window {
    pub tag: Option<String>,
    pub is_seekable: bool,
    pub is_dynamic: bool,
    pub default_start_position_us: i64,
    /// `None` if the window's total duration is not yet known.
    pub duration_us: Option<i64>,
    pub first_period_index: usize,
    pub period_count: usize,
}

impl Window {
    pub fn duration_us_or_unset(&self) -> i64 {
        self.duration_us.unwrap_or(TIME_UNSET)
    }

    pub fn last_period_index(&self) -> usize {
        self.first_period_index + self.period_count - 1
    }
}

/// Immutable, finite sequence of windows, each containing one or more
/// periods in order.
#[derive(Debug, Clone)]
pub struct Timeline {
    windows: Arc<Vec<Window>>,
    periods: Arc<Vec<Period>>,
    uid_index: Arc<BTreeMap<PeriodUid, usize>>,
    shuffle_order: Arc<Vec<usize>>,
}

impl Timeline {
    pub fn empty() -> Self {
        Self {
            windows: Arc::new(Vec::new()),
            periods: Arc::new(Vec::new()),
            uid_index: Arc::new(BTreeMap::new()),
            shuffle_order: Arc::new(Vec::new()),
        }
    }

    /// Build a timeline from windows and their flattened periods.
    ///
    /// `periods` must be grouped by window in the order windows appear, and
    /// each window's `first_period_index`/`period_count` must describe a
    /// contiguous run within it — the same invariant the engine's queue
    /// relies on when walking successors.
    pub fn new(windows: Vec<Window>, periods: Vec<Period>) -> Self {
        let mut uid_index = BTreeMap::new();
        for (index, period) in periods.iter().enumerate() {
            uid_index.insert(period.uid, index);
        }
        let mut shuffle_order: Vec<usize> = (0..windows.len()).collect();
        shuffle_order.shuffle(&mut rand::thread_rng());

        Self {
            windows: Arc::new(windows),
            periods: Arc::new(periods),
            uid_index: Arc::new(uid_index),
            shuffle_order: Arc::new(shuffle_order),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get_window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn get_period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn get_window(&self, window_index: usize) -> Option<&Window> {
        self.windows.get(window_index)
    }

    pub fn get_period(&self, period_index: usize) -> Option<&Period> {
        self.periods.get(period_index)
    }

    pub fn get_uid_of_period(&self, period_index: usize) -> Option<PeriodUid> {
        self.periods.get(period_index).map(|p| p.uid)
    }

    /// O(log n) uid -> index lookup. [`INDEX_UNSET`] if absent.
    pub fn get_index_of_period(&self, uid: PeriodUid) -> usize {
        self.uid_index.get(&uid).copied().unwrap_or(INDEX_UNSET)
    }

    pub fn get_period_by_uid(&self, uid: PeriodUid) -> Option<&Period> {
        self.uid_index.get(&uid).and_then(|&i| self.periods.get(i))
    }

    /// Next period index in source (non-shuffled) order, following the
    /// containing window's successor when `period_index` is the last period
    /// in its window. `None` if there is no successor under `repeat_mode`.
    pub fn get_next_period_index(
        &self,
        period_index: usize,
        repeat_mode: RepeatMode,
        shuffle_mode_enabled: bool,
    ) -> Option<usize> {
        let period = self.periods.get(period_index)?;
        let window = self.windows.get(period.window_index)?;
        if period_index < window.last_period_index() {
            return Some(period_index + 1);
        }
        let next_window = self.get_next_window_index(period.window_index, repeat_mode, shuffle_mode_enabled)?;
        self.windows.get(next_window).map(|w| w.first_period_index)
    }

    pub fn get_next_window_index(
        &self,
        window_index: usize,
        repeat_mode: RepeatMode,
        shuffle_mode_enabled: bool,
    ) -> Option<usize> {
        if self.windows.is_empty() {
            return None;
        }
        if repeat_mode == RepeatMode::One {
            return Some(window_index);
        }
        if shuffle_mode_enabled {
            return self.shuffled_neighbor(window_index, 1, repeat_mode);
        }
        if window_index + 1 < self.windows.len() {
            return Some(window_index + 1);
        }
        match repeat_mode {
            RepeatMode::All => Some(0),
            _ => None,
        }
    }

    pub fn get_previous_window_index(
        &self,
        window_index: usize,
        repeat_mode: RepeatMode,
        shuffle_mode_enabled: bool,
    ) -> Option<usize> {
        if self.windows.is_empty() {
            return None;
        }
        if repeat_mode == RepeatMode::One {
            return Some(window_index);
        }
        if shuffle_mode_enabled {
            return self.shuffled_neighbor(window_index, -1, repeat_mode);
        }
        if window_index > 0 {
            return Some(window_index - 1);
        }
        match repeat_mode {
            RepeatMode::All => Some(self.windows.len() - 1),
            _ => None,
        }
    }

    fn shuffled_neighbor(&self, window_index: usize, step: i64, repeat_mode: RepeatMode) -> Option<usize> {
        let position = self.shuffle_order.iter().position(|&w| w == window_index)?;
        let len = self.shuffle_order.len() as i64;
        let next_position = position as i64 + step;
        if next_position >= 0 && next_position < len {
            return Some(self.shuffle_order[next_position as usize]);
        }
        match repeat_mode {
            RepeatMode::All => {
                let wrapped = next_position.rem_euclid(len);
                Some(self.shuffle_order[wrapped as usize])
            }
            _ => None,
        }
    }

    /// Resolve a `(window_index, window_position_us)` coordinate to the
    /// period that contains it and the period-relative position.
    ///
    /// `window_position_us < 0` is an invalid argument (`None`). A position
    /// at or beyond a window of known duration clamps to the end of its last
    /// period; a position beyond a window of unknown (dynamic) duration is
    /// accepted as-is against the last period, since there is no known upper
    /// bound to reject it against.
    pub fn get_period_position(
        &self,
        window_index: usize,
        window_position_us: i64,
    ) -> Option<(PeriodUid, i64)> {
        if window_position_us < 0 {
            return None;
        }
        let window = self.windows.get(window_index)?;
        let mut position_us = window_position_us;
        if let Some(duration_us) = window.duration_us {
            position_us = position_us.min(duration_us.max(0));
        }

        let mut period_index = window.first_period_index;
        let mut period_start_us = 0i64;
        for idx in window.first_period_index..=window.last_period_index() {
            let period = self.periods.get(idx)?;
            period_index = idx;
            period_start_us = period.position_in_window_us;
            if let Some(duration_us) = period.duration_us {
                if position_us < period.position_in_window_us + duration_us || idx == window.last_period_index() {
                    break;
                }
            } else {
                // Unknown-duration period can only be the last one we can resolve into.
                break;
            }
        }

        let period = self.periods.get(period_index)?;
        let period_relative_us = (position_us - period_start_us).max(0);
        Some((period.uid, period_relative_us))
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_window_two_periods() -> Timeline {
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
    fn next_period_index_crosses_window_boundary_within_same_window() {
        let timeline = single_window_two_periods();
        assert_eq!(
            timeline.get_next_period_index(0, RepeatMode::Off, false),
            Some(1)
        );
        assert_eq!(
            timeline.get_next_period_index(1, RepeatMode::Off, false),
            None
        );
    }

    #[test]
    fn repeat_all_never_returns_unset() {
        let timeline = single_window_two_periods();
        assert_eq!(
            timeline.get_next_period_index(1, RepeatMode::All, false),
            Some(0)
        );
    }

    #[test]
    fn get_period_position_resolves_second_period() {
        let timeline = single_window_two_periods();
        let (uid, pos) = timeline.get_period_position(0, 3_500_000).unwrap();
        assert_eq!(uid, timeline.get_uid_of_period(1).unwrap());
        assert_eq!(pos, 500_000);
    }

    #[test]
    fn get_period_position_clamps_past_window_end() {
        let timeline = single_window_two_periods();
        let (uid, pos) = timeline.get_period_position(0, 999_000_000).unwrap();
        assert_eq!(uid, timeline.get_uid_of_period(1).unwrap());
        assert_eq!(pos, 2_000_000);
    }

    #[test]
    fn get_index_of_period_unset_for_unknown_uid() {
        let timeline = single_window_two_periods();
        assert_eq!(timeline.get_index_of_period(PeriodUid::new()), INDEX_UNSET);
    }
}
