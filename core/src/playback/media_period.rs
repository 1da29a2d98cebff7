//! The external `MediaPeriod` capability set and the engine's owner record
//! for one instance of it ([`MediaPeriodHolder`]).

use std::collections::HashMap;

use super::error::PlaybackError;
use super::renderer::{RendererCapabilities, TrackType};
use super::timeline::{PeriodUid, TIME_UNSET};
use super::track_selector::TrackSelectorResult;

/// Tuple identity of one media period instance — content or ad — within the
/// current timeline. Two ids are equal iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaPeriodId {
    pub period_uid: PeriodUid,
    pub ad_group_index: Option<usize>,
    pub ad_index_in_group: Option<usize>,
    pub next_ad_group_index: Option<usize>,
}

impl MediaPeriodId {
    pub fn content(period_uid: PeriodUid) -> Self {
        Self {
            period_uid,
            ad_group_index: None,
            ad_index_in_group: None,
            next_ad_group_index: None,
        }
    }

    pub fn content_with_next_ad_group(period_uid: PeriodUid, next_ad_group_index: Option<usize>) -> Self {
        Self {
            period_uid,
            ad_group_index: None,
            ad_index_in_group: None,
            next_ad_group_index,
        }
    }

    pub fn ad(period_uid: PeriodUid, ad_group_index: usize, ad_index_in_group: usize) -> Self {
        Self {
            period_uid,
            ad_group_index: Some(ad_group_index),
            ad_index_in_group: Some(ad_index_in_group),
            next_ad_group_index: None,
        }
    }

    pub fn is_ad(&self) -> bool {
        self.ad_group_index.is_some()
    }
}

/// A sample stream feeding one renderer from one media period. The real
/// platform exposes `readData`/`skipData`/`isReady`; the core only needs to
/// know whether the producer has reached end-of-stream for the purposes of
/// draining a renderer before a period transition.
pub trait SampleStream: Send {
    fn is_ready(&self) -> bool;
    fn has_read_to_end(&self) -> bool;
    /// Discard buffered samples before `position_us` (back-buffer trimming).
    fn discard_before(&mut self, position_us: i64);

    /// Downcast hook for renderers that need the concrete stream type (e.g.
    /// `AudioRenderer` binding to the ring buffer behind a
    /// `ContainerSampleStream`) rather than driving it through this trait
    /// alone.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Bookkeeping the queue carries alongside the `MediaPeriod` it owns: id,
/// content/start position, and where this period sits within the timeline.
#[derive(Debug, Clone)]
pub struct MediaPeriodInfo {
    pub id: MediaPeriodId,
    /// Position within the period, in renderer-adjacent (period-local) time,
    /// at which reading/rendering should start.
    pub start_position_us: i64,
    /// The id's position translated back into the owning content period's
    /// coordinate space (ads do not advance content time).
    pub content_position_us: i64,
    pub is_last_in_timeline_period: bool,
    pub is_final: bool,
    pub duration_us: Option<i64>,
}

impl MediaPeriodInfo {
    pub fn duration_us_or_unset(&self) -> i64 {
        self.duration_us.unwrap_or(TIME_UNSET)
    }
}

/// Capability set implemented by a concrete media source's period.
///
/// Owned exclusively by its [`MediaPeriodHolder`] for its lifetime; `release`
/// is called exactly once, on rotation out of the queue or on `clear`.
pub trait MediaPeriod: Send {
    fn prepare(&mut self) -> Result<(), PlaybackError>;
    fn is_prepared(&self) -> bool;

    /// Track groups this period can produce, by renderer track type.
    fn get_track_groups(&self) -> Vec<TrackType>;

    /// Bind sample streams for the given renderer capabilities/selection.
    /// Returns one stream per renderer that has a non-empty selection.
    fn select_tracks(
        &mut self,
        renderer_capabilities: &[RendererCapabilities],
        selector_result: &TrackSelectorResult,
    ) -> HashMap<usize, Box<dyn SampleStream>>;

    fn discard_buffer(&mut self, position_us: i64);

    /// `Some(position_us)` if the period itself forced a reposition (e.g. the
    /// source detected a splice); consumed at most once per occurrence.
    fn read_discontinuity(&mut self) -> Option<i64>;

    fn get_buffered_position_us(&self) -> i64;
    fn continue_loading(&mut self, load_position_us: i64) -> bool;
    fn get_next_load_position_us(&self) -> i64;
    fn reevaluate_buffer(&mut self, renderer_position_us: i64);

    /// Seek within the period; returns the position actually landed on.
    fn seek_to_us(&mut self, position_us: i64) -> i64;
    fn get_adjusted_seek_position_us(&self, position_us: i64) -> i64;

    fn maybe_throw_prepare_error(&self) -> Result<(), PlaybackError>;

    fn release(&mut self);
}

/// A queue node owning one `MediaPeriod` instance.
pub struct MediaPeriodHolder {
    pub media_period: Box<dyn MediaPeriod>,
    pub info: MediaPeriodInfo,
    pub prepared: bool,
    /// Added to period-relative timestamps to produce the renderer's
    /// monotonic timebase. Equal to the predecessor's offset plus the
    /// predecessor's duration (0 for the playing holder at reset).
    pub renderer_offset_us: i64,
    /// One stream per renderer index, absent if that renderer is disabled
    /// for this period.
    pub sample_streams: HashMap<usize, Box<dyn SampleStream>>,
    pub track_selector_result: Option<TrackSelectorResult>,
    pub has_enabled_tracks: bool,
}

impl MediaPeriodHolder {
    pub fn new(media_period: Box<dyn MediaPeriod>, info: MediaPeriodInfo, renderer_offset_us: i64) -> Self {
        Self {
            media_period,
            info,
            prepared: false,
            renderer_offset_us,
            sample_streams: HashMap::new(),
            track_selector_result: None,
            has_enabled_tracks: false,
        }
    }

    /// Renderer-timebase position at which this holder's playback starts.
    pub fn start_position_in_renderer_time_us(&self) -> i64 {
        self.info.start_position_us + self.renderer_offset_us
    }

    pub fn sample_stream_for(&self, renderer_index: usize) -> Option<&dyn SampleStream> {
        self.sample_streams.get(&renderer_index).map(|b| b.as_ref())
    }
}
