//! The abstract `MediaSource` collaborator: prepares itself, reports
//! timeline refreshes, and mints `MediaPeriod`s on request.

use super::error::PlaybackError;
use super::media_period::{MediaPeriod, MediaPeriodId};
use super::timeline::Timeline;

/// Observer notified when a `MediaSource` has a new timeline/manifest to
/// report. Implemented by the engine; delivered through the `HandlerWrapper`
/// as `REFRESH_SOURCE_INFO`, never called directly from another thread.
pub trait SourceInfoListener: Send {
    fn on_source_info_refreshed(&mut self, timeline: Timeline);
}

pub trait MediaSource: Send {
    /// Begin preparing, registering `listener` to receive timeline refreshes.
    fn prepare_source(&mut self);

    /// Surface a fatal preparation error, if one has occurred.
    fn maybe_throw_source_info_refresh_error(&self) -> Result<(), PlaybackError>;

    /// Create a `MediaPeriod` instance for `id`, seeking to `start_position_us`.
    fn create_period(&mut self, id: MediaPeriodId, start_position_us: i64) -> Box<dyn MediaPeriod>;

    fn release_period(&mut self, id: MediaPeriodId);

    fn release_source(&mut self);

    /// Poll for a timeline refresh produced since the last call. The engine
    /// calls this once per tick rather than requiring the source to own a
    /// cross-thread callback registration, since the engine's own message
    /// loop is the only legal place to observe it.
    fn poll_timeline_refresh(&mut self) -> Option<Timeline>;
}
