//! Track selection. Bitrate/language policy is out of scope; the only
//! implementation shipped is a selector that unconditionally selects every
//! available track group.

use super::media_period::MediaPeriodId;
use super::renderer::{RendererCapabilities, TrackType};
use super::timeline::Timeline;

/// The track selection in force for one period: which renderer index (by
/// position in the renderer array) is bound to which track type.
#[derive(Debug, Clone, Default)]
pub struct TrackSelectorResult {
    pub selected_track_types: Vec<Option<TrackType>>,
}

impl TrackSelectorResult {
    pub fn is_renderer_enabled(&self, renderer_index: usize) -> bool {
        self.selected_track_types
            .get(renderer_index)
            .map(|t| t.is_some())
            .unwrap_or(false)
    }

    /// Two selections are equal in the seamless-replace sense when the same
    /// renderers are enabled with the same track type.
    pub fn has_same_selection(&self, other: &TrackSelectorResult) -> bool {
        self.selected_track_types == other.selected_track_types
    }
}

pub trait TrackSelector: Send {
    fn select_tracks(
        &mut self,
        renderer_capabilities: &[RendererCapabilities],
        available_track_types: &[TrackType],
        period_id: MediaPeriodId,
        timeline: &Timeline,
    ) -> TrackSelectorResult;

    fn on_selection_activated(&mut self, info: &TrackSelectorResult);
}

/// Selects every renderer whose track type is available in the period,
/// unconditionally. The only policy this core ships.
#[derive(Debug, Default)]
pub struct FixedTrackSelector;

impl TrackSelector for FixedTrackSelector {
    fn select_tracks(
        &mut self,
        renderer_capabilities: &[RendererCapabilities],
        available_track_types: &[TrackType],
        _period_id: MediaPeriodId,
        _timeline: &Timeline,
    ) -> TrackSelectorResult {
        let selected_track_types = renderer_capabilities
            .iter()
            .map(|caps| {
                if caps.track_type != TrackType::None && available_track_types.contains(&caps.track_type) {
                    Some(caps.track_type)
                } else {
                    None
                }
            })
            .collect();
        TrackSelectorResult { selected_track_types }
    }

    fn on_selection_activated(&mut self, _info: &TrackSelectorResult) {}
}
