//! Concrete `MediaSource`/`MediaPeriod`/`Renderer` collaborators that make
//! the engine runnable end to end against a `.prot`/`.mka` container,
//! grounded on the container model in `container/prot.rs` and its
//! per-track decode-thread/ring-buffer pipeline (`track/single.rs`,
//! `audio/buffer.rs`). The engine core stays decoder-agnostic; these types
//! are the one reference implementation shipped alongside it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dasp_ring_buffer::Bounded;
use rodio::{Sink, Source};

use crate::audio::buffer::{init_buffer_map, TrackBuffer, TrackBufferMap};
use crate::container::prot::Prot;
use crate::track::{buffer_track, TrackArgs};

use super::error::PlaybackError;
use super::media_period::{MediaPeriod, MediaPeriodId, SampleStream};
use super::media_source::MediaSource;
use super::renderer::{Renderer, RendererCapabilities, RendererConfiguration, RendererState, TrackType};
use super::timeline::{AdGroup, Period, PeriodUid, Timeline, Window, TIME_UNSET};

/// A `.prot`/`.mka` container exposed as a one-window, one-period
/// `MediaSource`.
pub struct ContainerMediaSource {
    file_path: String,
    uid: PeriodUid,
    duration_us: i64,
    timeline_delivered: bool,
}

impl ContainerMediaSource {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            uid: PeriodUid::new(),
            duration_us: 0,
            timeline_delivered: false,
        }
    }

    fn build_timeline(&self, _prot: &Prot) -> Timeline {
        // `Prot::get_shuffle_schedule` resolves alternate content against
        // elapsed time the same way `resolve_media_period_id_for_ads` does
        // against content position, but its entries carry alternate track
        // sources rather than ad durations, so there is nothing to lift
        // into an `AdGroup` here; the single container period simply has no
        // ad breaks.
        let ad_groups: Vec<AdGroup> = Vec::new();

        let period = Period {
            uid: self.uid,
            window_index: 0,
            duration_us: Some(self.duration_us),
            position_in_window_us: 0,
            ad_groups,
        };
        let window = Window {
            tag: Some(self.file_path.clone()),
            is_seekable: true,
            is_dynamic: false,
            default_start_position_us: 0,
            duration_us: Some(self.duration_us),
            first_period_index: 0,
            period_count: 1,
        };
        Timeline::new(vec![window], vec![period])
    }
}

impl MediaSource for ContainerMediaSource {
    fn prepare_source(&mut self) {
        let prot = Prot::new(&self.file_path);
        self.duration_us = (*prot.get_duration() * 1_000_000.0) as i64;
    }

    fn maybe_throw_source_info_refresh_error(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn create_period(&mut self, _id: MediaPeriodId, start_position_us: i64) -> Box<dyn MediaPeriod> {
        Box::new(ContainerMediaPeriod::new(self.file_path.clone(), self.duration_us, start_position_us))
    }

    fn release_period(&mut self, _id: MediaPeriodId) {}

    fn release_source(&mut self) {}

    fn poll_timeline_refresh(&mut self) -> Option<Timeline> {
        if self.timeline_delivered || self.duration_us == 0 {
            return None;
        }
        self.timeline_delivered = true;
        let prot = Prot::new(&self.file_path);
        Some(self.build_timeline(&prot))
    }
}

const RING_CAPACITY_SAMPLES: usize = 1 << 17;
const TRACK_KEY: u16 = 0;

/// One decode session against a container file: a decode thread (grounded
/// on `track::single::buffer_track`) fills a bounded ring buffer of
/// interleaved stereo `f32` samples; the engine's renderer drains it.
pub struct ContainerMediaPeriod {
    file_path: String,
    duration_us: i64,
    buffer_map: TrackBufferMap,
    abort: Arc<AtomicBool>,
    finished_tracks: Arc<Mutex<Vec<u16>>>,
    started: bool,
    start_position_us: i64,
    sample_rate: u32,
}

impl ContainerMediaPeriod {
    fn new(file_path: String, duration_us: i64, start_position_us: i64) -> Self {
        Self {
            file_path,
            duration_us,
            buffer_map: init_buffer_map(),
            abort: Arc::new(AtomicBool::new(false)),
            finished_tracks: Arc::new(Mutex::new(Vec::new())),
            started: false,
            start_position_us,
            sample_rate: 44_100,
        }
    }

    fn track_buffer(&self) -> Option<TrackBuffer> {
        self.buffer_map.lock().unwrap().get(&TRACK_KEY).cloned()
    }

    fn is_finished(&self) -> bool {
        self.finished_tracks.lock().unwrap().contains(&TRACK_KEY)
    }

    fn start_decode(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.buffer_map
            .lock()
            .unwrap()
            .entry(TRACK_KEY)
            .or_insert_with(|| Arc::new(Mutex::new(Bounded::from(vec![0.0f32; RING_CAPACITY_SAMPLES]))));
        let args = TrackArgs {
            file_path: self.file_path.clone(),
            track_id: None,
            track_key: TRACK_KEY,
            buffer_map: self.buffer_map.clone(),
            buffer_notify: None,
            track_weights: None,
            finished_tracks: self.finished_tracks.clone(),
            start_time: self.start_position_us as f64 / 1_000_000.0,
            channels: 2,
        };
        buffer_track(args, self.abort.clone());
    }
}

impl MediaPeriod for ContainerMediaPeriod {
    fn prepare(&mut self) -> Result<(), PlaybackError> {
        self.start_decode();
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.started
    }

    fn get_track_groups(&self) -> Vec<TrackType> {
        vec![TrackType::Audio]
    }

    fn select_tracks(
        &mut self,
        renderer_capabilities: &[RendererCapabilities],
        selector_result: &super::track_selector::TrackSelectorResult,
    ) -> std::collections::HashMap<usize, Box<dyn SampleStream>> {
        let mut streams = std::collections::HashMap::new();
        for (index, capability) in renderer_capabilities.iter().enumerate() {
            if capability.track_type != TrackType::Audio {
                continue;
            }
            if !selector_result.is_renderer_enabled(index) {
                continue;
            }
            if let Some(buffer) = self.track_buffer() {
                streams.insert(
                    index,
                    Box::new(ContainerSampleStream {
                        buffer,
                        finished_tracks: self.finished_tracks.clone(),
                    }) as Box<dyn SampleStream>,
                );
            }
        }
        streams
    }

    fn discard_buffer(&mut self, _position_us: i64) {
        // The decode thread's ring buffer is naturally bounded; there is no
        // separate back-buffer to trim on this simplified collaborator.
    }

    fn read_discontinuity(&mut self) -> Option<i64> {
        None
    }

    fn get_buffered_position_us(&self) -> i64 {
        match self.track_buffer() {
            Some(buffer) => {
                let frames = buffer.lock().unwrap().len() / 2;
                self.start_position_us + (frames as i64 * 1_000_000 / self.sample_rate as i64)
            }
            None => self.start_position_us,
        }
    }

    fn continue_loading(&mut self, _load_position_us: i64) -> bool {
        self.start_decode();
        !self.is_finished()
    }

    fn get_next_load_position_us(&self) -> i64 {
        if self.is_finished() {
            TIME_UNSET
        } else {
            self.get_buffered_position_us()
        }
    }

    fn reevaluate_buffer(&mut self, _renderer_position_us: i64) {}

    fn seek_to_us(&mut self, position_us: i64) -> i64 {
        self.abort.store(true, Ordering::SeqCst);
        self.abort = Arc::new(AtomicBool::new(false));
        self.started = false;
        self.buffer_map.lock().unwrap().remove(&TRACK_KEY);
        self.finished_tracks.lock().unwrap().clear();
        self.start_position_us = position_us;
        self.start_decode();
        position_us
    }

    fn get_adjusted_seek_position_us(&self, position_us: i64) -> i64 {
        position_us
    }

    fn maybe_throw_prepare_error(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn release(&mut self) {
        self.abort.store(true, Ordering::SeqCst);
    }
}

impl Drop for ContainerMediaPeriod {
    fn drop(&mut self) {
        self.abort.store(true, Ordering::SeqCst);
    }
}

/// `SampleStream` over a container period's ring buffer.
struct ContainerSampleStream {
    buffer: TrackBuffer,
    finished_tracks: Arc<Mutex<Vec<u16>>>,
}

impl SampleStream for ContainerSampleStream {
    fn is_ready(&self) -> bool {
        self.buffer.lock().unwrap().len() > 0 || self.has_read_to_end()
    }

    fn has_read_to_end(&self) -> bool {
        self.finished_tracks.lock().unwrap().contains(&TRACK_KEY) && self.buffer.lock().unwrap().len() == 0
    }

    fn discard_before(&mut self, _position_us: i64) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// `rodio::Source` pulling interleaved stereo `f32` frames out of a
/// container period's ring buffer as the audio device drains them.
struct RingBufferSource {
    buffer: TrackBuffer,
    sample_rate: u32,
}

impl Iterator for RingBufferSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.buffer.lock().unwrap().pop()
    }
}

impl Source for RingBufferSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}

/// A `track_type = Audio` renderer backed by a `rodio::Sink`, draining the
/// period's ring buffer as the decode thread fills it. `enable`/`start`/
/// `stop`/`disable` sequence sink pause/play/clear the way `controls.rs`
/// already sequenced its own player state machine, generalized from one
/// player-wide sink to one renderer-scoped sink.
pub struct AudioRenderer {
    stream_handle: rodio::OutputStreamHandle,
    sink: Option<Sink>,
    state: RendererState,
    stream_final: bool,
    current_buffer: Option<TrackBuffer>,
    current_finished: Option<Arc<Mutex<Vec<u16>>>>,
    volume: f32,
}

impl AudioRenderer {
    /// `_stream` must be kept alive by the caller for as long as this
    /// renderer is used — `rodio::OutputStream` has no `Send`-safe way to be
    /// owned here without leaking the device handle's lifetime into this
    /// struct, so construction takes the handle directly.
    pub fn new(stream_handle: rodio::OutputStreamHandle) -> Self {
        Self::with_volume(stream_handle, 1.0)
    }

    pub fn with_volume(stream_handle: rodio::OutputStreamHandle, volume: f32) -> Self {
        Self {
            stream_handle,
            sink: None,
            state: RendererState::Disabled,
            stream_final: false,
            current_buffer: None,
            current_finished: None,
            volume,
        }
    }
}

impl Renderer for AudioRenderer {
    fn track_type(&self) -> TrackType {
        TrackType::Audio
    }

    fn state(&self) -> RendererState {
        self.state
    }

    fn enable(
        &mut self,
        _configuration: RendererConfiguration,
        stream: Box<dyn SampleStream>,
        _start_position_us: i64,
        _joining: bool,
        _renderer_offset_us: i64,
    ) -> Result<(), PlaybackError> {
        let stream = stream
            .as_any()
            .downcast_ref::<ContainerSampleStream>()
            .ok_or_else(|| PlaybackError::Unexpected("AudioRenderer requires a container sample stream".into()))?;
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|err| PlaybackError::Renderer { renderer_index: 0, message: err.to_string() })?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(RingBufferSource {
            buffer: stream.buffer.clone(),
            sample_rate: 44_100,
        });
        self.current_buffer = Some(stream.buffer.clone());
        self.current_finished = Some(stream.finished_tracks.clone());
        self.sink = Some(sink);
        self.stream_final = false;
        self.state = RendererState::Enabled;
        Ok(())
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.state = RendererState::Started;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.state = RendererState::Enabled;
    }

    fn disable(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current_buffer = None;
        self.current_finished = None;
        self.state = RendererState::Disabled;
    }

    fn reset(&mut self) {
        self.disable();
    }

    fn replace_stream(
        &mut self,
        _configuration: RendererConfiguration,
        stream: Box<dyn SampleStream>,
        _renderer_offset_us: i64,
    ) -> Result<(), PlaybackError> {
        let stream = stream
            .as_any()
            .downcast_ref::<ContainerSampleStream>()
            .ok_or_else(|| PlaybackError::Unexpected("AudioRenderer requires a container sample stream".into()))?;
        if let Some(sink) = &self.sink {
            sink.append(RingBufferSource {
                buffer: stream.buffer.clone(),
                sample_rate: 44_100,
            });
        }
        self.current_buffer = Some(stream.buffer.clone());
        self.current_finished = Some(stream.finished_tracks.clone());
        self.stream_final = false;
        Ok(())
    }

    fn render(&mut self, _position_us: i64, _elapsed_realtime_us: i64) -> Result<(), PlaybackError> {
        // Actual sample delivery runs on rodio's own mixer thread, pulled
        // through `RingBufferSource`; this tick only needs to observe
        // readiness/end state below.
        Ok(())
    }

    fn is_ready(&self) -> bool {
        match (&self.current_buffer, &self.current_finished) {
            (Some(buffer), Some(finished)) => {
                buffer.lock().unwrap().len() > 0 || finished.lock().unwrap().contains(&TRACK_KEY)
            }
            _ => false,
        }
    }

    fn is_ended(&self) -> bool {
        if !self.stream_final {
            return false;
        }
        match (&self.current_buffer, &self.current_finished) {
            (Some(buffer), Some(finished)) => {
                finished.lock().unwrap().contains(&TRACK_KEY) && buffer.lock().unwrap().len() == 0
            }
            _ => true,
        }
    }

    fn has_read_stream_to_end(&self) -> bool {
        match (&self.current_buffer, &self.current_finished) {
            (Some(buffer), Some(finished)) => {
                finished.lock().unwrap().contains(&TRACK_KEY) && buffer.lock().unwrap().len() == 0
            }
            _ => false,
        }
    }

    fn set_current_stream_final(&mut self) {
        self.stream_final = true;
    }

    fn is_current_stream_final(&self) -> bool {
        self.stream_final
    }

    fn reset_position(&mut self, _position_us: i64) {}

    fn get_reading_position_us(&self) -> i64 {
        0
    }

    fn set_operating_rate(&mut self, speed: f64) {
        if let Some(sink) = &self.sink {
            sink.set_speed(speed as f32);
        }
    }
}

/// `track_type = None` renderer used in tests to exercise multi-renderer
/// advancement without real audio I/O. Never receives a `SampleStream` and
/// is excluded from enabled-renderer arithmetic.
#[derive(Default)]
pub struct NullRenderer {
    state: RendererState,
}

impl Renderer for NullRenderer {
    fn track_type(&self) -> TrackType {
        TrackType::None
    }

    fn state(&self) -> RendererState {
        self.state
    }

    fn enable(
        &mut self,
        _configuration: RendererConfiguration,
        _stream: Box<dyn SampleStream>,
        _start_position_us: i64,
        _joining: bool,
        _renderer_offset_us: i64,
    ) -> Result<(), PlaybackError> {
        self.state = RendererState::Enabled;
        Ok(())
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        self.state = RendererState::Started;
        Ok(())
    }

    fn stop(&mut self) {
        self.state = RendererState::Enabled;
    }

    fn disable(&mut self) {
        self.state = RendererState::Disabled;
    }

    fn reset(&mut self) {
        self.state = RendererState::Disabled;
    }

    fn replace_stream(
        &mut self,
        _configuration: RendererConfiguration,
        _stream: Box<dyn SampleStream>,
        _renderer_offset_us: i64,
    ) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn render(&mut self, _position_us: i64, _elapsed_realtime_us: i64) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn is_ended(&self) -> bool {
        true
    }

    fn has_read_stream_to_end(&self) -> bool {
        true
    }

    fn set_current_stream_final(&mut self) {}

    fn is_current_stream_final(&self) -> bool {
        true
    }

    fn reset_position(&mut self, _position_us: i64) {}

    fn get_reading_position_us(&self) -> i64 {
        0
    }

    fn set_operating_rate(&mut self, _speed: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renderer_stays_ready_and_ended_through_lifecycle() {
        let mut renderer = NullRenderer::default();
        assert_eq!(renderer.state(), RendererState::Disabled);
        assert!(renderer
            .enable(
                RendererConfiguration { codec_tag: "none".into() },
                Box::new(crate::playback::container_source::tests::NullStream),
                0,
                false,
                0
            )
            .is_ok());
        assert_eq!(renderer.state(), RendererState::Enabled);
        assert!(renderer.start().is_ok());
        assert_eq!(renderer.state(), RendererState::Started);
        assert!(renderer.is_ready());
        assert!(renderer.is_ended());
        renderer.reset();
        assert_eq!(renderer.state(), RendererState::Disabled);
    }

    pub(super) struct NullStream;
    impl SampleStream for NullStream {
        fn is_ready(&self) -> bool {
            true
        }
        fn has_read_to_end(&self) -> bool {
            true
        }
        fn discard_before(&mut self, _position_us: i64) {}
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }
}
