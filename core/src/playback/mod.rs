//! The playback-engine core: cooperative scheduler, renderer state machine,
//! media-period queue, and the timeline/clock abstractions that back them.
//!
//! Module layout mirrors the dependency order leaves-first: clock -> handler
//! -> timeline -> playback_info -> media_clock -> media_period(_queue) ->
//! renderer -> engine.

pub mod clock;
pub mod container_source;
pub mod error;
pub mod handler;
pub mod load_control;
pub mod media_clock;
pub mod media_period;
pub mod media_period_queue;
pub mod media_source;
pub mod message;
pub mod playback_info;
pub mod renderer;
pub mod timeline;
pub mod track_selector;

pub mod engine;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use container_source::{AudioRenderer, ContainerMediaSource, NullRenderer};
pub use engine::{AckHandle, EngineEventListener, NullEventListener, PlaybackEngine, SeekParameters};
pub use error::PlaybackError;
pub use handler::{HandlerWrapper, LooperId, MessageHandler};
pub use load_control::{DefaultLoadControl, LoadControl, LoadControlSettings};
pub use media_clock::{MediaClock, PlaybackParameters, RendererClockSource};
pub use media_period::{MediaPeriod, MediaPeriodHolder, MediaPeriodId, MediaPeriodInfo, SampleStream};
pub use media_period_queue::MediaPeriodQueue;
pub use media_source::{MediaSource, SourceInfoListener};
pub use message::{CancellationHandle, MessageTarget, PendingMessageInfo, PlayerMessage, Resolution};
pub use playback_info::{DiscontinuityReason, PlaybackInfo, PlaybackInfoUpdate, PlaybackState};
pub use renderer::{Renderer, RendererCapabilities, RendererConfiguration, RendererState, TrackType};
pub use timeline::{Ad, AdGroup, Period, PeriodUid, RepeatMode, Timeline, Window, INDEX_UNSET, TIME_UNSET};
pub use track_selector::{FixedTrackSelector, TrackSelector, TrackSelectorResult};
