//! Media engine and display surface bridge traits.
//!
//! The core never decodes or renders media. It drives a host-provided media
//! engine (AVPlayer, ExoPlayer, an `HtmlMediaElement`, libmpv...) through the
//! [`MediaEngine`] trait and derives one playback state from the signals the
//! engine emits. The engine may deliver those signals from any thread.
//!
//! ## Signal contract
//!
//! - Handlers registered with [`MediaEngine::subscribe`] are invoked every time
//!   the observed value changes, never with an initial value.
//! - `subscribe`, `unsubscribe`, `attach` and periodic time observer
//!   registration must not invoke handlers synchronously on the calling
//!   thread. The core calls them while holding its session lock.
//! - [`MediaEngine::cancel_pending_seeks`] may run the cancelled
//!   completions with `false` on the calling thread. The core only cancels
//!   with its lock released.
//! - No engine method may wait for in-flight handler invocations to return;
//!   a handler may be blocked on the session lock. The core discards signals
//!   from superseded subscriptions on its own.

use crate::platform::{PlatformSendSync, SeekCompletion, SignalHandler, TimeObserver};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Opaque identifier returned by subscription-style engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Observable engine values the core subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// First frame decoded and displayable.
    DecodeReadiness,
    /// Loaded time ranges of the current item changed.
    BufferedRanges,
    /// Engine switched between paused, waiting and playing.
    TimeControl,
    /// Current item became ready or failed.
    ItemStatus,
    /// "Playback likely to keep up" estimate changed.
    KeepUpLikely,
    /// Current item played to its end.
    EndOfMedia,
}

impl SignalKind {
    /// Every signal kind, in subscription order.
    pub const ALL: [SignalKind; 6] = [
        SignalKind::DecodeReadiness,
        SignalKind::BufferedRanges,
        SignalKind::TimeControl,
        SignalKind::ItemStatus,
        SignalKind::KeepUpLikely,
        SignalKind::EndOfMedia,
    ];
}

/// Engine time-control status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlStatus {
    /// Not advancing.
    Paused,
    /// Playback requested, engine waiting for data or a network condition.
    WaitingToPlayAtSpecifiedRate,
    /// Advancing.
    Playing,
}

impl TimeControlStatus {
    pub fn is_advancing(&self) -> bool {
        matches!(self, TimeControlStatus::Playing)
    }
}

/// Stage at which the engine gave up on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The item (or the engine around it) could not be constructed.
    Construction,
    /// The item was opened but could not be decoded.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Construction => write!(f, "construction"),
            FailureKind::Decode => write!(f, "decode"),
        }
    }
}

/// Terminal item failure reported by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} failure ({code}): {message}")]
pub struct EngineFailure {
    pub kind: FailureKind,
    /// Engine-specific error code.
    pub code: i64,
    pub message: String,
}

impl EngineFailure {
    pub fn new(kind: FailureKind, code: i64, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn decode(code: i64, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, code, message)
    }

    pub fn construction(code: i64, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Construction, code, message)
    }
}

/// Status of the item attached to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(EngineFailure),
}

/// Signal emitted by a [`MediaEngine`] to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    DecodeReadinessChanged { ready_for_display: bool },
    BufferedRangesChanged,
    TimeControlChanged(TimeControlStatus),
    ItemStatusChanged(ItemStatus),
    KeepUpLikelyChanged(bool),
    EndOfMediaReached,
}

impl EngineSignal {
    /// Subscription kind this signal is delivered on.
    pub fn kind(&self) -> SignalKind {
        match self {
            EngineSignal::DecodeReadinessChanged { .. } => SignalKind::DecodeReadiness,
            EngineSignal::BufferedRangesChanged => SignalKind::BufferedRanges,
            EngineSignal::TimeControlChanged(_) => SignalKind::TimeControl,
            EngineSignal::ItemStatusChanged(_) => SignalKind::ItemStatus,
            EngineSignal::KeepUpLikelyChanged(_) => SignalKind::KeepUpLikely,
            EngineSignal::EndOfMediaReached => SignalKind::EndOfMedia,
        }
    }
}

/// One consistent read of the engine's observable values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineSnapshot {
    /// Current rate; `0.0` when not advancing.
    pub rate: f32,
    /// Current playback position.
    pub position: Duration,
    /// Total duration of the current item, zero while unknown.
    pub duration: Duration,
    /// Amount of media buffered, measured from the start of the item.
    pub buffered: Duration,
    /// Whether the display surface has a frame to show.
    pub ready_for_display: bool,
    /// Whether the current item reached its ready status.
    pub item_ready: bool,
    /// Whether enough data is available to start without waiting.
    pub enough_to_play: bool,
}

impl EngineSnapshot {
    /// Engine is presenting frames at a positive rate.
    pub fn is_advancing(&self) -> bool {
        self.ready_for_display && self.rate > 0.0
    }
}

/// Media item handed to [`MediaEngine::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Source locator (URL or file URL).
    pub locator: String,
    /// Locator points at local storage.
    pub is_local: bool,
    /// Live streams may keep using the network while paused.
    pub use_network_while_paused: bool,
}

impl MediaItem {
    pub fn new(locator: impl Into<String>, is_local: bool) -> Self {
        Self {
            locator: locator.into(),
            is_local,
            use_network_while_paused: true,
        }
    }

    pub fn with_network_while_paused(mut self, enabled: bool) -> Self {
        self.use_network_while_paused = enabled;
        self
    }
}

/// Accuracy window for seeks. `None` in [`MediaEngine::seek`] leaves the
/// choice to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTolerance {
    pub before: Duration,
    pub after: Duration,
}

impl SeekTolerance {
    /// Frame-accurate seek.
    pub const EXACT: SeekTolerance = SeekTolerance {
        before: Duration::ZERO,
        after: Duration::ZERO,
    };

    pub fn new(before: Duration, after: Duration) -> Self {
        Self { before, after }
    }
}

/// Options applied when the core asks for a fresh engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Let the engine delay starts to avoid stalls. The core performs its own
    /// stall recovery, so this defaults to `false`.
    pub automatically_waits_to_minimize_stalling: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            automatically_waits_to_minimize_stalling: false,
        }
    }
}

/// Host media engine driven by the playback core.
///
/// All methods return immediately. Completion is reported through
/// [`SeekCompletion`] or through subscribed signals.
pub trait MediaEngine: PlatformSendSync {
    /// Replace the current item.
    fn attach(&self, item: MediaItem);

    /// Start advancing at `rate` without waiting for buffers.
    fn play_immediately(&self, rate: f32);

    fn pause(&self);

    /// Seek to `to`; `completion` receives `false` when the seek was
    /// interrupted or failed.
    fn seek(&self, to: Duration, tolerance: Option<SeekTolerance>, completion: SeekCompletion);

    /// Abort queued seeks. Their completions receive `false`, possibly
    /// before this call returns.
    fn cancel_pending_seeks(&self);

    /// Cancel loading of the current item's resources.
    fn cancel_loading(&self);

    fn set_rate(&self, rate: f32);

    fn set_muted(&self, muted: bool);

    fn is_muted(&self) -> bool;

    /// Volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f64);

    fn volume(&self) -> f64;

    /// Number of audible media options of the current item.
    fn audio_track_count(&self) -> usize;

    fn select_audio_track(&self, index: usize);

    fn snapshot(&self) -> EngineSnapshot;

    fn subscribe(&self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    fn add_periodic_time_observer(&self, interval: Duration, observer: TimeObserver)
        -> SubscriptionId;

    fn remove_time_observer(&self, id: SubscriptionId);
}

/// Factory for engine instances; one engine is created per session.
///
/// Construction is infallible here. An engine that cannot be set up reports
/// an [`ItemStatus::Failed`] with [`FailureKind::Construction`] once observed.
pub trait MediaEngineProvider: PlatformSendSync {
    fn create_engine(&self, options: EngineOptions) -> Arc<dyn MediaEngine>;
}

/// Composited surface that presents the engine's frames.
pub trait DisplaySurface: PlatformSendSync {
    /// Bind the surface to an engine, or unbind it with `None`.
    fn bind_engine(&self, engine: Option<Arc<dyn MediaEngine>>);

    fn set_visible(&self, visible: bool);
}

/// Surface for hosts without video output (audio-only or tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessSurface;

impl DisplaySurface for HeadlessSurface {
    fn bind_engine(&self, _engine: Option<Arc<dyn MediaEngine>>) {}

    fn set_visible(&self, _visible: bool) {}
}
