//! Hand-written fake engine, provider and surface shared by the integration
//! tests.
//!
//! The fake never calls signal handlers from inside its own methods; tests
//! drive every signal explicitly with [`FakeEngine::emit`], and can also
//! replay a signal on subscriptions that were already removed with
//! [`FakeEngine::emit_including_removed`]. Cancelled seeks are the exception:
//! their completions run with `false` inside `cancel_pending_seeks`.

#![allow(dead_code)]

use bridge_traits::playback::{
    DisplaySurface, EngineOptions, EngineSignal, EngineSnapshot, MediaEngine, MediaEngineProvider,
    MediaItem, SeekTolerance, SignalKind, SubscriptionId,
};
use bridge_traits::{SeekCompletion, SignalHandler, TimeObserver};
use core_playback::{PlaybackConfig, PlaybackState, PlayerController};
use core_runtime::config::CoreConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fake engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Attach(String),
    PlayImmediately(f32),
    Pause,
    Seek(Duration),
    CancelPendingSeeks,
    CancelLoading,
    SetRate(f32),
    SetMuted(bool),
    SetVolume(f64),
    SelectAudioTrack(usize),
    Subscribe(SignalKind),
    Unsubscribe,
    AddTimeObserver,
    RemoveTimeObserver,
}

struct Subscription {
    kind: SignalKind,
    handler: SignalHandler,
    live: bool,
}

struct TimeSubscription {
    observer: TimeObserver,
    live: bool,
}

struct FakeState {
    snapshot: EngineSnapshot,
    next_id: u64,
    subscriptions: HashMap<u64, Subscription>,
    time_observers: HashMap<u64, TimeSubscription>,
    pending_seeks: Vec<SeekCompletion>,
    commands: Vec<Command>,
    muted: bool,
    volume: f64,
    audio_tracks: usize,
    attached: Option<MediaItem>,
}

pub struct FakeEngine {
    pub options: EngineOptions,
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new(options: EngineOptions, snapshot: EngineSnapshot) -> Self {
        Self {
            options,
            state: Mutex::new(FakeState {
                snapshot,
                next_id: 1,
                subscriptions: HashMap::new(),
                time_observers: HashMap::new(),
                pending_seeks: Vec::new(),
                commands: Vec::new(),
                muted: false,
                volume: 1.0,
                audio_tracks: 2,
                attached: None,
            }),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().unwrap().commands.clear();
    }

    pub fn attached(&self) -> Option<MediaItem> {
        self.state.lock().unwrap().attached.clone()
    }

    pub fn live_subscriptions(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.subscriptions.values().filter(|s| s.live).count()
            + state.time_observers.values().filter(|t| t.live).count()
    }

    pub fn set_snapshot(&self, update: impl FnOnce(&mut EngineSnapshot)) {
        update(&mut self.state.lock().unwrap().snapshot);
    }

    pub fn set_audio_tracks(&self, count: usize) {
        self.state.lock().unwrap().audio_tracks = count;
    }

    /// Deliver `signal` to live subscriptions of its kind.
    pub fn emit(&self, signal: EngineSignal) {
        for handler in self.handlers(signal.kind(), false) {
            handler(signal.clone());
        }
    }

    /// Deliver `signal` to every subscription ever made for its kind,
    /// including unsubscribed ones (an in-flight callback racing teardown).
    pub fn emit_including_removed(&self, signal: EngineSignal) {
        for handler in self.handlers(signal.kind(), true) {
            handler(signal.clone());
        }
    }

    /// Complete every pending seek with `landed`.
    pub fn complete_seeks(&self, landed: bool) {
        let pending: Vec<SeekCompletion> = self.state.lock().unwrap().pending_seeks.drain(..).collect();
        for completion in pending {
            completion(landed);
        }
    }

    pub fn pending_seeks(&self) -> usize {
        self.state.lock().unwrap().pending_seeks.len()
    }

    /// Call periodic time observers with the current position.
    pub fn tick(&self, include_removed: bool) {
        let (position, observers): (Duration, Vec<TimeObserver>) = {
            let state = self.state.lock().unwrap();
            (
                state.snapshot.position,
                state
                    .time_observers
                    .values()
                    .filter(|t| include_removed || t.live)
                    .map(|t| Arc::clone(&t.observer))
                    .collect(),
            )
        };
        for observer in observers {
            observer(position);
        }
    }

    fn handlers(&self, kind: SignalKind, include_removed: bool) -> Vec<SignalHandler> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<&u64> = state
            .subscriptions
            .iter()
            .filter(|(_, s)| s.kind == kind && (include_removed || s.live))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.into_iter()
            .map(|id| Arc::clone(&state.subscriptions[id].handler))
            .collect()
    }

    fn record(&self, command: Command) {
        self.state.lock().unwrap().commands.push(command);
    }
}

impl MediaEngine for FakeEngine {
    fn attach(&self, item: MediaItem) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Attach(item.locator.clone()));
        state.attached = Some(item);
    }

    fn play_immediately(&self, rate: f32) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::PlayImmediately(rate));
        state.snapshot.rate = rate;
    }

    fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Pause);
        state.snapshot.rate = 0.0;
    }

    fn seek(&self, to: Duration, _tolerance: Option<SeekTolerance>, completion: SeekCompletion) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Seek(to));
        state.pending_seeks.push(completion);
    }

    fn cancel_pending_seeks(&self) {
        let cancelled: Vec<SeekCompletion> = {
            let mut state = self.state.lock().unwrap();
            state.commands.push(Command::CancelPendingSeeks);
            state.pending_seeks.drain(..).collect()
        };
        // Inline, on the caller's thread, like engines that fail queued
        // seeks as soon as they are cancelled.
        for completion in cancelled {
            completion(false);
        }
    }

    fn cancel_loading(&self) {
        self.record(Command::CancelLoading);
    }

    fn set_rate(&self, rate: f32) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::SetRate(rate));
        state.snapshot.rate = rate;
    }

    fn set_muted(&self, muted: bool) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::SetMuted(muted));
        state.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn set_volume(&self, volume: f64) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::SetVolume(volume));
        state.volume = volume;
    }

    fn volume(&self) -> f64 {
        self.state.lock().unwrap().volume
    }

    fn audio_track_count(&self) -> usize {
        self.state.lock().unwrap().audio_tracks
    }

    fn select_audio_track(&self, index: usize) {
        self.record(Command::SelectAudioTrack(index));
    }

    fn snapshot(&self) -> EngineSnapshot {
        self.state.lock().unwrap().snapshot
    }

    fn subscribe(&self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.commands.push(Command::Subscribe(kind));
        state.subscriptions.insert(
            id,
            Subscription {
                kind,
                handler,
                live: true,
            },
        );
        SubscriptionId::new(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::Unsubscribe);
        if let Some(subscription) = state.subscriptions.get_mut(&id.raw()) {
            subscription.live = false;
        }
    }

    fn add_periodic_time_observer(&self, _interval: Duration, observer: TimeObserver) -> SubscriptionId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.commands.push(Command::AddTimeObserver);
        state
            .time_observers
            .insert(id, TimeSubscription { observer, live: true });
        SubscriptionId::new(id)
    }

    fn remove_time_observer(&self, id: SubscriptionId) {
        let mut state = self.state.lock().unwrap();
        state.commands.push(Command::RemoveTimeObserver);
        if let Some(observer) = state.time_observers.get_mut(&id.raw()) {
            observer.live = false;
        }
    }
}

// ============================================================================
// Provider and surface
// ============================================================================

#[derive(Default)]
pub struct FakeProvider {
    engines: Mutex<Vec<Arc<FakeEngine>>>,
    initial: Mutex<EngineSnapshot>,
}

impl FakeProvider {
    /// Snapshot new engines start with.
    pub fn set_initial_snapshot(&self, snapshot: EngineSnapshot) {
        *self.initial.lock().unwrap() = snapshot;
    }

    pub fn engine(&self, index: usize) -> Arc<FakeEngine> {
        Arc::clone(&self.engines.lock().unwrap()[index])
    }

    pub fn latest(&self) -> Arc<FakeEngine> {
        let engines = self.engines.lock().unwrap();
        Arc::clone(engines.last().expect("no engine created"))
    }

    pub fn created(&self) -> usize {
        self.engines.lock().unwrap().len()
    }
}

impl MediaEngineProvider for FakeProvider {
    fn create_engine(&self, options: EngineOptions) -> Arc<dyn MediaEngine> {
        let snapshot = *self.initial.lock().unwrap();
        let engine = Arc::new(FakeEngine::new(options, snapshot));
        self.engines.lock().unwrap().push(Arc::clone(&engine));
        engine
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    pub visibility: Mutex<Vec<bool>>,
    pub bindings: Mutex<Vec<bool>>,
}

impl RecordingSurface {
    pub fn last_visibility(&self) -> Option<bool> {
        self.visibility.lock().unwrap().last().copied()
    }
}

impl DisplaySurface for RecordingSurface {
    fn bind_engine(&self, engine: Option<Arc<dyn MediaEngine>>) {
        self.bindings.lock().unwrap().push(engine.is_some());
    }

    fn set_visible(&self, visible: bool) {
        self.visibility.lock().unwrap().push(visible);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub player: PlayerController,
    pub provider: Arc<FakeProvider>,
    pub surface: Arc<RecordingSurface>,
    pub states: Arc<Mutex<Vec<PlaybackState>>>,
}

impl Harness {
    pub fn new(config: PlaybackConfig) -> Self {
        let provider = Arc::new(FakeProvider::default());
        let surface = Arc::new(RecordingSurface::default());
        let core = CoreConfig::builder()
            .engine_provider(provider.clone())
            .display_surface(surface.clone())
            .build()
            .expect("core config");

        let player = PlayerController::new(&core, config).expect("player");
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        player.on_state_change(move |state| sink.lock().unwrap().push(state.clone()));

        Self {
            player,
            provider,
            surface,
            states,
        }
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.states.lock().unwrap().clone()
    }

    pub fn clear_states(&self) {
        self.states.lock().unwrap().clear();
    }

    pub fn engine(&self) -> Arc<FakeEngine> {
        self.provider.latest()
    }
}

/// Snapshot of an engine presenting frames at `rate`.
pub fn advancing(position: u64, duration: u64, buffered: u64) -> EngineSnapshot {
    EngineSnapshot {
        rate: 1.0,
        position: Duration::from_secs(position),
        duration: Duration::from_secs(duration),
        buffered: Duration::from_secs(buffered),
        ready_for_display: true,
        item_ready: true,
        enough_to_play: true,
    }
}

/// Readiness with a positive rate: the usual "now playing" signal.
pub fn start_playing(engine: &FakeEngine, position: u64, duration: u64, buffered: u64) {
    engine.set_snapshot(|s| *s = advancing(position, duration, buffered));
    engine.emit(EngineSignal::DecodeReadinessChanged {
        ready_for_display: true,
    });
}
