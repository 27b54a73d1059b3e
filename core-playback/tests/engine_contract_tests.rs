//! Exact engine call sequences, checked with mockall expectations.

use bridge_traits::playback::{
    EngineFailure, EngineOptions, EngineSignal, EngineSnapshot, ItemStatus, MediaEngine,
    MediaEngineProvider, MediaItem, SeekTolerance, SignalKind, SubscriptionId,
};
use bridge_traits::{SeekCompletion, SignalHandler, TimeObserver};
use core_playback::{PausedReason, PlaybackConfig, PlaybackState, PlayerController};
use core_runtime::config::CoreConfig;
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

// ============================================================================
// Mocks
// ============================================================================

mock! {
    pub Engine {}

    impl MediaEngine for Engine {
        fn attach(&self, item: MediaItem);
        fn play_immediately(&self, rate: f32);
        fn pause(&self);
        fn seek(&self, to: Duration, tolerance: Option<SeekTolerance>, completion: SeekCompletion);
        fn cancel_pending_seeks(&self);
        fn cancel_loading(&self);
        fn set_rate(&self, rate: f32);
        fn set_muted(&self, muted: bool);
        fn is_muted(&self) -> bool;
        fn set_volume(&self, volume: f64);
        fn volume(&self) -> f64;
        fn audio_track_count(&self) -> usize;
        fn select_audio_track(&self, index: usize);
        fn snapshot(&self) -> EngineSnapshot;
        fn subscribe(&self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId;
        fn unsubscribe(&self, id: SubscriptionId);
        fn add_periodic_time_observer(&self, interval: Duration, observer: TimeObserver) -> SubscriptionId;
        fn remove_time_observer(&self, id: SubscriptionId);
    }
}

mock! {
    pub Provider {}

    impl MediaEngineProvider for Provider {
        fn create_engine(&self, options: EngineOptions) -> Arc<dyn MediaEngine>;
    }
}

type Handlers = Arc<Mutex<Vec<(SignalKind, SignalHandler)>>>;

/// Expectations every remote session needs: attach, one snapshot per read,
/// six subscriptions, and the close sequence when the controller goes away.
fn expect_session(engine: &mut MockEngine) -> Handlers {
    let handlers: Handlers = Arc::new(Mutex::new(Vec::new()));
    let next_id = Arc::new(AtomicU64::new(1));

    engine.expect_attach().times(1).return_const(());
    engine
        .expect_snapshot()
        .returning(EngineSnapshot::default);

    let store = handlers.clone();
    engine
        .expect_subscribe()
        .times(6)
        .returning(move |kind, handler| {
            store.lock().unwrap().push((kind, handler));
            SubscriptionId::new(next_id.fetch_add(1, Ordering::SeqCst))
        });

    engine.expect_cancel_pending_seeks().times(1).return_const(());
    engine.expect_cancel_loading().times(1).return_const(());
    engine.expect_unsubscribe().times(6).return_const(());

    handlers
}

fn controller(engine: MockEngine, config: PlaybackConfig) -> PlayerController {
    let engine: Arc<dyn MediaEngine> = Arc::new(engine);
    let mut provider = MockProvider::new();
    provider
        .expect_create_engine()
        .times(1)
        .withf(|options| !options.automatically_waits_to_minimize_stalling)
        .return_once(move |_| engine);

    let core = CoreConfig::builder()
        .engine_provider(Arc::new(provider))
        .build()
        .unwrap();
    PlayerController::new(&core, config).unwrap()
}

fn fire(handlers: &Handlers, kind: SignalKind, signal: EngineSignal) {
    let handler = handlers
        .lock()
        .unwrap()
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, h)| h.clone())
        .unwrap();
    handler(signal);
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn local_load_call_sequence() {
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();

    engine
        .expect_attach()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|item| item.is_local && item.locator == "file:///clips/a.mp4")
        .return_const(());
    engine
        .expect_snapshot()
        .times(1)
        .in_sequence(&mut seq)
        .returning(EngineSnapshot::default);
    engine
        .expect_subscribe()
        .times(6)
        .in_sequence(&mut seq)
        .returning(|_, _| SubscriptionId::new(7));
    engine
        .expect_play_immediately()
        .with(eq(1.25f32))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_cancel_pending_seeks()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_cancel_loading()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    engine
        .expect_unsubscribe()
        .with(eq(SubscriptionId::new(7)))
        .times(6)
        .in_sequence(&mut seq)
        .return_const(());

    let config = PlaybackConfig {
        default_speed: 1.25,
        ..Default::default()
    };
    let player = controller(engine, config);
    player.load("file:///clips/a.mp4").unwrap();
    drop(player);
}

#[test]
fn pause_reason_is_recorded_before_engine_pauses() {
    let mut engine = MockEngine::new();
    expect_session(&mut engine);

    let slot: Arc<Mutex<Weak<PlayerController>>> = Arc::new(Mutex::new(Weak::new()));
    let observed = Arc::new(AtomicBool::new(false));

    let weak = slot.clone();
    let seen = observed.clone();
    engine.expect_pause().times(1).returning(move || {
        // Also proves no session lock is held while the engine is driven.
        let player = weak.lock().unwrap().upgrade().unwrap();
        seen.store(
            player.paused_reason() == PausedReason::UserRequested,
            Ordering::SeqCst,
        );
    });

    let player = Arc::new(controller(engine, PlaybackConfig::default()));
    *slot.lock().unwrap() = Arc::downgrade(&player);

    player.load("https://cdn.example.com/a.m3u8").unwrap();
    player.pause(PausedReason::UserRequested);

    assert!(observed.load(Ordering::SeqCst));
}

#[test]
fn speed_change_while_loading_waits_for_play() {
    let mut engine = MockEngine::new();
    expect_session(&mut engine);
    engine.expect_set_rate().never();
    engine
        .expect_play_immediately()
        .with(eq(1.5f32))
        .times(1)
        .return_const(());

    let player = controller(engine, PlaybackConfig::default());
    player.load("https://cdn.example.com/a.m3u8").unwrap();
    assert_eq!(player.state(), PlaybackState::Loading);

    player.set_speed(1.5).unwrap();
    player.resume();
}

#[test]
fn seek_forwards_tolerance_and_reports_synchronous_completion() {
    let mut engine = MockEngine::new();
    expect_session(&mut engine);
    engine
        .expect_seek()
        .withf(|to, tolerance, _| {
            *to == Duration::from_secs(3) && *tolerance == Some(SeekTolerance::EXACT)
        })
        .times(1)
        .returning(|_, _, completion| completion(true));

    let player = controller(engine, PlaybackConfig::default());
    player.load("https://cdn.example.com/a.m3u8").unwrap();

    let landed = Arc::new(AtomicBool::new(false));
    let flag = landed.clone();
    player
        .seek_with_tolerance(Duration::from_secs(3), SeekTolerance::EXACT, move |result| {
            flag.store(result.is_ok(), Ordering::SeqCst)
        })
        .unwrap();

    assert!(landed.load(Ordering::SeqCst));
}

#[test]
fn handler_rejects_signal_of_other_kind() {
    let mut engine = MockEngine::new();
    let handlers = expect_session(&mut engine);

    let player = controller(engine, PlaybackConfig::default());
    player.load("https://cdn.example.com/a.m3u8").unwrap();

    fire(
        &handlers,
        SignalKind::DecodeReadiness,
        EngineSignal::ItemStatusChanged(ItemStatus::Failed(EngineFailure::decode(1, "x"))),
    );
    assert_eq!(player.state(), PlaybackState::Loading);

    fire(
        &handlers,
        SignalKind::ItemStatus,
        EngineSignal::ItemStatusChanged(ItemStatus::Failed(EngineFailure::decode(1, "x"))),
    );
    assert!(player.state().is_failed());
}
