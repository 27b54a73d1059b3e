//! # Feed Player Example
//!
//! Drives a `PlayerController` against a scripted engine that plays a short
//! clip on a worker thread, the way a native engine would deliver signals.
//! The player loops the clip twice, then the view "scrolls away".
//!
//! Run with: `cargo run --example feed_demo --package core-playback`

use bridge_traits::playback::{
    EngineOptions, EngineSignal, EngineSnapshot, MediaEngine, MediaEngineProvider, MediaItem,
    SeekTolerance, SignalKind, SubscriptionId, TimeControlStatus,
};
use bridge_traits::{LogLevel, SeekCompletion, SignalHandler, TimeObserver};
use core_playback::{PausedReason, PlaybackConfig, PlayerController};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const CLIP: Duration = Duration::from_secs(6);
const STEP: Duration = Duration::from_millis(40);

// ============================================================================
// Scripted engine
// ============================================================================

#[derive(Default)]
struct Script {
    snapshot: Mutex<EngineSnapshot>,
    handlers: Mutex<Vec<(SubscriptionId, SignalKind, SignalHandler)>>,
    next_id: AtomicU64,
}

impl Script {
    fn emit(&self, signal: EngineSignal) {
        let handlers: Vec<SignalHandler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, kind, _)| *kind == signal.kind())
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(signal.clone());
        }
    }

    /// Frame readiness, then one second of media per step until the end.
    fn run_clip(self: Arc<Self>) {
        thread::spawn(move || {
            thread::sleep(STEP);
            self.snapshot.lock().unwrap().ready_for_display = true;
            self.emit(EngineSignal::DecodeReadinessChanged {
                ready_for_display: true,
            });

            loop {
                thread::sleep(STEP);
                let done = {
                    let mut snapshot = self.snapshot.lock().unwrap();
                    if snapshot.rate == 0.0 {
                        return;
                    }
                    snapshot.position = (snapshot.position + Duration::from_secs(1)).min(CLIP);
                    snapshot.buffered = CLIP;
                    snapshot.position == CLIP
                };
                self.emit(EngineSignal::BufferedRangesChanged);
                if done {
                    self.snapshot.lock().unwrap().rate = 0.0;
                    self.emit(EngineSignal::EndOfMediaReached);
                    return;
                }
            }
        });
    }
}

struct ScriptedEngine {
    script: Arc<Script>,
}

impl MediaEngine for ScriptedEngine {
    fn attach(&self, item: MediaItem) {
        println!("engine: attach (local: {})", item.is_local);
        let mut snapshot = self.script.snapshot.lock().unwrap();
        snapshot.duration = CLIP;
        snapshot.item_ready = true;
        snapshot.enough_to_play = item.is_local;
    }

    fn play_immediately(&self, rate: f32) {
        println!("engine: play at {rate}");
        self.script.snapshot.lock().unwrap().rate = rate;
        Arc::clone(&self.script).run_clip();
    }

    fn pause(&self) {
        println!("engine: pause");
        self.script.snapshot.lock().unwrap().rate = 0.0;
        let script = Arc::clone(&self.script);
        thread::spawn(move || {
            script.emit(EngineSignal::TimeControlChanged(TimeControlStatus::Paused))
        });
    }

    fn seek(&self, to: Duration, _tolerance: Option<SeekTolerance>, completion: SeekCompletion) {
        println!("engine: seek to {to:?}");
        self.script.snapshot.lock().unwrap().position = to;
        thread::spawn(move || completion(true));
    }

    fn cancel_pending_seeks(&self) {}

    fn cancel_loading(&self) {}

    fn set_rate(&self, rate: f32) {
        self.script.snapshot.lock().unwrap().rate = rate;
    }

    fn set_muted(&self, _muted: bool) {}

    fn is_muted(&self) -> bool {
        false
    }

    fn set_volume(&self, _volume: f64) {}

    fn volume(&self) -> f64 {
        1.0
    }

    fn audio_track_count(&self) -> usize {
        1
    }

    fn select_audio_track(&self, _index: usize) {}

    fn snapshot(&self) -> EngineSnapshot {
        *self.script.snapshot.lock().unwrap()
    }

    fn subscribe(&self, kind: SignalKind, handler: SignalHandler) -> SubscriptionId {
        let id = SubscriptionId::new(self.script.next_id.fetch_add(1, Ordering::Relaxed));
        self.script.handlers.lock().unwrap().push((id, kind, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.script
            .handlers
            .lock()
            .unwrap()
            .retain(|(tracked, _, _)| *tracked != id);
    }

    fn add_periodic_time_observer(&self, _interval: Duration, _observer: TimeObserver) -> SubscriptionId {
        SubscriptionId::new(self.script.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn remove_time_observer(&self, _id: SubscriptionId) {}
}

struct ScriptedProvider;

impl MediaEngineProvider for ScriptedProvider {
    fn create_engine(&self, _options: EngineOptions) -> Arc<dyn MediaEngine> {
        Arc::new(ScriptedEngine {
            script: Arc::new(Script::default()),
        })
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let core = CoreConfig::builder()
        .engine_provider(Arc::new(ScriptedProvider))
        .build()?;
    let player = PlayerController::new(&core, PlaybackConfig::looping())?;

    player.on_state_change(|state| println!("state: {state}"));
    player.on_replay(|count| println!("replay #{count}"));
    player.on_buffer_health(|healthy| println!("buffer healthy: {healthy}"));

    player.load("file:///clips/intro.mp4")?;

    while player.replay_count() < 2 {
        thread::sleep(STEP);
    }
    thread::sleep(STEP * 3);

    player.pause(PausedReason::Hidden);
    thread::sleep(STEP * 2);

    println!(
        "watched {:?} over {} replays",
        player.cumulative_watch_duration(),
        player.replay_count()
    );

    player.teardown();
    Ok(())
}
