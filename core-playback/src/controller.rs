//! # Player Controller
//!
//! The host-facing surface of the playback core.
//!
//! A `PlayerController` is owned by whichever host component shows video
//! (one per player view). It loads locators, forwards transport commands to
//! the engine of the live session and reports state through callbacks.
//! Derived values such as progress and watch time are computed on demand.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PausedReason, PlaybackConfig, PlayerController};
//!
//! let player = PlayerController::new(&core_config, PlaybackConfig::looping())?;
//! player.on_state_change(|state| println!("state: {state}"));
//! player.load("https://cdn.example.com/clip.m3u8")?;
//!
//! // View scrolled off screen
//! player.pause(PausedReason::Hidden);
//! ```
//!
//! ## Threading
//!
//! All methods return immediately and may be called from any thread.
//! Callbacks run on whichever thread committed the notification (a host call
//! or an engine worker) with no internal lock held, so they may call back
//! into the controller.

use crate::accountant::PlaybackMetrics;
use crate::config::{is_valid_speed, PlaybackConfig, PlaybackSpeed};
use crate::error::{PlaybackError, Result};
use crate::outbox::{Outbox, SeekCallback};
use crate::session::{Shared, TimeObserverToken};
use crate::state::{PausedReason, PlaybackState, SessionId};
use bridge_traits::playback::{EngineSnapshot, SeekTolerance};
use core_runtime::config::CoreConfig;
use futures::channel::oneshot;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub struct PlayerController {
    shared: Arc<Shared>,
}

impl PlayerController {
    /// Create a controller using the bridges in `core`.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Config`] if `config` fails validation.
    pub fn new(core: &CoreConfig, config: PlaybackConfig) -> Result<Self> {
        let config = config.validated()?;
        let outbox = Outbox::new(Arc::clone(&core.display_surface));
        let shared = Shared::new(Arc::clone(&core.engine_provider), outbox, config);
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Called with every committed, non-duplicate state.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(&PlaybackState) + Send + Sync + 'static,
    {
        self.shared.outbox().set_state_callback(Arc::new(callback));
    }

    /// Called when the item plays to its end, before `Completed` is reported.
    pub fn on_end_of_media<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.outbox().set_end_of_media_callback(Arc::new(callback));
    }

    /// Called when an automatic replay starts, with the new replay count.
    pub fn on_replay<F>(&self, callback: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.shared.outbox().set_replay_callback(Arc::new(callback));
    }

    /// Called when the buffer becomes healthy or stops being healthy. Hosts
    /// use it to start or pause preloading of other media.
    pub fn on_buffer_health<F>(&self, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.outbox().set_buffer_health_callback(Arc::new(callback));
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Load `locator`. Loading the locator that is already playing resumes
    /// it instead of starting over; a failed session is always rebuilt.
    #[instrument(skip(self, locator))]
    pub fn load(&self, locator: &str) -> Result<SessionId> {
        self.shared.load(locator)
    }

    /// Destroy the live session and report `None`.
    pub fn teardown(&self) {
        self.shared.teardown(true);
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Pause for `reason`. Only [`PausedReason::WaitingForBuffer`] pauses
    /// are recovered automatically.
    pub fn pause(&self, reason: PausedReason) {
        self.shared.host_command(|machine| machine.pause(reason));
    }

    pub fn resume(&self) {
        self.shared.host_command(|machine| machine.resume());
    }

    /// Restart from the beginning, counting one more replay.
    pub fn replay(&self) {
        self.replay_with(false);
    }

    /// Restart from the beginning; `reset_count` zeroes the replay count
    /// instead of incrementing it.
    pub fn replay_with(&self, reset_count: bool) {
        self.shared.host_command(|machine| machine.replay(reset_count));
    }

    pub fn seek<F>(&self, to: Duration, completion: F) -> Result<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.shared.seek(to, None, Box::new(completion))
    }

    pub fn seek_with_tolerance<F>(
        &self,
        to: Duration,
        tolerance: SeekTolerance,
        completion: F,
    ) -> Result<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.shared.seek(to, Some(tolerance), Box::new(completion))
    }

    /// Seek to `fraction` (0.0-1.0) of the total duration.
    pub fn seek_to_progress<F>(&self, fraction: f64, completion: F) -> Result<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PlaybackError::InvalidProgress(fraction));
        }
        let total = self.total_duration();
        self.seek(total.mul_f64(fraction), completion)
    }

    /// Seek and wait for the result. Resolves to
    /// [`PlaybackError::SeekCancelled`] if the session goes away first.
    pub fn seek_async(&self, to: Duration) -> impl Future<Output = Result<()>> {
        let (tx, rx) = oneshot::channel();
        let completion: SeekCallback = Box::new(move |result| {
            let _ = tx.send(result);
        });
        let started = self.shared.seek(to, None, completion);

        async move {
            started?;
            rx.await.unwrap_or(Err(PlaybackError::SeekCancelled))
        }
    }

    /// Change the rate used for every playback request.
    pub fn set_speed(&self, speed: f32) -> Result<()> {
        if !is_valid_speed(speed) {
            return Err(PlaybackError::InvalidSpeed(speed));
        }
        self.shared.update_setting(|machine| machine.set_speed(speed));
        Ok(())
    }

    pub fn set_speed_preset(&self, preset: PlaybackSpeed) -> Result<()> {
        self.set_speed(preset.rate())
    }

    pub fn speed(&self) -> f32 {
        self.shared.lock().machine.speed()
    }

    pub fn set_auto_replay(&self, enabled: bool) {
        self.shared.lock().machine.set_auto_replay(enabled);
    }

    pub fn is_auto_replay(&self) -> bool {
        self.shared.lock().machine.accountant().auto_replay_enabled()
    }

    // ========================================================================
    // Audio
    // ========================================================================

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.shared.live_engine()?.set_muted(muted);
        Ok(())
    }

    pub fn is_muted(&self) -> Result<bool> {
        Ok(self.shared.live_engine()?.is_muted())
    }

    /// Volume in `0.0..=1.0`.
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.shared.live_engine()?.set_volume(volume);
        Ok(())
    }

    pub fn volume(&self) -> Result<f64> {
        Ok(self.shared.live_engine()?.volume())
    }

    pub fn audio_track_count(&self) -> Result<usize> {
        Ok(self.shared.live_engine()?.audio_track_count())
    }

    /// Switch to audio track `index` of the current item.
    pub fn select_audio_track(&self, index: usize) -> Result<()> {
        let engine = self.shared.live_engine()?;
        let available = engine.audio_track_count();
        if index >= available {
            return Err(PlaybackError::AudioTrackOutOfRange { index, available });
        }
        engine.select_audio_track(index);
        Ok(())
    }

    // ========================================================================
    // Time observers
    // ========================================================================

    /// Call `observer` with the playhead every `interval` while this session
    /// is live.
    pub fn add_periodic_time_observer<F>(
        &self,
        interval: Duration,
        observer: F,
    ) -> Result<TimeObserverToken>
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.shared.add_time_observer(interval, Arc::new(observer))
    }

    /// Returns `false` if the token's session is gone or it was already
    /// removed.
    pub fn remove_time_observer(&self, token: TimeObserverToken) -> bool {
        self.shared.remove_time_observer(token)
    }

    // ========================================================================
    // Read-only state
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().machine.state().clone()
    }

    pub fn paused_reason(&self) -> PausedReason {
        self.shared.lock().machine.reason()
    }

    pub fn replay_count(&self) -> u32 {
        self.shared.lock().machine.accountant().replay_count()
    }

    pub fn current_locator(&self) -> Option<String> {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|session| session.locator().to_string())
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.lock().session.as_ref().map(|session| session.id())
    }

    /// Number of observer sets created over the controller's lifetime.
    pub fn observer_sets_created(&self) -> u64 {
        self.shared.lock().observer_sets_created
    }

    /// All derived figures from one engine snapshot.
    pub fn metrics(&self) -> PlaybackMetrics {
        let (engine, loaded, accountant) = {
            let inner = self.shared.lock();
            let Some(session) = inner.session.as_ref() else {
                return PlaybackMetrics::default();
            };
            (
                Arc::clone(session.engine()),
                inner.machine.is_loaded(),
                *inner.machine.accountant(),
            )
        };

        let snapshot: EngineSnapshot = engine.snapshot();
        PlaybackMetrics::compute(&snapshot, loaded, &accountant)
    }

    pub fn play_progress(&self) -> f64 {
        self.metrics().play_progress
    }

    pub fn buffer_progress(&self) -> f64 {
        self.metrics().buffer_progress
    }

    pub fn current_duration(&self) -> Duration {
        self.metrics().current_duration
    }

    pub fn current_buffer_duration(&self) -> Duration {
        self.metrics().current_buffer_duration
    }

    pub fn total_duration(&self) -> Duration {
        self.metrics().total_duration
    }

    /// Current position plus one total duration per replay.
    pub fn cumulative_watch_duration(&self) -> Duration {
        self.metrics().cumulative_watch_duration
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.shared.teardown(false);
    }
}

impl std::fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("PlayerController")
            .field("state", inner.machine.state())
            .field("reason", &inner.machine.reason())
            .field("session", &inner.session)
            .finish()
    }
}
