//! # Session Lifecycle
//!
//! A [`Session`] is one attachment of the state machine to one engine and
//! one media item. [`Shared`] owns the live session, the state machine and
//! the notification outbox behind a single lock, and implements load,
//! teardown and signal handling on top of them.
//!
//! ## Generations
//!
//! Every load or teardown bumps a generation counter. Signal handlers, seek
//! completions and time observers capture the generation they were created
//! for and are rejected once it is no longer live, so nothing from a
//! superseded session reaches the state machine or the host.
//!
//! ## Locking
//!
//! Handlers read the engine snapshot before taking the lock, apply the signal
//! and queue host notifications under it, and release it before notifying the
//! host or issuing engine commands. A replaced session is detached under the
//! lock and closed after it is released, since cancelling its seeks can run
//! their completions inline.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::machine::{Effect, StateMachine};
use crate::observer::ObserverSet;
use crate::outbox::{Notification, Outbox, SeekCallback};
use crate::state::{PausedReason, PlaybackState, SessionId};
use bridge_traits::playback::{
    EngineSignal, MediaEngine, MediaEngineProvider, MediaItem, SeekTolerance, SignalKind,
    SubscriptionId,
};
use bridge_traits::{SignalHandler, TimeObserver};
use core_runtime::logging::redact_locator;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use url::Url;

/// Handle for a periodic time observer registered on a session.
///
/// Tokens are only valid for the session they were created on; teardown
/// removes the observer automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeObserverToken {
    generation: u64,
    id: SubscriptionId,
}

/// One engine, one item, one observer set.
pub struct Session {
    id: SessionId,
    locator: String,
    generation: u64,
    engine: Arc<dyn MediaEngine>,
    observers: ObserverSet,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    /// Cancel outstanding work, drop every subscription, then release the
    /// engine. Must be called without the session lock held.
    fn close(self) {
        let Session {
            id,
            generation,
            engine,
            observers,
            ..
        } = self;

        engine.cancel_pending_seeks();
        engine.cancel_loading();
        observers.invalidate();
        drop(engine);

        debug!(session_id = %id, generation, "Session closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("locator", &redact_locator(&self.locator))
            .field("generation", &self.generation)
            .field("observers", &self.observers)
            .finish()
    }
}

/// State guarded by the session lock.
pub(crate) struct Inner {
    pub machine: StateMachine,
    pub session: Option<Session>,
    pub generation: u64,
    pub observer_sets_created: u64,
    pub config: PlaybackConfig,
}

/// Engine handle and values needed to act on the live session after the
/// lock is released.
struct Target {
    engine: Arc<dyn MediaEngine>,
    generation: u64,
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    live_generation: AtomicU64,
    outbox: Outbox,
    provider: Arc<dyn MediaEngineProvider>,
}

impl Shared {
    pub fn new(
        provider: Arc<dyn MediaEngineProvider>,
        outbox: Outbox,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                machine: StateMachine::new(&config),
                session: None,
                generation: 0,
                observer_sets_created: 0,
                config,
            }),
            live_generation: AtomicU64::new(0),
            outbox,
            provider,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock()
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Load `locator`, reusing the live session when it already plays it.
    ///
    /// The previous session is closed with the lock released: cancelling its
    /// seeks may run their completions on this thread.
    pub fn load(self: &Arc<Self>, locator: &str) -> Result<SessionId> {
        let is_local = classify_locator(locator)?;

        let mut inner = self.inner.lock();

        let reusable = inner.session.as_ref().and_then(|session| {
            (session.locator == locator && !inner.machine.state().is_failed())
                .then(|| (session.id, Arc::clone(&session.engine), session.generation))
        });

        if let Some((session_id, engine, generation)) = reusable {
            debug!(session_id = %session_id, "Same locator loaded, resuming");
            let effects = inner.machine.resume_existing();
            let commands = self.enqueue(&inner, session_id, effects);
            drop(inner);

            self.outbox.drain(&self.live_generation);
            self.run(&Target { engine, generation }, commands);
            return Ok(session_id);
        }

        let generation = self.advance_generation(&mut inner);
        let old = inner.session.take();
        drop(inner);

        if let Some(old) = old {
            old.close();
        }

        let (session_id, target, commands) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(
                    generation,
                    live_generation = inner.generation,
                    "Load superseded while closing previous session"
                );
                return Err(PlaybackError::LoadSuperseded);
            }
            self.start_session(&mut inner, generation, locator, is_local)
        };

        self.outbox.drain(&self.live_generation);
        self.run(&target, commands);
        Ok(session_id)
    }

    fn start_session(
        self: &Arc<Self>,
        inner: &mut Inner,
        generation: u64,
        locator: &str,
        is_local: bool,
    ) -> (SessionId, Target, Vec<Effect>) {
        let engine = self.provider.create_engine(inner.config.engine_options());
        let item = MediaItem::new(locator, is_local)
            .with_network_while_paused(inner.config.use_network_while_paused);
        engine.attach(item);

        // Read before any handler is registered.
        let snapshot = engine.snapshot();

        self.outbox.surface().bind_engine(Some(Arc::clone(&engine)));

        let weak_shared = Arc::downgrade(self);
        let weak_engine = Arc::downgrade(&engine);
        let observers = ObserverSet::subscribe_all(Arc::clone(&engine), generation, |kind| {
            signal_handler(weak_shared.clone(), weak_engine.clone(), generation, kind)
        });
        inner.observer_sets_created += 1;

        let session_id = SessionId::new();
        info!(
            session_id = %session_id,
            locator = %redact_locator(locator),
            generation,
            is_local,
            "Session created"
        );

        let effects = inner
            .machine
            .begin_session(is_local || snapshot.enough_to_play, snapshot.item_ready);

        inner.session = Some(Session {
            id: session_id,
            locator: locator.to_string(),
            generation,
            engine: Arc::clone(&engine),
            observers,
        });

        let commands = self.enqueue(inner, session_id, effects);
        (session_id, Target { engine, generation }, commands)
    }

    /// Destroy the live session. With `notify`, the host sees the reset to
    /// `None`; without it (owner destroyed) only the surface is hidden.
    pub fn teardown(&self, notify: bool) {
        let old = {
            let mut inner = self.inner.lock();
            self.advance_generation(&mut inner);

            let Some(old) = inner.session.take() else {
                return;
            };
            self.outbox.surface().bind_engine(None);
            info!(session_id = %old.id, "Session torn down");

            let effects = inner.machine.end_session();
            if notify {
                self.enqueue(&inner, old.id, effects);
            } else {
                self.outbox.clear();
            }
            old
        };

        old.close();

        if notify {
            self.outbox.drain(&self.live_generation);
        } else {
            self.outbox.surface().set_visible(false);
        }
    }

    /// Run a host-initiated machine operation against the live session.
    /// Nothing happens, not even to the machine, when no session is loaded.
    pub fn host_command<F>(self: &Arc<Self>, op: F)
    where
        F: FnOnce(&mut StateMachine) -> Vec<Effect>,
    {
        let dispatch = {
            let mut inner = self.inner.lock();
            if inner.session.is_none() {
                trace!("No session loaded, ignoring host command");
                return;
            }
            let effects = op(&mut inner.machine);
            self.dispatch_live(&inner, effects)
        };
        self.finish_dispatch(dispatch);
    }

    /// Update a machine setting that outlives sessions (speed), then act on
    /// the live session if there is one.
    pub fn update_setting<F>(self: &Arc<Self>, op: F)
    where
        F: FnOnce(&mut StateMachine) -> Vec<Effect>,
    {
        let dispatch = {
            let mut inner = self.inner.lock();
            let effects = op(&mut inner.machine);
            self.dispatch_live(&inner, effects)
        };
        self.finish_dispatch(dispatch);
    }

    /// Queue `effects` for the live session (lock held).
    fn dispatch_live(&self, inner: &Inner, effects: Vec<Effect>) -> Option<(Target, Vec<Effect>)> {
        let session = inner.session.as_ref()?;
        let target = Target {
            engine: Arc::clone(&session.engine),
            generation: session.generation,
        };
        let commands = self.enqueue(inner, session.id, effects);
        Some((target, commands))
    }

    fn finish_dispatch(self: &Arc<Self>, dispatch: Option<(Target, Vec<Effect>)>) {
        let Some((target, commands)) = dispatch else {
            return;
        };
        self.outbox.drain(&self.live_generation);
        self.run(&target, commands);
    }

    /// Host seek; `completion` runs only if the session is still live.
    pub fn seek(
        self: &Arc<Self>,
        to: Duration,
        tolerance: Option<SeekTolerance>,
        completion: SeekCallback,
    ) -> Result<()> {
        let target = self.live_target()?;
        let weak = Arc::downgrade(self);
        let generation = target.generation;

        target.engine.seek(
            to,
            tolerance,
            Box::new(move |landed| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if !landed {
                    warn!(target_secs = to.as_secs_f64(), "Seek failed");
                }
                shared.outbox.push(Notification::SeekFinished {
                    generation,
                    target: to,
                    landed,
                    completion,
                });
                shared.outbox.drain(&shared.live_generation);
            }),
        );
        Ok(())
    }

    pub fn add_time_observer(
        self: &Arc<Self>,
        interval: Duration,
        observer: TimeObserver,
    ) -> Result<TimeObserverToken> {
        let mut inner = self.inner.lock();
        let session = inner.session.as_mut().ok_or(PlaybackError::NoSessionLoaded)?;
        let generation = session.generation;

        let weak = Arc::downgrade(self);
        let guarded: TimeObserver = Arc::new(move |position| {
            let live = weak
                .upgrade()
                .map(|shared| shared.live_generation.load(Ordering::Acquire) == generation)
                .unwrap_or(false);
            if live {
                observer(position);
            }
        });

        let id = session.observers.add_time_observer(interval, guarded);
        Ok(TimeObserverToken { generation, id })
    }

    pub fn remove_time_observer(&self, token: TimeObserverToken) -> bool {
        let mut inner = self.inner.lock();
        match inner.session.as_mut() {
            Some(session) if session.generation == token.generation => {
                session.observers.remove_time_observer(token.id)
            }
            _ => false,
        }
    }

    /// Engine of the live session, for pass-through calls.
    pub fn live_engine(&self) -> Result<Arc<dyn MediaEngine>> {
        Ok(self.live_target()?.engine)
    }

    fn live_target(&self) -> Result<Target> {
        let inner = self.inner.lock();
        let session = inner.session.as_ref().ok_or(PlaybackError::NoSessionLoaded)?;
        Ok(Target {
            engine: Arc::clone(&session.engine),
            generation: session.generation,
        })
    }

    fn handle_signal(
        self: &Arc<Self>,
        generation: u64,
        engine: Arc<dyn MediaEngine>,
        signal: EngineSignal,
    ) {
        let snapshot = engine.snapshot();

        let commands = {
            let mut inner = self.inner.lock();
            let Some(session_id) = self.live_session_id(&inner, generation, signal.kind()) else {
                return;
            };
            let effects = inner.machine.apply(&signal, &snapshot);
            self.enqueue(&inner, session_id, effects)
        };

        self.outbox.drain(&self.live_generation);
        self.run(&Target { engine, generation }, commands);
    }

    fn handle_replay_seek(self: &Arc<Self>, generation: u64, engine: Arc<dyn MediaEngine>, landed: bool) {
        let snapshot = engine.snapshot();

        let commands = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                return;
            }
            let Some(session_id) = inner.session.as_ref().map(|s| s.id) else {
                return;
            };
            let effects = inner.machine.on_replay_seek_finished(landed, &snapshot);
            self.enqueue(&inner, session_id, effects)
        };

        self.outbox.drain(&self.live_generation);
        self.run(&Target { engine, generation }, commands);
    }

    fn live_session_id(&self, inner: &Inner, generation: u64, kind: SignalKind) -> Option<SessionId> {
        let live = inner
            .session
            .as_ref()
            .filter(|session| session.generation == generation && inner.generation == generation);

        if live.is_none() {
            let dropped = PlaybackError::StaleSignal {
                signal_generation: generation,
                live_generation: inner.generation,
            };
            trace!(?kind, reason = %dropped, "Dropping signal");
        }

        live.map(|session| session.id)
    }

    fn advance_generation(&self, inner: &mut Inner) -> u64 {
        inner.generation += 1;
        self.live_generation.store(inner.generation, Ordering::Release);
        inner.generation
    }

    /// Queue host-facing effects (lock held) and hand back engine commands.
    fn enqueue(&self, inner: &Inner, session_id: SessionId, effects: Vec<Effect>) -> Vec<Effect> {
        let mut commands = Vec::new();

        for effect in effects {
            match effect {
                Effect::Commit(state) => {
                    log_commit(session_id, &state, inner.machine.reason());
                    self.outbox.push(Notification::State(state));
                }
                Effect::EndOfMedia => self.outbox.push(Notification::EndOfMedia),
                Effect::ReplayStarted { replay_count } => {
                    self.outbox.push(Notification::ReplayStarted(replay_count))
                }
                Effect::BufferHealth(healthy) => {
                    debug!(session_id = %session_id, healthy, "Buffer health changed");
                    self.outbox.push(Notification::BufferHealth(healthy));
                }
                command => commands.push(command),
            }
        }

        commands
    }

    /// Issue engine commands. Skipped entirely if the session was replaced
    /// while the lock was released.
    fn run(self: &Arc<Self>, target: &Target, commands: Vec<Effect>) {
        if commands.is_empty() {
            return;
        }
        if self.live_generation.load(Ordering::Acquire) != target.generation {
            trace!(generation = target.generation, "Skipping commands for superseded session");
            return;
        }

        for command in commands {
            match command {
                Effect::PlayImmediately(rate) => target.engine.play_immediately(rate),
                Effect::Pause => target.engine.pause(),
                Effect::SetRate(rate) => target.engine.set_rate(rate),
                Effect::SeekToStart => {
                    let weak_shared = Arc::downgrade(self);
                    let weak_engine = Arc::downgrade(&target.engine);
                    let generation = target.generation;
                    target.engine.seek(
                        Duration::ZERO,
                        None,
                        Box::new(move |landed| {
                            if let (Some(shared), Some(engine)) =
                                (weak_shared.upgrade(), weak_engine.upgrade())
                            {
                                shared.handle_replay_seek(generation, engine, landed);
                            }
                        }),
                    );
                }
                Effect::Commit(_)
                | Effect::EndOfMedia
                | Effect::ReplayStarted { .. }
                | Effect::BufferHealth(_) => {}
            }
        }
    }
}

fn signal_handler(
    shared: Weak<Shared>,
    engine: Weak<dyn MediaEngine>,
    generation: u64,
    kind: SignalKind,
) -> SignalHandler {
    Arc::new(move |signal: EngineSignal| {
        if signal.kind() != kind {
            warn!(expected = ?kind, received = ?signal.kind(), "Signal delivered on wrong subscription");
            return;
        }
        if let (Some(shared), Some(engine)) = (shared.upgrade(), engine.upgrade()) {
            shared.handle_signal(generation, engine, signal);
        }
    })
}

fn log_commit(session_id: SessionId, state: &PlaybackState, reason: PausedReason) {
    match state {
        PlaybackState::Failed { error } => {
            warn!(session_id = %session_id, state = state.name(), error = %error, "State committed")
        }
        _ => info!(session_id = %session_id, state = %state, reason = ?reason, "State committed"),
    }
}

/// Whether `locator` points at local storage.
///
/// File URLs and bare paths are local; anything else must be an absolute URL
/// with a scheme.
pub fn classify_locator(locator: &str) -> Result<bool> {
    let trimmed = locator.trim();
    if trimmed.is_empty() {
        return Err(PlaybackError::InvalidLocator(
            "locator is empty".to_string(),
        ));
    }

    match Url::parse(trimmed) {
        // Drive letters ("C:\...") parse as a one-letter scheme.
        Ok(url) => Ok(url.scheme() == "file" || (url.host_str().is_none() && url.scheme().len() == 1)),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(true),
        Err(err) => Err(PlaybackError::InvalidLocator(format!(
            "{}: {}",
            redact_locator(trimmed),
            err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_local_and_remote_locators() {
        assert!(classify_locator("file:///Users/me/Movies/a.mp4").unwrap());
        assert!(classify_locator("/var/mobile/a.mp4").unwrap());
        assert!(classify_locator("a.mp4").unwrap());
        assert!(classify_locator("C:\\Videos\\a.mp4").unwrap());
        assert!(!classify_locator("https://cdn.example.com/a.m3u8?sig=1").unwrap());
    }

    #[test]
    fn classify_rejects_empty_and_malformed() {
        assert!(matches!(
            classify_locator("   "),
            Err(PlaybackError::InvalidLocator(_))
        ));
        assert!(matches!(
            classify_locator("http://"),
            Err(PlaybackError::InvalidLocator(_))
        ));
    }
}
