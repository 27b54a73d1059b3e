//! # Playback State Machine
//!
//! Derives the one canonical [`PlaybackState`] from raw engine signals.
//!
//! ## Overview
//!
//! The machine is pure: it never touches the engine or the host. Every
//! operation returns the [`Effect`]s the caller must carry out, host-facing
//! notifications first and engine commands after, so the session can queue
//! notifications while it still holds its lock and issue engine commands once
//! the lock is released.
//!
//! Readiness and time-control signals can both claim "now playing" in either
//! order. Both paths set the same flags and commit the same value, and a
//! commit equal to the current state is not re-emitted, so the outcome does
//! not depend on which arrives first.

use crate::accountant::{PlaybackMetrics, ReplayAccountant};
use crate::config::PlaybackConfig;
use crate::stall::{StallContext, StallDecision, StallRecoveryPolicy};
use crate::state::{PausedReason, PlaybackState};
use bridge_traits::playback::{EngineSignal, EngineSnapshot, ItemStatus, TimeControlStatus};
use std::time::Duration;
use tracing::{debug, warn};

/// Work produced by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    // Host-facing
    /// A new, non-duplicate state was committed.
    Commit(PlaybackState),
    /// The item played to its end.
    EndOfMedia,
    /// An automatic replay began.
    ReplayStarted { replay_count: u32 },
    /// Buffer health flipped.
    BufferHealth(bool),

    // Engine-facing
    /// Seek to zero and report the result to
    /// [`StateMachine::on_replay_seek_finished`].
    SeekToStart,
    PlayImmediately(f32),
    Pause,
    SetRate(f32),
}

impl Effect {
    pub fn is_host_facing(&self) -> bool {
        matches!(
            self,
            Effect::Commit(_)
                | Effect::EndOfMedia
                | Effect::ReplayStarted { .. }
                | Effect::BufferHealth(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PlaybackState,
    reason: PausedReason,
    accountant: ReplayAccountant,
    policy: StallRecoveryPolicy,
    speed: f32,
    /// Item observed playing (or ready at session start). Gates all metrics.
    loaded: bool,
    replay_in_flight: bool,
    replay_seek_landed: bool,
    buffer_healthy: Option<bool>,
    preload_buffer_ahead: Duration,
    preload_progress_threshold: f64,
}

impl StateMachine {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: PlaybackState::None,
            reason: PausedReason::WaitingForBuffer,
            accountant: ReplayAccountant::new(config.auto_replay),
            policy: StallRecoveryPolicy,
            speed: config.default_speed,
            loaded: false,
            replay_in_flight: false,
            replay_seek_landed: false,
            buffer_healthy: None,
            preload_buffer_ahead: config.preload_buffer_ahead,
            preload_progress_threshold: config.preload_progress_threshold,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn reason(&self) -> PausedReason {
        self.reason
    }

    pub fn accountant(&self) -> &ReplayAccountant {
        &self.accountant
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn replay_in_flight(&self) -> bool {
        self.replay_in_flight
    }

    pub fn set_auto_replay(&mut self, enabled: bool) {
        self.accountant.set_auto_replay(enabled);
    }

    pub fn metrics(&self, snapshot: &EngineSnapshot) -> PlaybackMetrics {
        PlaybackMetrics::compute(snapshot, self.loaded, &self.accountant)
    }

    /// Reset per-session bookkeeping after a new item was attached.
    ///
    /// Immediately playable items (local, or enough data buffered) skip
    /// `Loading` and are started right away.
    pub fn begin_session(&mut self, immediately_playable: bool, item_ready: bool) -> Vec<Effect> {
        self.reason = PausedReason::WaitingForBuffer;
        self.accountant.reset();
        self.replay_in_flight = false;
        self.replay_seek_landed = false;
        self.loaded = false;
        self.buffer_healthy = None;

        let mut effects = Vec::new();
        if immediately_playable {
            self.loaded = item_ready;
            self.commit(PlaybackState::None, &mut effects);
            effects.push(Effect::PlayImmediately(self.speed));
        } else {
            self.commit(PlaybackState::Loading, &mut effects);
        }
        effects
    }

    /// Session torn down; back to `None`.
    pub fn end_session(&mut self) -> Vec<Effect> {
        self.reason = PausedReason::WaitingForBuffer;
        self.replay_in_flight = false;
        self.replay_seek_landed = false;
        self.loaded = false;
        self.buffer_healthy = None;

        let mut effects = Vec::new();
        self.commit(PlaybackState::None, &mut effects);
        effects
    }

    /// Same locator loaded again while alive: resume, no new session.
    pub fn resume_existing(&mut self) -> Vec<Effect> {
        self.resume()
    }

    /// Apply one engine signal observed together with `snapshot`.
    pub fn apply(&mut self, signal: &EngineSignal, snapshot: &EngineSnapshot) -> Vec<Effect> {
        let mut effects = Vec::new();

        // Terminal for the session.
        if self.state.is_failed() {
            return effects;
        }

        match signal {
            EngineSignal::DecodeReadinessChanged { ready_for_display } => {
                if *ready_for_display && snapshot.rate > 0.0 {
                    self.enter_playing(&mut effects);
                }
            }
            EngineSignal::TimeControlChanged(status) => {
                self.apply_time_control(*status, snapshot, &mut effects);
            }
            EngineSignal::BufferedRangesChanged => {
                if matches!(self.state, PlaybackState::Paused { .. })
                    && self.reason != PausedReason::Hidden
                {
                    let paused = self.paused_snapshot(snapshot);
                    self.commit(paused, &mut effects);
                }
                self.evaluate_buffer_health(snapshot, &mut effects);
            }
            EngineSignal::KeepUpLikelyChanged(likely) => {
                let decision = self
                    .policy
                    .on_keep_up_likely(*likely, snapshot.rate, self.stall_context());
                if decision == StallDecision::Resume {
                    debug!(speed = self.speed, "Keep-up likely while stalled, resuming");
                    effects.push(Effect::PlayImmediately(self.speed));
                }
            }
            EngineSignal::ItemStatusChanged(ItemStatus::Failed(failure)) => {
                warn!(error = %failure, "Media item failed");
                self.commit(
                    PlaybackState::Failed {
                        error: failure.clone(),
                    },
                    &mut effects,
                );
            }
            EngineSignal::ItemStatusChanged(_) => {}
            EngineSignal::EndOfMediaReached => {
                self.apply_end_of_media(&mut effects);
            }
        }

        effects
    }

    /// Result of the seek issued for [`Effect::SeekToStart`].
    pub fn on_replay_seek_finished(
        &mut self,
        landed: bool,
        snapshot: &EngineSnapshot,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.replay_in_flight || self.state.is_failed() {
            return effects;
        }

        if !landed {
            warn!("Replay seek did not land");
            self.replay_in_flight = false;
            self.replay_seek_landed = false;
            return effects;
        }

        self.replay_seek_landed = true;
        if snapshot.is_advancing() {
            self.finish_replay(&mut effects);
        }
        effects
    }

    /// Host pause. The reason is recorded before the engine is asked to
    /// pause, since the resulting signal may arrive before the call returns.
    pub fn pause(&mut self, reason: PausedReason) -> Vec<Effect> {
        self.reason = reason;
        vec![Effect::Pause]
    }

    pub fn resume(&mut self) -> Vec<Effect> {
        self.reason = PausedReason::WaitingForBuffer;
        vec![Effect::PlayImmediately(self.speed)]
    }

    /// Host-requested replay from the start.
    pub fn replay(&mut self, reset_count: bool) -> Vec<Effect> {
        let count = self.accountant.record_manual_replay(reset_count);
        debug!(replay_count = count, reset_count, "Manual replay");
        self.reason = PausedReason::WaitingForBuffer;
        vec![Effect::SeekToStart, Effect::PlayImmediately(self.speed)]
    }

    /// Store a new speed; applied to the engine only while playing.
    pub fn set_speed(&mut self, speed: f32) -> Vec<Effect> {
        self.speed = speed;
        if self.state == PlaybackState::Playing {
            vec![Effect::SetRate(speed)]
        } else {
            Vec::new()
        }
    }

    fn apply_time_control(
        &mut self,
        status: TimeControlStatus,
        snapshot: &EngineSnapshot,
        effects: &mut Vec<Effect>,
    ) {
        match status {
            TimeControlStatus::Playing => {
                if snapshot.is_advancing() {
                    self.enter_playing(effects);
                }
            }
            TimeControlStatus::Paused => {
                match self.policy.on_not_advancing(self.stall_context()) {
                    StallDecision::Ignore => {}
                    StallDecision::Resume => {
                        debug!(speed = self.speed, "Transient stall, resuming");
                        effects.push(Effect::PlayImmediately(self.speed));
                    }
                    StallDecision::CommitPaused => {
                        let paused = self.paused_snapshot(snapshot);
                        self.commit(paused, effects);
                    }
                }
            }
            TimeControlStatus::WaitingToPlayAtSpecifiedRate => {}
        }
    }

    /// Shared by the readiness and time-control paths.
    fn enter_playing(&mut self, effects: &mut Vec<Effect>) {
        self.loaded = true;
        if self.replay_in_flight {
            // Frames before the seek back to zero landed still belong to the
            // previous pass.
            if self.replay_seek_landed {
                self.finish_replay(effects);
            }
            return;
        }
        self.commit(PlaybackState::Playing, effects);
    }

    fn apply_end_of_media(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::EndOfMedia);
        self.commit(PlaybackState::Completed, effects);

        if !self.accountant.auto_replay_enabled() || self.reason.is_explicit_stop() {
            return;
        }

        self.replay_in_flight = true;
        self.replay_seek_landed = false;
        let replay_count = self.accountant.record_auto_replay();
        debug!(replay_count, "Auto replay");

        effects.push(Effect::ReplayStarted { replay_count });
        effects.push(Effect::SeekToStart);
        effects.push(Effect::PlayImmediately(self.speed));
    }

    fn finish_replay(&mut self, effects: &mut Vec<Effect>) {
        self.replay_in_flight = false;
        self.replay_seek_landed = false;
        self.loaded = true;
        self.commit(PlaybackState::Playing, effects);
    }

    fn evaluate_buffer_health(&mut self, snapshot: &EngineSnapshot, effects: &mut Vec<Effect>) {
        let metrics = self.metrics(snapshot);
        let ahead = metrics
            .current_buffer_duration
            .saturating_sub(metrics.current_duration);
        let healthy = metrics.buffer_progress >= self.preload_progress_threshold
            || ahead > self.preload_buffer_ahead;

        if self.buffer_healthy != Some(healthy) {
            self.buffer_healthy = Some(healthy);
            effects.push(Effect::BufferHealth(healthy));
        }
    }

    fn paused_snapshot(&self, snapshot: &EngineSnapshot) -> PlaybackState {
        let metrics = self.metrics(snapshot);
        PlaybackState::Paused {
            play_progress: metrics.play_progress,
            buffer_progress: metrics.buffer_progress,
        }
    }

    fn stall_context(&self) -> StallContext<'_> {
        StallContext {
            state: &self.state,
            reason: self.reason,
            replay_in_flight: self.replay_in_flight,
        }
    }

    fn commit(&mut self, next: PlaybackState, effects: &mut Vec<Effect>) {
        if self.state == next {
            return;
        }
        self.state = next.clone();
        effects.push(Effect::Commit(next));
    }
}
