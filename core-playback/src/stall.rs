//! Stall recovery decisions.
//!
//! A pure table over (signal, paused reason). Engine-initiated stalls are
//! turned into an immediate resume instead of a user-visible pause; explicit
//! stops (user or hidden view) are reported and left alone.

use crate::state::{PausedReason, PlaybackState};

/// What to do about a non-advancing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallDecision {
    /// Nothing to commit, nothing to request.
    Ignore,
    /// Re-request playback at the last configured speed.
    Resume,
    /// Commit `Paused` with a fresh progress snapshot.
    CommitPaused,
}

/// Inputs the policy reads. Copied out of the session under its lock.
#[derive(Debug, Clone, Copy)]
pub struct StallContext<'a> {
    pub state: &'a PlaybackState,
    pub reason: PausedReason,
    pub replay_in_flight: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StallRecoveryPolicy;

impl StallRecoveryPolicy {
    /// Time control reported "not advancing".
    pub fn on_not_advancing(&self, ctx: StallContext<'_>) -> StallDecision {
        // The seek back to zero during a replay produces a zero-rate tick.
        if ctx.replay_in_flight {
            return StallDecision::Ignore;
        }

        match ctx.state {
            PlaybackState::Completed | PlaybackState::Failed { .. } => StallDecision::Ignore,
            _ if ctx.reason == PausedReason::WaitingForBuffer => StallDecision::Resume,
            _ => StallDecision::CommitPaused,
        }
    }

    /// The "likely to keep up" estimate changed.
    pub fn on_keep_up_likely(&self, likely: bool, rate: f32, ctx: StallContext<'_>) -> StallDecision {
        let recoverable = !matches!(
            ctx.state,
            PlaybackState::Completed | PlaybackState::Failed { .. }
        );

        if likely && rate == 0.0 && ctx.reason == PausedReason::WaitingForBuffer && recoverable {
            StallDecision::Resume
        } else {
            StallDecision::Ignore
        }
    }
}
