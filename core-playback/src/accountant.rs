//! # Replay & Watch-Time Accounting
//!
//! Replay counters and the derived progress figures the host reads on
//! demand. Nothing here is stored between reads; every figure is computed
//! from one [`EngineSnapshot`].

use bridge_traits::playback::EngineSnapshot;
use std::time::Duration;

/// Counts replays of the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayAccountant {
    replay_count: u32,
    auto_replay_enabled: bool,
}

impl ReplayAccountant {
    pub fn new(auto_replay_enabled: bool) -> Self {
        Self {
            replay_count: 0,
            auto_replay_enabled,
        }
    }

    pub fn replay_count(&self) -> u32 {
        self.replay_count
    }

    pub fn auto_replay_enabled(&self) -> bool {
        self.auto_replay_enabled
    }

    pub fn set_auto_replay(&mut self, enabled: bool) {
        self.auto_replay_enabled = enabled;
    }

    /// Record one automatic replay.
    pub fn record_auto_replay(&mut self) -> u32 {
        self.replay_count = self.replay_count.saturating_add(1);
        self.replay_count
    }

    /// Record a host-requested replay, optionally resetting the count.
    pub fn record_manual_replay(&mut self, reset_count: bool) -> u32 {
        self.replay_count = if reset_count {
            0
        } else {
            self.replay_count.saturating_add(1)
        };
        self.replay_count
    }

    /// Forget all replays; used when a new session starts.
    pub fn reset(&mut self) {
        self.replay_count = 0;
    }

    /// `min(position, total) + replay_count * total`.
    ///
    /// The position is clamped so a final tick arriving after completion
    /// does not overshoot.
    pub fn cumulative_watch_duration(&self, position: Duration, total: Duration) -> Duration {
        position.min(total) + total.saturating_mul(self.replay_count)
    }
}

/// Derived figures exposed to the host.
///
/// All values are zero until the session's item has been observed playing
/// (or was ready when the session started).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackMetrics {
    pub play_progress: f64,
    pub buffer_progress: f64,
    pub current_duration: Duration,
    pub current_buffer_duration: Duration,
    pub total_duration: Duration,
    pub cumulative_watch_duration: Duration,
}

impl PlaybackMetrics {
    pub fn compute(snapshot: &EngineSnapshot, loaded: bool, accountant: &ReplayAccountant) -> Self {
        if !loaded {
            return Self::default();
        }

        let total = snapshot.duration;
        Self {
            play_progress: fraction(snapshot.position, total),
            buffer_progress: fraction(snapshot.buffered, total),
            current_duration: snapshot.position.min(total),
            current_buffer_duration: snapshot.buffered,
            total_duration: total,
            cumulative_watch_duration: accountant
                .cumulative_watch_duration(snapshot.position, total),
        }
    }
}

/// `clamp(part / total, 0, 1)`, zero while the total is unknown.
pub fn fraction(part: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (part.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}
