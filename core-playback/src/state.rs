//! Externally observed playback state and the values read alongside it.

use bridge_traits::playback::EngineFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Single externally observed status of a session.
///
/// `Paused` carries the progress snapshot taken when the transition was
/// committed; it is never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackState {
    #[default]
    None,
    Loading,
    Playing,
    Paused {
        play_progress: f64,
        buffer_progress: f64,
    },
    Completed,
    Failed {
        error: EngineFailure,
    },
}

impl PlaybackState {
    /// Whether the display surface should be shown in this state.
    pub fn is_visible(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed { .. })
    }

    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::None => "none",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused { .. } => "paused",
            PlaybackState::Completed => "completed",
            PlaybackState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Paused {
                play_progress,
                buffer_progress,
            } => write!(
                f,
                "paused (play {:.3}, buffer {:.3})",
                play_progress, buffer_progress
            ),
            PlaybackState::Failed { error } => write!(f, "failed: {}", error),
            other => f.write_str(other.name()),
        }
    }
}

/// Why playback is not advancing. Drives automatic recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PausedReason {
    /// The hosting view went off screen.
    Hidden,
    /// The user asked to pause.
    UserRequested,
    /// Engine-initiated; playback resumes on its own.
    #[default]
    WaitingForBuffer,
}

impl PausedReason {
    /// Pauses for this reason are user visible and never auto-resumed.
    pub fn is_explicit_stop(&self) -> bool {
        !matches!(self, PausedReason::WaitingForBuffer)
    }
}

/// Identifier of one load of one locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
