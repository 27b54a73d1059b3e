//! # Playback Error Types
//!
//! Error types for the playback coordinator and its host API.

use bridge_traits::playback::EngineFailure;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Host API Misuse
    // ========================================================================
    /// Locator is empty or cannot be interpreted as a media location.
    #[error("Invalid media locator: {0}")]
    InvalidLocator(String),

    /// Playback speed outside `(0.0, 4.0]`.
    #[error("Invalid playback speed: {0} (must be > 0.0 and <= 4.0)")]
    InvalidSpeed(f32),

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f64),

    /// Seek fraction outside `[0.0, 1.0]`.
    #[error("Invalid progress: {0} (must be between 0.0 and 1.0)")]
    InvalidProgress(f64),

    /// Requested audio track does not exist on the current item.
    #[error("Audio track {index} out of range ({available} available)")]
    AudioTrackOutOfRange { index: usize, available: usize },

    /// Attempted operation when no session is loaded.
    #[error("No media loaded")]
    NoSessionLoaded,

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Engine or item could not be constructed. Reported through the item
    /// status, never returned from `load`.
    #[error("Media construction failed: {0}")]
    ConstructionFailure(EngineFailure),

    /// Item failed to decode. Terminal for the session.
    #[error("Media decode failed: {0}")]
    DecodeFailure(EngineFailure),

    /// Seek was interrupted or rejected by the engine.
    #[error("Seek to {target:?} failed")]
    SeekFailed { target: Duration },

    /// Session was torn down before the seek completed.
    #[error("Seek cancelled")]
    SeekCancelled,

    /// Another load or a teardown started while this load was closing the
    /// previous session; the newer request wins.
    #[error("Load superseded by a newer request")]
    LoadSuperseded,

    // ========================================================================
    // Internal
    // ========================================================================
    /// A signal belonging to a superseded session was dropped. Logged only.
    #[error("Stale signal from generation {signal_generation} (live generation {live_generation})")]
    StaleSignal {
        signal_generation: u64,
        live_generation: u64,
    },

    /// Playback configuration rejected by validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EngineFailure> for PlaybackError {
    fn from(failure: EngineFailure) -> Self {
        match failure.kind {
            bridge_traits::FailureKind::Construction => PlaybackError::ConstructionFailure(failure),
            bridge_traits::FailureKind::Decode => PlaybackError::DecodeFailure(failure),
        }
    }
}

impl PlaybackError {
    /// Returns `true` if this error ends the session it occurred in.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlaybackError::ConstructionFailure(_) | PlaybackError::DecodeFailure(_)
        )
    }

    /// Returns `true` if this error reaches the host as a `PlaybackState`
    /// rather than through a return value or completion.
    pub fn is_surfaced_as_state(&self) -> bool {
        self.is_terminal()
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_maps_to_taxonomy() {
        let decode: PlaybackError = EngineFailure::decode(-11828, "Cannot Open").into();
        assert!(matches!(decode, PlaybackError::DecodeFailure(_)));
        assert!(decode.is_terminal());
        assert!(decode.is_surfaced_as_state());

        let construction: PlaybackError = EngineFailure::construction(1, "no engine").into();
        assert!(matches!(construction, PlaybackError::ConstructionFailure(_)));
    }

    #[test]
    fn non_terminal_errors() {
        let seek = PlaybackError::SeekFailed {
            target: Duration::from_secs(5),
        };
        assert!(!seek.is_terminal());
        assert!(!PlaybackError::SeekCancelled.is_surfaced_as_state());
        assert!(!PlaybackError::StaleSignal {
            signal_generation: 1,
            live_generation: 2
        }
        .is_surfaced_as_state());
    }

    #[test]
    fn superseded_load_is_not_terminal() {
        assert!(!PlaybackError::LoadSuperseded.is_terminal());
        assert_eq!(
            PlaybackError::LoadSuperseded.to_string(),
            "Load superseded by a newer request"
        );
    }
}
