//! # Playback Configuration
//!
//! Configuration types for the playback coordinator.

use crate::error::{PlaybackError, Result};
use bridge_traits::playback::EngineOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Highest playback speed accepted by the coordinator.
pub const MAX_SPEED: f32 = 4.0;

/// Playback coordinator configuration.
///
/// Controls the initial speed, automatic replay and the buffer-health
/// thresholds reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Rate used for every playback request until the host changes it.
    ///
    /// Default: 1.0.
    #[serde(default = "default_speed")]
    pub default_speed: f32,

    /// Restart from the beginning when the item reaches its end.
    ///
    /// Default: false.
    #[serde(default)]
    pub auto_replay: bool,

    /// Passed to the engine. The coordinator recovers stalls itself, so
    /// letting the engine also delay starts only adds latency.
    ///
    /// Default: false.
    #[serde(default)]
    pub automatically_waits_to_minimize_stalling: bool,

    /// Let live streams keep fetching while paused.
    ///
    /// Default: true.
    #[serde(default = "default_use_network_while_paused")]
    pub use_network_while_paused: bool,

    /// Buffered media ahead of the playhead that counts as healthy.
    ///
    /// Default: 3 seconds.
    #[serde(default = "default_preload_buffer_ahead")]
    pub preload_buffer_ahead: Duration,

    /// Buffer progress (fraction, 0.0-1.0) that counts as healthy regardless
    /// of the playhead.
    ///
    /// Default: 0.99.
    #[serde(default = "default_preload_progress_threshold")]
    pub preload_progress_threshold: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed: default_speed(),
            auto_replay: false,
            automatically_waits_to_minimize_stalling: false,
            use_network_while_paused: default_use_network_while_paused(),
            preload_buffer_ahead: default_preload_buffer_ahead(),
            preload_progress_threshold: default_preload_progress_threshold(),
        }
    }
}

impl PlaybackConfig {
    /// Configuration for feed-style players that loop the current video.
    pub fn looping() -> Self {
        Self {
            auto_replay: true,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !is_valid_speed(self.default_speed) {
            return Err(format!(
                "default_speed must be > 0.0 and <= {}, got {}",
                MAX_SPEED, self.default_speed
            ));
        }

        if !(0.0..=1.0).contains(&self.preload_progress_threshold) {
            return Err("preload_progress_threshold must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            automatically_waits_to_minimize_stalling: self.automatically_waits_to_minimize_stalling,
        }
    }

    pub(crate) fn validated(self) -> Result<Self> {
        self.validate().map_err(PlaybackError::Config)?;
        Ok(self)
    }
}

pub(crate) fn is_valid_speed(speed: f32) -> bool {
    speed > 0.0 && speed <= MAX_SPEED
}

fn default_speed() -> f32 {
    1.0
}

fn default_use_network_while_paused() -> bool {
    true
}

fn default_preload_buffer_ahead() -> Duration {
    Duration::from_secs(3)
}

fn default_preload_progress_threshold() -> f64 {
    0.99
}

/// Common speed presets offered by transport UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    Slow075,
    Normal,
    Fast125,
    Fast150,
    Fast200,
}

impl PlaybackSpeed {
    pub fn rate(&self) -> f32 {
        match self {
            PlaybackSpeed::Slow075 => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Fast125 => 1.25,
            PlaybackSpeed::Fast150 => 1.5,
            PlaybackSpeed::Fast200 => 2.0,
        }
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        PlaybackSpeed::Normal
    }
}
