//! # Core Configuration Module
//!
//! Provides configuration management for the video playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges the playback core drives. It enforces
//! fail-fast validation so a missing bridge is reported at startup rather than
//! on the first `load`.
//!
//! ## Required Dependencies
//!
//! - `MediaEngineProvider` - Creates one media engine per playback session
//!
//! ## Optional Dependencies
//!
//! - `DisplaySurface` - Presents frames (defaults to [`HeadlessSurface`])
//! - `LoggerSink` - Receives structured logs forwarded by the tracing layer
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine_provider(Arc::new(AvFoundationProvider))
//!     .display_surface(Arc::new(PlayerLayerSurface::new(layer)))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder returns [`Error::CapabilityMissing`] with an actionable message
//! when the engine provider was not injected:
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let err = CoreConfig::builder().build().unwrap_err();
//! assert!(err.to_string().contains("MediaEngineProvider"));
//! ```

use crate::error::{Error, Result};
use bridge_traits::{DisplaySurface, HeadlessSurface, LoggerSink, MediaEngineProvider};
use std::sync::Arc;

/// Core configuration for the video playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Factory for per-session media engines (required)
    pub engine_provider: Arc<dyn MediaEngineProvider>,

    /// Surface bound to the live engine
    pub display_surface: Arc<dyn DisplaySurface>,

    /// Host log sink (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine_provider", &"MediaEngineProvider { ... }")
            .field("display_surface", &"DisplaySurface { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// Every field is required by the builder or has a default, so this
    /// currently only reports the optional bridges.
    pub fn validate(&self) -> Result<()> {
        if let Some(sink) = &self.logger_sink {
            tracing::debug!(min_level = ?sink.min_level(), "Logger sink configured");
        }

        Ok(())
    }
}

fn engine_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaEngineProvider".to_string(),
        message: "MediaEngineProvider implementation is required to create playback engines. \
                 Apple: wrap AVPlayer. \
                 Android: wrap ExoPlayer/Media3. \
                 Web: wrap an HTMLVideoElement. \
                 Tests: inject a fake engine provider."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) once all bridges are set.
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine_provider: Option<Arc<dyn MediaEngineProvider>>,
    display_surface: Option<Arc<dyn DisplaySurface>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreConfigBuilder {
    /// Sets the media engine provider (required).
    ///
    /// The provider is asked for a fresh engine each time a new locator is
    /// loaded; engines are never reused across sessions.
    pub fn engine_provider(mut self, provider: Arc<dyn MediaEngineProvider>) -> Self {
        self.engine_provider = Some(provider);
        self
    }

    /// Sets the display surface (optional).
    ///
    /// Without one, a [`HeadlessSurface`] is used and frames are not shown.
    pub fn display_surface(mut self, surface: Arc<dyn DisplaySurface>) -> Self {
        self.display_surface = Some(surface);
        self
    }

    /// Sets the logger sink for host log forwarding (optional).
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] if no engine provider was set.
    pub fn build(self) -> Result<CoreConfig> {
        let engine_provider = self
            .engine_provider
            .ok_or_else(engine_provider_missing_error)?;

        let display_surface = self
            .display_surface
            .unwrap_or_else(|| Arc::new(HeadlessSurface));

        let config = CoreConfig {
            engine_provider,
            display_surface,
            logger_sink: self.logger_sink,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        EngineOptions, EngineSnapshot, LogEntry, MediaEngine, MediaItem, SeekCompletion,
        SeekTolerance, SignalHandler, SignalKind, SubscriptionId, TimeObserver,
    };
    use std::time::Duration;

    struct NullEngine;

    impl MediaEngine for NullEngine {
        fn attach(&self, _item: MediaItem) {}
        fn play_immediately(&self, _rate: f32) {}
        fn pause(&self) {}
        fn seek(&self, _to: Duration, _tolerance: Option<SeekTolerance>, _done: SeekCompletion) {}
        fn cancel_pending_seeks(&self) {}
        fn cancel_loading(&self) {}
        fn set_rate(&self, _rate: f32) {}
        fn set_muted(&self, _muted: bool) {}
        fn is_muted(&self) -> bool {
            false
        }
        fn set_volume(&self, _volume: f64) {}
        fn volume(&self) -> f64 {
            1.0
        }
        fn audio_track_count(&self) -> usize {
            0
        }
        fn select_audio_track(&self, _index: usize) {}
        fn snapshot(&self) -> EngineSnapshot {
            EngineSnapshot::default()
        }
        fn subscribe(&self, _kind: SignalKind, _handler: SignalHandler) -> SubscriptionId {
            SubscriptionId::new(0)
        }
        fn unsubscribe(&self, _id: SubscriptionId) {}
        fn add_periodic_time_observer(
            &self,
            _interval: Duration,
            _observer: TimeObserver,
        ) -> SubscriptionId {
            SubscriptionId::new(0)
        }
        fn remove_time_observer(&self, _id: SubscriptionId) {}
    }

    struct NullProvider;

    impl MediaEngineProvider for NullProvider {
        fn create_engine(&self, _options: EngineOptions) -> Arc<dyn MediaEngine> {
            Arc::new(NullEngine)
        }
    }

    struct MockLoggerSink;

    #[async_trait]
    impl LoggerSink for MockLoggerSink {
        async fn log(&self, _entry: LogEntry) -> BridgeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_builder_requires_engine_provider() {
        let result = CoreConfig::builder().build();

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { .. }));
        let err_msg = err.to_string();
        assert!(err_msg.contains("MediaEngineProvider"));
        assert!(err_msg.contains("create playback engines"));
    }

    #[test]
    fn test_builder_defaults_optional_bridges() {
        let config = CoreConfig::builder()
            .engine_provider(Arc::new(NullProvider))
            .build()
            .unwrap();

        assert!(config.logger_sink.is_none());
        // Headless surface accepts calls without an engine bound.
        config.display_surface.bind_engine(None);
        config.display_surface.set_visible(true);
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = CoreConfig::builder()
            .engine_provider(Arc::new(NullProvider))
            .display_surface(Arc::new(HeadlessSurface))
            .logger_sink(Arc::new(MockLoggerSink))
            .build()
            .unwrap();

        assert!(config.logger_sink.is_some());
        let engine = config.engine_provider.create_engine(EngineOptions::default());
        assert_eq!(engine.volume(), 1.0);
    }

    #[test]
    fn test_config_debug_hides_bridges() {
        let config = CoreConfig::builder()
            .engine_provider(Arc::new(NullProvider))
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("MediaEngineProvider { ... }"));
        assert!(debug.contains("logger_sink: None"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = CoreConfig::builder()
            .engine_provider(Arc::new(NullProvider))
            .build()
            .unwrap();

        let cloned = config.clone();
        assert!(Arc::ptr_eq(&cloned.engine_provider, &config.engine_provider));
    }
}
