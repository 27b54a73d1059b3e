//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - JSON, pretty-print and compact output formats
//! - Module-level filtering
//! - Locator redaction (signed URLs, local paths)
//! - Integration with host logging via `LoggerSink`
//!
//! ## Overview
//!
//! This module configures the `tracing-subscriber` infrastructure and mirrors
//! events into a host [`LoggerSink`] when one is configured. Every event that
//! survives filtering still flows through the standard fmt layer.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::logger::{ConsoleLogger, LogLevel};
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Pretty)
//!     .with_level(LogLevel::Debug)
//!     .with_logger_sink(Arc::new(ConsoleLogger::default()));
//!
//! init_logging(config)?;
//! tracing::info!("Player host started");
//! ```

use crate::error::Result;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::Error;

use bridge_traits::logger::{LogLevel, LoggerSink};

#[cfg(not(target_arch = "wasm32"))]
use std::io;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use tracing::Subscriber;
#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{
    filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, Layer,
};
use url::Url;

#[cfg(not(target_arch = "wasm32"))]
mod sink_layer;
#[cfg(not(target_arch = "wasm32"))]
use sink_layer::LoggerSinkLayer;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored; span enter/exit shown when spans are on.
    Pretty,
    /// One JSON object per event, fields flattened to the top level.
    Json,
    /// Single line per event.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// How [`init_logging`] sets up the global subscriber.
#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to the player crates when `filter` is unset.
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_playback=trace,core_runtime=info")
    pub filter: Option<String>,
    /// Host pipeline that receives a copy of every event.
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Record span enter/exit events
    pub enable_spans: bool,
    /// Print the event target (`core_playback::session`, ...).
    pub display_target: bool,
    /// Display thread info. Engine signals arrive on engine worker threads,
    /// so this is useful when chasing signal races.
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl std::fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("enable_spans", &self.enable_spans)
            .field("display_target", &self.display_target)
            .field("display_thread_info", &self.display_thread_info)
            .finish()
    }
}

impl LoggingConfig {
    /// Choose the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Level for `core_playback`, `core_runtime` and `bridge_traits`.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Replace the default directives with an `EnvFilter` string.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Mirror events into `sink`.
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Enable or disable span events
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Show or hide the event target.
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Show thread ids and names.
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Install the global subscriber: the env filter, one fmt layer in the
/// configured format and, when a sink is set, the host forwarding layer.
///
/// Call once at host startup.
///
/// # Errors
///
/// [`Error::Config`] if the filter string does not parse or a global
/// subscriber is already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config))
        .with(LoggerSinkLayer::new(config.logger_sink.clone()))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Browser hosts route `tracing` output through their own console bridge, so
/// nothing is installed on `wasm32`.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(_config: LoggingConfig) -> Result<()> {
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            // Everything outside the player crates stays at warn.
            format!(
                "warn,core_runtime={level},core_playback={level},bridge_traits={level}"
            )
        }
    };

    EnvFilter::try_new(directives).map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

#[cfg(not(target_arch = "wasm32"))]
fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => base.pretty().with_span_events(span_events).boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// Make a media locator safe to log.
///
/// Remote locators keep scheme, host, port and path. Credentials, query
/// strings and fragments are dropped because signed CDN URLs carry their
/// tokens there. File URLs and bare paths are reduced to the file name.
///
/// ```ignore
/// use core_runtime::logging::redact_locator;
///
/// info!(locator = %redact_locator(locator), "Loading media");
/// ```
pub fn redact_locator(locator: &str) -> String {
    let Ok(mut url) = Url::parse(locator) else {
        return strip_path(locator).to_string();
    };

    if url.scheme() == "file" {
        return strip_path(url.path()).to_string();
    }

    // Drive letters ("C:\...") parse as a one-letter scheme with no host.
    if url.host_str().is_none() {
        return strip_path(locator).to_string();
    }

    // Only fails for URLs without a host, handled above.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

/// Strip full file paths to basename only
///
/// ```ignore
/// use core_runtime::logging::strip_path;
///
/// assert_eq!(strip_path("/Users/john/Movies/clip.mp4"), "clip.mp4");
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}
