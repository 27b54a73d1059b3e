//! Logging Abstractions
//!
//! Provides the log sink the host injects to receive structured log entries
//! emitted by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{error::Result, platform::PlatformSendSync};

/// Severity of a [`LogEntry`], ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `tracing` event as handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Time the entry was built, not when the host receives it.
    pub timestamp: DateTime<Utc>,
    /// Event target, e.g. `core_playback::session`.
    pub target: String,
    pub message: String,
    /// Event fields rendered with `Display`/`Debug`; `message` excluded.
    pub fields: HashMap<String, String>,
    /// Name of the span the event was recorded in
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Host destination for log entries.
///
/// Typical implementations:
/// - **iOS / macOS**: OSLog
/// - **Android**: Logcat
/// - **Desktop**: stderr or a rotating file
/// - **Web**: Console API
///
/// Media locators can embed signed query parameters. The core only logs
/// redacted locators, but sinks that persist logs should still treat the
/// `locator` field as sensitive.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::logger::{LoggerSink, LogEntry, LogLevel};
///
/// async fn log_error(logger: &dyn LoggerSink, error: &str) {
///     let entry = LogEntry::new(LogLevel::Error, "core_playback", error)
///         .with_field("component", "session");
///     logger.log(entry).await.ok();
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait LoggerSink: PlatformSendSync {
    /// Deliver one entry. May be called from engine worker threads.
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Write out anything the sink buffers.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are never built.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Development sink writing one line per entry to stderr.
///
/// Fields are printed sorted by key so repeated runs diff cleanly.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    /// `<time> <LEVEL> <target>: <message> key=value ...`
    pub fn render(entry: &LogEntry) -> String {
        let mut line = format!(
            "{} {:>5} {}: {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.level.as_str().to_uppercase(),
            entry.target,
            entry.message
        );

        let mut keys: Vec<&String> = entry.fields.keys().collect();
        keys.sort();
        for key in keys {
            line.push_str(&format!(" {}={}", key, entry.fields[key]));
        }
        if let Some(span) = &entry.span_id {
            line.push_str(&format!(" span={}", span));
        }
        line
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            eprintln!("{}", Self::render(&entry));
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "core_playback", "State committed")
            .with_field("state", "playing")
            .with_span_id("load");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "core_playback");
        assert_eq!(entry.message, "State committed");
        assert_eq!(entry.fields.get("state"), Some(&"playing".to_string()));
        assert_eq!(entry.span_id, Some("load".to_string()));
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(ConsoleLogger::default().min_level(), LogLevel::Info);
    }

    #[test]
    fn test_console_render_sorts_fields() {
        let entry = LogEntry::new(LogLevel::Warn, "core_playback", "Seek failed")
            .with_field("target_ms", "3000")
            .with_field("generation", "2")
            .with_span_id("seek");

        let line = ConsoleLogger::render(&entry);
        assert!(line.ends_with(" WARN core_playback: Seek failed generation=2 target_ms=3000 span=seek"));
    }

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[tokio::test]
    async fn test_console_logger() {
        let logger = ConsoleLogger::new(LogLevel::Warn);
        let entry = LogEntry::new(LogLevel::Info, "core_playback", "below threshold");

        logger.log(entry).await.unwrap();
        logger.flush().await.unwrap();
    }
}
