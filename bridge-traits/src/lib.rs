//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform it runs on. The core derives playback state; the host owns the
//! actual media stack.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaEngine`](playback::MediaEngine) - Native playback engine driven by the core
//! - [`MediaEngineProvider`](playback::MediaEngineProvider) - Creates one engine per session
//! - [`DisplaySurface`](playback::DisplaySurface) - Composited layer presenting frames
//!
//! ### Utilities
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Thread Safety
//!
//! Engines deliver signals from their own worker threads. On native targets
//! every bridge trait therefore requires `Send + Sync` through
//! [`PlatformSendSync`](platform::PlatformSendSync); on `wasm32` the bound is
//! dropped.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::playback::{EngineOptions, MediaEngine, MediaEngineProvider};
//! use std::sync::Arc;
//!
//! struct AvFoundationProvider;
//!
//! impl MediaEngineProvider for AvFoundationProvider {
//!     fn create_engine(&self, options: EngineOptions) -> Arc<dyn MediaEngine> {
//!         Arc::new(AvPlayerEngine::new(options))
//!     }
//! }
//! ```

pub mod error;
pub mod logger;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use platform::{PlatformSendSync, SeekCompletion, SignalHandler, TimeObserver};
pub use playback::{
    DisplaySurface, EngineFailure, EngineOptions, EngineSignal, EngineSnapshot, FailureKind,
    HeadlessSurface, ItemStatus, MediaEngine, MediaEngineProvider, MediaItem, SeekTolerance,
    SignalKind, SubscriptionId, TimeControlStatus,
};
