//! Platform-specific helper abstractions used to keep trait bounds aligned with
//! the threading guarantees of each target.
//!
//! Native media engines deliver signals from arbitrary worker threads, so
//! bridge implementations and the callbacks handed to them must be
//! `Send + Sync`. WebAssembly builds run entirely on one thread and cannot
//! satisfy those bounds because browser-provided objects (e.g. an
//! `HtmlMediaElement`) are not thread-safe. The helpers below make the bounds
//! conditional without duplicating every trait definition.

use std::sync::Arc;
use std::time::Duration;

/// Marker trait that applies `Send + Sync` on native targets while becoming a
/// no-op on `wasm32`.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T> PlatformSendSync for T where T: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait PlatformSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T> PlatformSendSync for T {}

/// Callback invoked by an engine each time an observed value changes.
#[cfg(not(target_arch = "wasm32"))]
pub type SignalHandler = Arc<dyn Fn(crate::playback::EngineSignal) + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type SignalHandler = Arc<dyn Fn(crate::playback::EngineSignal)>;

/// One-shot seek completion; receives `true` when the seek landed.
#[cfg(not(target_arch = "wasm32"))]
pub type SeekCompletion = Box<dyn FnOnce(bool) + Send>;

#[cfg(target_arch = "wasm32")]
pub type SeekCompletion = Box<dyn FnOnce(bool)>;

/// Periodic time observer; receives the current playback position.
#[cfg(not(target_arch = "wasm32"))]
pub type TimeObserver = Arc<dyn Fn(Duration) + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type TimeObserver = Arc<dyn Fn(Duration)>;
