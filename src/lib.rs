//! Workspace facade crate.
//!
//! Host applications can depend on `vpc-workspace` and enable the documented
//! features instead of wiring `bridge-traits`, `core-runtime` and
//! `core-playback` individually.

pub use bridge_traits as bridge;

#[cfg(feature = "runtime")]
pub use core_runtime as runtime;

#[cfg(feature = "playback")]
pub use core_playback as playback;
