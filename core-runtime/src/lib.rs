//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the video playback core:
//! - Logging and tracing infrastructure
//! - Configuration management (injected host bridges)
//! - Runtime error types
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that `core-playback` depends on.
//! It establishes the logging conventions (including locator redaction) and
//! the fail-fast bridge configuration used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
