//! # Playback Coordinator
//!
//! Derives one consistent playback state from the signals of a host media
//! engine.
//!
//! ## Overview
//!
//! This crate handles:
//! - Reconciling readiness, buffering, time-control, failure and keep-up
//!   signals into a single [`PlaybackState`]
//! - Session replacement with atomic invalidation of engine subscriptions
//! - Silent recovery from transient stalls
//! - Replay counting and cumulative watch time
//!
//! The media engine and display surface are host bridges defined in
//! `bridge-traits`; hosts interact through [`PlayerController`].

pub mod accountant;
pub mod config;
pub mod controller;
pub mod error;
pub mod machine;
pub mod observer;
mod outbox;
pub mod session;
pub mod stall;
pub mod state;

pub use accountant::{PlaybackMetrics, ReplayAccountant};
pub use config::{PlaybackConfig, PlaybackSpeed};
pub use controller::PlayerController;
pub use error::{PlaybackError, Result};
pub use machine::{Effect, StateMachine};
pub use observer::ObserverSet;
pub use session::{Session, TimeObserverToken};
pub use stall::{StallDecision, StallRecoveryPolicy};
pub use state::{PausedReason, PlaybackState, SessionId};
