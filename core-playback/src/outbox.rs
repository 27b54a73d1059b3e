//! Ordered delivery of host notifications.
//!
//! Notifications are pushed while the session lock is held, so queue order is
//! commit order. They are delivered by a single drainer with no lock held;
//! a host callback may call back into the controller, and anything it
//! triggers is queued behind the notification being delivered.

use crate::error::{PlaybackError, Result};
use crate::state::PlaybackState;
use bridge_traits::playback::DisplaySurface;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fires on every committed, non-duplicate state.
pub type StateCallback = Arc<dyn Fn(&PlaybackState) + Send + Sync>;
/// Fires when the item plays to its end, before `Completed` is reported.
pub type EndOfMediaCallback = Arc<dyn Fn() + Send + Sync>;
/// Fires when an automatic replay starts; receives the new replay count.
pub type ReplayCallback = Arc<dyn Fn(u32) + Send + Sync>;
/// Fires when buffer health flips.
pub type BufferHealthCallback = Arc<dyn Fn(bool) + Send + Sync>;
/// One-shot seek result.
pub type SeekCallback = Box<dyn FnOnce(Result<()>) + Send>;

pub(crate) enum Notification {
    State(PlaybackState),
    EndOfMedia,
    ReplayStarted(u32),
    BufferHealth(bool),
    SeekFinished {
        generation: u64,
        target: Duration,
        landed: bool,
        completion: SeekCallback,
    },
}

#[derive(Default)]
struct HostCallbacks {
    state: Mutex<Option<StateCallback>>,
    end_of_media: Mutex<Option<EndOfMediaCallback>>,
    replay: Mutex<Option<ReplayCallback>>,
    buffer_health: Mutex<Option<BufferHealthCallback>>,
}

pub(crate) struct Outbox {
    queue: Mutex<VecDeque<Notification>>,
    draining: AtomicBool,
    callbacks: HostCallbacks,
    surface: Arc<dyn DisplaySurface>,
}

impl Outbox {
    pub fn new(surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            callbacks: HostCallbacks::default(),
            surface,
        }
    }

    pub fn surface(&self) -> &Arc<dyn DisplaySurface> {
        &self.surface
    }

    pub fn push(&self, notification: Notification) {
        self.queue.lock().push_back(notification);
    }

    pub fn set_state_callback(&self, callback: StateCallback) {
        *self.callbacks.state.lock() = Some(callback);
    }

    pub fn set_end_of_media_callback(&self, callback: EndOfMediaCallback) {
        *self.callbacks.end_of_media.lock() = Some(callback);
    }

    pub fn set_replay_callback(&self, callback: ReplayCallback) {
        *self.callbacks.replay.lock() = Some(callback);
    }

    pub fn set_buffer_health_callback(&self, callback: BufferHealthCallback) {
        *self.callbacks.buffer_health.lock() = Some(callback);
    }

    /// Deliver queued notifications unless another caller already is.
    ///
    /// Seek results from a generation other than `live_generation` are
    /// dropped; their completion never runs.
    pub fn drain(&self, live_generation: &AtomicU64) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                return;
            }

            {
                let _guard = DrainGuard(&self.draining);
                loop {
                    // Pop into a local so the queue lock is released before delivery.
                    let next = self.queue.lock().pop_front();
                    let Some(notification) = next else {
                        break;
                    };
                    self.deliver(notification, live_generation.load(Ordering::Acquire));
                }
            }

            // Something pushed between the last pop and releasing the flag.
            if self.queue.lock().is_empty() {
                return;
            }
        }
    }

    /// Discard everything queued without delivering it.
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    fn deliver(&self, notification: Notification, live_generation: u64) {
        match notification {
            Notification::State(state) => {
                self.surface.set_visible(state.is_visible());
                let callback = self.callbacks.state.lock().clone();
                if let Some(callback) = callback {
                    callback(&state);
                }
            }
            Notification::EndOfMedia => {
                let callback = self.callbacks.end_of_media.lock().clone();
                if let Some(callback) = callback {
                    callback();
                }
            }
            Notification::ReplayStarted(count) => {
                let callback = self.callbacks.replay.lock().clone();
                if let Some(callback) = callback {
                    callback(count);
                }
            }
            Notification::BufferHealth(healthy) => {
                let callback = self.callbacks.buffer_health.lock().clone();
                if let Some(callback) = callback {
                    callback(healthy);
                }
            }
            Notification::SeekFinished {
                generation,
                target,
                landed,
                completion,
            } => {
                if generation != live_generation {
                    return;
                }
                if landed {
                    completion(Ok(()));
                } else {
                    completion(Err(PlaybackError::SeekFailed { target }));
                }
            }
        }
    }
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
