//! Live engine subscriptions bound to exactly one session.
//!
//! An [`ObserverSet`] is created right after the item is attached and before
//! playback is requested. It is invalidated as a whole: every signal
//! subscription and every periodic time observer goes at once, before the
//! engine is released. Handlers that are already running when that happens
//! still carry their session generation and are rejected by the session.

use bridge_traits::playback::{MediaEngine, SignalKind, SubscriptionId};
use bridge_traits::{SignalHandler, TimeObserver};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

pub struct ObserverSet {
    engine: Arc<dyn MediaEngine>,
    generation: u64,
    signals: Vec<SubscriptionId>,
    time_observers: Vec<SubscriptionId>,
}

impl ObserverSet {
    /// Subscribe to every [`SignalKind`] on `engine`.
    pub fn subscribe_all<F>(engine: Arc<dyn MediaEngine>, generation: u64, mut handler_for: F) -> Self
    where
        F: FnMut(SignalKind) -> SignalHandler,
    {
        let signals = SignalKind::ALL
            .iter()
            .map(|kind| engine.subscribe(*kind, handler_for(*kind)))
            .collect();

        trace!(generation, "Observer set subscribed");

        Self {
            engine,
            generation,
            signals,
            time_observers: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.signals.len() + self.time_observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_time_observer(&mut self, interval: Duration, observer: TimeObserver) -> SubscriptionId {
        let id = self.engine.add_periodic_time_observer(interval, observer);
        self.time_observers.push(id);
        id
    }

    /// Returns `false` if `id` is not one of this set's time observers.
    pub fn remove_time_observer(&mut self, id: SubscriptionId) -> bool {
        let Some(index) = self.time_observers.iter().position(|tracked| *tracked == id) else {
            return false;
        };
        self.time_observers.swap_remove(index);
        self.engine.remove_time_observer(id);
        true
    }

    /// Drop every subscription of this set.
    pub fn invalidate(mut self) {
        self.release();
        trace!(generation = self.generation, "Observer set invalidated");
    }

    fn release(&mut self) {
        for id in self.signals.drain(..) {
            self.engine.unsubscribe(id);
        }
        for id in self.time_observers.drain(..) {
            self.engine.remove_time_observer(id);
        }
    }
}

impl Drop for ObserverSet {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("generation", &self.generation)
            .field("signals", &self.signals)
            .field("time_observers", &self.time_observers)
            .finish()
    }
}
