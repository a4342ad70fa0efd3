//! Process-wide "authentication rejected" signal.
//!
//! The API client raises it whenever an authenticated call comes back 401.
//! Listeners are held weakly so a dropped service unsubscribes itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub trait AuthRejectedListener: Send + Sync {
    fn on_auth_rejected(&self);
}

#[derive(Default)]
pub struct AuthSignal {
    listeners: Mutex<Vec<Weak<dyn AuthRejectedListener>>>,
    raised: AtomicU64,
}

impl AuthSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Weak<dyn AuthRejectedListener>) {
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// Delivers the signal to every live listener and returns how many were
    /// notified. The listener list is not locked while listeners run, so a
    /// listener may raise the signal again.
    pub fn raise(&self) -> usize {
        self.raised.fetch_add(1, Ordering::SeqCst);

        let live: Vec<Arc<dyn AuthRejectedListener>> = {
            let mut listeners = match self.listeners.lock() {
                Ok(listeners) => listeners,
                Err(poisoned) => poisoned.into_inner(),
            };
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        tracing::debug!(listeners = live.len(), "authentication rejected signal raised");

        for listener in &live {
            listener.on_auth_rejected();
        }
        live.len()
    }

    /// Total number of times the signal has been raised.
    pub fn raised_count(&self) -> u64 {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    impl AuthRejectedListener for Counter {
        fn on_auth_rejected(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Reraiser {
        signal: Arc<AuthSignal>,
        depth: AtomicUsize,
    }

    impl AuthRejectedListener for Reraiser {
        fn on_auth_rejected(&self) {
            if self.depth.fetch_add(1, Ordering::SeqCst) == 0 {
                self.signal.raise();
            }
        }
    }

    fn subscribe<L: AuthRejectedListener + 'static>(signal: &AuthSignal, listener: &Arc<L>) {
        let weak = Arc::downgrade(listener);
        signal.subscribe(weak);
    }

    #[test]
    fn test_raise_notifies_each_listener_once_per_raise() {
        let signal = AuthSignal::new();
        let counter = Arc::new(Counter::default());
        subscribe(&signal, &counter);

        assert_eq!(signal.raise(), 1);
        assert_eq!(signal.raise(), 1);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 2);
        assert_eq!(signal.raised_count(), 2);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let signal = AuthSignal::new();
        let counter = Arc::new(Counter::default());
        subscribe(&signal, &counter);
        drop(counter);

        assert_eq!(signal.raise(), 0);
    }

    #[test]
    fn test_reentrant_raise_does_not_deadlock() {
        let signal = Arc::new(AuthSignal::new());
        let listener = Arc::new(Reraiser {
            signal: signal.clone(),
            depth: AtomicUsize::new(0),
        });
        subscribe(&signal, &listener);

        signal.raise();
        assert_eq!(signal.raised_count(), 2);
        assert_eq!(listener.depth.load(Ordering::SeqCst), 2);
    }
}
