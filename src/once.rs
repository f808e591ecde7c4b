//! At-most-once callback guard
//!
//! Several paths may race to finish the same operation (a slot released by
//! an explicit `complete()` and again by `Drop`, a result delivered by the
//! normal path and again by an abort path). Wrapping the finishing callback
//! in [`Once`] makes every attempt after the first a silent no-op.

use parking_lot::Mutex;
use std::fmt;

/// Wraps a callback so it fires at most once
pub struct Once<F> {
    slot: Mutex<Option<F>>,
}

impl<F> Once<F> {
    /// Wrap `callback`
    pub fn new(callback: F) -> Self {
        Self {
            slot: Mutex::new(Some(callback)),
        }
    }

    /// Forward `arg` to the callback if it has not fired yet
    ///
    /// Returns `true` when this invocation reached the callback.
    pub fn call<A>(&self, arg: A) -> bool
    where
        F: FnOnce(A),
    {
        // Take under the lock, invoke outside it: the callback may re-enter.
        let callback = self.slot.lock().take();
        match callback {
            Some(callback) => {
                callback(arg);
                true
            }
            None => false,
        }
    }

    /// Whether the callback has already fired
    pub fn is_spent(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<F> fmt::Debug for Once<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Once")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Shorthand for [`Once::new`]
pub fn once<F>(callback: F) -> Once<F> {
    Once::new(callback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_only_first_call_forwards() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let guard = once(move |value: u32| sink.lock().push(value));

        assert!(!guard.is_spent());
        assert!(guard.call(1));
        assert!(guard.is_spent());

        for value in 2..10 {
            assert!(!guard.call(value));
        }

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_racing_callers_fire_once() {
        let hits = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&hits);
        let guard = Arc::new(once(move |()| *counter.lock() += 1));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.call(()))
            })
            .collect();

        let forwarded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&fired| fired)
            .count();

        assert_eq!(forwarded, 1);
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_reentrant_call_is_noop() {
        let guard: Arc<Mutex<Option<Arc<Once<Box<dyn FnOnce(()) + Send>>>>>> =
            Arc::new(Mutex::new(None));
        let inner = Arc::clone(&guard);
        let nested = Arc::new(Mutex::new(None));
        let nested_result = Arc::clone(&nested);

        let once_guard: Arc<Once<Box<dyn FnOnce(()) + Send>>> =
            Arc::new(Once::new(Box::new(move |()| {
                let me = inner.lock().clone();
                if let Some(me) = me {
                    *nested_result.lock() = Some(me.call(()));
                }
            })));
        *guard.lock() = Some(Arc::clone(&once_guard));

        assert!(once_guard.call(()));
        assert_eq!(*nested.lock(), Some(false));
    }
}
