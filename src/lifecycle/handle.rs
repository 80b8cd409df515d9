//! Weak, atomically swappable reference to the live service instance.
//!
//! # Operations
//! ```text
//! publish     (supervisor, after constructing an instance)
//! invalidate  (supervisor, when the instance is destroyed)
//! try_stop    (signal bridge, any time)
//! ```
//!
//! The slot holds a `Weak<StopSignal>` whose only strong owner is the service
//! instance. Once the instance is dropped the weak pointer can no longer be
//! upgraded, so a late signal observes "absent" even if it raced with
//! `invalidate`. Loads and stores go through `arc_swap` and never take a lock.

use std::sync::{Arc, Weak};

use arc_swap::ArcSwapWeak;

use crate::lifecycle::shutdown::StopSignal;

pub struct ServiceHandle {
    current: ArcSwapWeak<StopSignal>,
}

impl ServiceHandle {
    /// Create an empty handle (nothing published).
    pub fn new() -> Self {
        Self {
            current: ArcSwapWeak::new(Weak::new()),
        }
    }

    /// Point the handle at a newly constructed instance.
    pub fn publish(&self, stop: &Arc<StopSignal>) {
        self.current.store(Arc::downgrade(stop));
    }

    /// Forget the current instance.
    pub fn invalidate(&self) {
        self.current.store(Weak::new());
    }

    /// Try to obtain the live instance's stop signal.
    pub fn resolve(&self) -> Option<Arc<StopSignal>> {
        self.current.load().upgrade()
    }

    pub fn is_live(&self) -> bool {
        self.resolve().is_some()
    }

    /// Request the live instance to stop, if there is one.
    ///
    /// Returns `false` when no instance is live. Never fails.
    pub fn try_stop(&self) -> bool {
        match self.resolve() {
            Some(stop) => {
                stop.request_stop();
                true
            }
            None => false,
        }
    }
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("live", &self.is_live())
            .finish()
    }
}
