//! Stop coordination for one service instance.

use std::future::Future;

use tokio::sync::watch;

/// Stop flag shared between a service instance and whoever wants it to stop.
///
/// Backed by a watch channel so that tasks inside the instance can await the
/// request while callers on other threads just flip it.
#[derive(Debug)]
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Request the instance to stop.
    ///
    /// Idempotent. Returns `true` only for the call that flipped the flag.
    pub fn request_stop(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Complete once a stop has been requested, or once the signal is dropped.
    ///
    /// The returned future does not borrow `self`, so it can be moved into
    /// spawned connection tasks.
    pub fn stopped(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            loop {
                let stop = *rx.borrow_and_update();
                if stop || rx.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
