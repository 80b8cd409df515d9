//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, and SIGHUP where supported)
//! - Translate signals into a stop request and, for reload, a restart request
//! - Record which signal arrived so the supervisor can log it later
//!
//! # Design Decisions
//! - Uses Tokio's signal handling on a dedicated thread: the OS-level handler
//!   only wakes that thread. The bridge there stores atomics and, through
//!   `StopSignal::request_stop`, briefly takes the watch channel's lock to
//!   wake the running instance
//! - The bridge never logs; logging happens on the supervisor thread after
//!   the service's run call returns
//! - Reload support is a runtime capability flag, so the restart state
//!   machine is the same on every platform

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;

use crate::lifecycle::handle::ServiceHandle;

/// Signal classes the supervisor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGINT / SIGTERM / Ctrl-C.
    Terminate,
    /// SIGHUP.
    Reload,
}

impl SignalKind {
    fn as_u8(self) -> u8 {
        match self {
            SignalKind::Terminate => 1,
            SignalKind::Reload => 2,
        }
    }

    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(SignalKind::Terminate),
            2 => Some(SignalKind::Reload),
            _ => None,
        }
    }
}

/// Which signal classes this platform can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalCapabilities {
    pub reload: bool,
}

impl SignalCapabilities {
    /// Capabilities of the running platform. Windows has no reload signal.
    pub fn detect() -> Self {
        Self {
            reload: cfg!(unix),
        }
    }

    pub fn terminate_only() -> Self {
        Self { reload: false }
    }
}

/// Process-wide "restart after this run" flag.
///
/// Written by the signal bridge, read and cleared by the supervisor.
#[derive(Debug, Default)]
pub struct RestartRequest {
    requested: AtomicBool,
}

impl RestartRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` if it was not already set.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Read and clear.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

/// Translates delivered signals into stop/restart requests.
///
/// Cheap to clone; every clone shares the same handle and flags.
#[derive(Debug, Clone)]
pub struct SignalBridge {
    handle: Arc<ServiceHandle>,
    restart: Arc<RestartRequest>,
    last_signal: Arc<AtomicU8>,
    capabilities: SignalCapabilities,
}

impl SignalBridge {
    pub fn new(handle: Arc<ServiceHandle>, capabilities: SignalCapabilities) -> Self {
        Self {
            handle,
            restart: Arc::new(RestartRequest::new()),
            last_signal: Arc::new(AtomicU8::new(0)),
            capabilities,
        }
    }

    pub fn handle(&self) -> &Arc<ServiceHandle> {
        &self.handle
    }

    pub fn restart_request(&self) -> &RestartRequest {
        &self.restart
    }

    /// Stop the live instance, if any. No restart.
    pub fn on_terminate(&self) {
        self.record(SignalKind::Terminate);
        self.handle.try_stop();
    }

    /// Schedule a restart, then stop the live instance, if any.
    ///
    /// Ignored when the platform has no reload capability.
    pub fn on_reload(&self) {
        if !self.capabilities.reload {
            return;
        }
        self.record(SignalKind::Reload);
        self.restart.request();
        self.handle.try_stop();
    }

    pub fn dispatch(&self, kind: SignalKind) {
        match kind {
            SignalKind::Terminate => self.on_terminate(),
            SignalKind::Reload => self.on_reload(),
        }
    }

    /// The most recent signal since the last call, if any.
    pub fn take_last_signal(&self) -> Option<SignalKind> {
        SignalKind::from_u8(self.last_signal.swap(0, Ordering::SeqCst))
    }

    fn record(&self, kind: SignalKind) {
        self.last_signal.store(kind.as_u8(), Ordering::SeqCst);
    }

    /// Register OS signal handlers and start the signal-delivery thread.
    ///
    /// Registration happens before this returns, so a signal delivered right
    /// after is never lost. The thread lives until the process exits.
    pub fn install(&self) -> io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut listeners = {
            let _guard = runtime.enter();
            SignalListeners::register(self.capabilities)?
        };

        let bridge = self.clone();
        thread::Builder::new()
            .name("relayd-signals".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        let kind = listeners.next().await;
                        bridge.dispatch(kind);
                    }
                })
            })?;

        Ok(())
    }
}

#[cfg(unix)]
struct SignalListeners {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl SignalListeners {
    fn register(capabilities: SignalCapabilities) -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind as Os};

        let hangup = if capabilities.reload {
            Some(signal(Os::hangup())?)
        } else {
            None
        };

        Ok(Self {
            interrupt: signal(Os::interrupt())?,
            terminate: signal(Os::terminate())?,
            hangup,
        })
    }

    async fn next(&mut self) -> SignalKind {
        tokio::select! {
            _ = self.interrupt.recv() => SignalKind::Terminate,
            _ = self.terminate.recv() => SignalKind::Terminate,
            _ = recv_optional(&mut self.hangup) => SignalKind::Reload,
        }
    }
}

#[cfg(unix)]
async fn recv_optional(signal: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
struct SignalListeners;

#[cfg(not(unix))]
impl SignalListeners {
    fn register(_capabilities: SignalCapabilities) -> io::Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> SignalKind {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        SignalKind::Terminate
    }
}
