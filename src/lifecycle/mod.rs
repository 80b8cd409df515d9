//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor (supervisor.rs):
//!     Bootstrap config → build instance → publish → run → destroy → decide
//!
//! Service handle (handle.rs):
//!     Weak, lock-free pointer to the live instance's stop signal
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop live instance
//!     SIGHUP         → request restart, stop live instance
//!
//! Stop signal (shutdown.rs):
//!     Idempotent stop flag watched by one instance
//! ```
//!
//! # Design Decisions
//! - At most one instance alive; the old one is gone before the next is built
//! - Signal delivery only flips atomics; logging happens on the supervisor
//! - A reload restarts with the same in-memory config

pub mod handle;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use handle::ServiceHandle;
pub use shutdown::StopSignal;
pub use signals::{RestartRequest, SignalBridge, SignalCapabilities, SignalKind};
pub use supervisor::{RunSummary, Supervisor, SupervisorState};
