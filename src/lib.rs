//! relayd: supervised TCP relay daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──▶ ConfigSource ──▶ Supervisor::bootstrap
//!                                          │
//!                                          ▼
//!                     ┌──────────── restart loop ────────────┐
//!                     │  build RelayService (bind, runtime)  │
//!   SIGINT/SIGTERM ─┐ │  publish to ServiceHandle            │
//!   SIGHUP ─────────┼▶│  run() … blocks until stopped        │
//!   (SignalBridge)  │ │  drop instance, handle → absent      │
//!                   └▶│  restart requested? loop : exit 0    │
//!                     └──────────────────────────────────────┘
//! ```
//!
//! Fatal errors from any stage surface as [`SupervisorError`] and end the
//! process with status 1.

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod service;

pub use config::{ConfigSource, RelayConfig};
pub use error::{ConfigError, RuntimeError, StartupError, SupervisorError};
pub use lifecycle::{ServiceHandle, SignalBridge, SignalCapabilities, StopSignal, Supervisor};
pub use service::{RelayFactory, RelayService, Service, ServiceFactory};

/// Crate version, as reported in the startup banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
