//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor, signals, relay
//!     → logging.rs (structured, timestamped log events)
//!     → metrics facade (relayd_restarts_total, relayd_connections_total)
//! ```
//!
//! # Design Decisions
//! - Signal delivery never logs; the supervisor reports signals after the
//!   service returns
//! - Metrics go through the `metrics` facade only; no exporter is bundled

pub mod logging;

pub use logging::{init_logging, LogHandle};
