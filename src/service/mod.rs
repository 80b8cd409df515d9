//! Service instances driven by the supervisor.
//!
//! # Contract
//! ```text
//! ServiceFactory::build(&Arc<RelayConfig>) → instance     (acquires sockets, workers)
//! Service::run(&mut self)                  → blocks until stopped
//! Service::stop_signal()                   → flag the instance watches
//! drop(instance)                           → releases everything it acquired
//! ```
//!
//! The supervisor owns exactly one instance at a time. Anything that wants
//! to stop it from outside goes through the `StopSignal`, never through the
//! instance itself.

pub mod relay;

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::{RuntimeError, StartupError};
use crate::lifecycle::StopSignal;

pub use relay::{RelayFactory, RelayService};

/// One run of the relay.
pub trait Service {
    /// The stop flag this instance watches while running.
    fn stop_signal(&self) -> &Arc<StopSignal>;

    /// Run until stopped or until a fatal error.
    fn run(&mut self) -> Result<(), RuntimeError>;
}

/// Builds a fresh instance for each supervisor iteration.
pub trait ServiceFactory {
    type Service: Service;

    fn build(&mut self, config: &Arc<RelayConfig>) -> Result<Self::Service, StartupError>;
}
