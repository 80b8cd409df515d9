//! The restart loop.
//!
//! # States
//! ```text
//! BOOTSTRAP ──ConfigError──────────────────────────────→ (fatal, exit 1)
//!     │
//!     ▼
//! RUNNING { generation } ──Startup/RuntimeError─────────→ (fatal, exit 1)
//!     │  run() returned, instance destroyed
//!     ├── restart requested → RESTARTING → RUNNING { generation + 1 }
//!     └── otherwise         → TERMINATED (exit 0)
//! ```
//!
//! Fatal errors leave through `?`, so there is no state from which a failed
//! instance could be restarted. The previous instance is dropped, and the
//! service handle invalidated, before the next one is built.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{ConfigSource, RelayConfig};
use crate::error::{ConfigError, SupervisorError};
use crate::lifecycle::handle::ServiceHandle;
use crate::lifecycle::signals::{SignalBridge, SignalKind};
use crate::service::{Service, ServiceFactory};

/// Restart loop state after bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running { generation: u64 },
    Restarting { generation: u64 },
    Terminated { generations: u64 },
}

/// Result of a clean shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of service instances that ran.
    pub generations: u64,
}

/// Owns the configuration and, one at a time, every service instance.
pub struct Supervisor<F: ServiceFactory> {
    config: Arc<RelayConfig>,
    factory: F,
    bridge: SignalBridge,
}

impl<F: ServiceFactory> Supervisor<F> {
    /// BOOTSTRAP: resolve the configuration. Nothing else is acquired here,
    /// so a failure leaves nothing to unwind.
    pub fn bootstrap(
        source: &ConfigSource,
        factory: F,
        bridge: SignalBridge,
    ) -> Result<Self, ConfigError> {
        tracing::info!(source = %source.describe(), "Loading configuration");
        let config = source.load()?;

        tracing::info!(
            listen = %config.listen_address(),
            upstream = %config.upstream_address(),
            max_connections = config.max_connections,
            "Configuration loaded"
        );

        Ok(Self::new(Arc::new(config), factory, bridge))
    }

    pub fn new(config: Arc<RelayConfig>, factory: F, bridge: SignalBridge) -> Self {
        Self {
            config,
            factory,
            bridge,
        }
    }

    pub fn config(&self) -> &Arc<RelayConfig> {
        &self.config
    }

    /// Drive the restart loop until a clean shutdown or a fatal error.
    pub fn run(mut self) -> Result<RunSummary, SupervisorError> {
        let mut state = SupervisorState::Running { generation: 1 };
        loop {
            state = match state {
                SupervisorState::Running { generation } => self.run_generation(generation)?,
                SupervisorState::Restarting { generation } => {
                    tracing::info!(generation, "relayd service now restarting...");
                    metrics::counter!("relayd_restarts_total").increment(1);
                    SupervisorState::Running {
                        generation: generation + 1,
                    }
                }
                SupervisorState::Terminated { generations } => {
                    return Ok(RunSummary { generations });
                }
            };
        }
    }

    /// One RUNNING iteration, ending with the restart decision.
    fn run_generation(&mut self, generation: u64) -> Result<SupervisorState, SupervisorError> {
        self.bridge.restart_request().reset();

        {
            let service = self.factory.build(&self.config)?;
            let mut instance = PublishedService::new(service, self.bridge.handle());

            let run_id = Uuid::new_v4();
            tracing::info!(generation, %run_id, "Service instance started");
            instance.service.run()?;
            tracing::info!(generation, %run_id, "Service instance returned");
        }

        match self.bridge.take_last_signal() {
            Some(SignalKind::Terminate) => tracing::info!("Handled termination signal"),
            Some(SignalKind::Reload) => tracing::info!("Handled restart signal"),
            None => tracing::info!("Service stopped without a signal"),
        }

        if self.bridge.restart_request().take() {
            Ok(SupervisorState::Restarting { generation })
        } else {
            Ok(SupervisorState::Terminated {
                generations: generation,
            })
        }
    }
}

/// A service instance visible through the [`ServiceHandle`] for as long as
/// it lives. Dropping it invalidates the handle, then destroys the instance.
struct PublishedService<'h, S: Service> {
    service: S,
    handle: &'h ServiceHandle,
}

impl<'h, S: Service> PublishedService<'h, S> {
    fn new(service: S, handle: &'h ServiceHandle) -> Self {
        handle.publish(service.stop_signal());
        Self { service, handle }
    }
}

impl<S: Service> Drop for PublishedService<'_, S> {
    fn drop(&mut self) {
        self.handle.invalidate();
    }
}
