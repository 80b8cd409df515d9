//! Plain TCP relay service.
//!
//! Each instance owns its own Tokio runtime and listening socket. Both are
//! acquired in [`RelayService::new`] and released when the instance is
//! dropped, so a restarted instance can bind the same port again.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;

use crate::config::RelayConfig;
use crate::error::{RuntimeError, StartupError};
use crate::lifecycle::StopSignal;
use crate::net::connection::{relay_connection, ConnectionTracker};
use crate::net::listener::{is_transient_accept_error, Listener};
use crate::service::{Service, ServiceFactory};

/// Builds [`RelayService`] instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelayFactory;

impl ServiceFactory for RelayFactory {
    type Service = RelayService;

    fn build(&mut self, config: &Arc<RelayConfig>) -> Result<RelayService, StartupError> {
        RelayService::new(Arc::clone(config))
    }
}

pub struct RelayService {
    // Dropped before the runtime it is registered with.
    listener: Listener,
    tracker: ConnectionTracker,
    stop: Arc<StopSignal>,
    config: Arc<RelayConfig>,
    runtime: Runtime,
}

impl RelayService {
    /// Start the worker runtime and bind the listening socket.
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, StartupError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("relayd-worker")
            .build()
            .map_err(StartupError::Runtime)?;

        let listener = runtime.block_on(Listener::bind(&config))?;

        Ok(Self {
            listener,
            tracker: ConnectionTracker::new(),
            stop: Arc::new(StopSignal::new()),
            config,
            runtime,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Service for RelayService {
    fn stop_signal(&self) -> &Arc<StopSignal> {
        &self.stop
    }

    fn run(&mut self) -> Result<(), RuntimeError> {
        let upstream = self.config.upstream_address();
        let connect_timeout = Duration::from_secs(self.config.timeout);

        tracing::info!(
            upstream = %upstream,
            method = %self.config.method,
            protocol = %self.config.protocol,
            obfs = %self.config.obfs,
            "Relay running"
        );

        let result = self.runtime.block_on(serve(
            &self.listener,
            &self.tracker,
            &self.stop,
            Arc::from(upstream),
            connect_timeout,
        ));

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Relay stopped accepting"
        );
        result
    }
}

async fn serve(
    listener: &Listener,
    tracker: &ConnectionTracker,
    stop: &StopSignal,
    upstream: Arc<str>,
    connect_timeout: Duration,
) -> Result<(), RuntimeError> {
    loop {
        let accepted = tokio::select! {
            _ = stop.stopped() => return Ok(()),
            accepted = listener.accept() => accepted,
        };

        let (stream, peer, permit) = match accepted {
            Ok(conn) => conn,
            Err(RuntimeError::Accept(e)) if is_transient_accept_error(&e) => {
                tracing::warn!(error = %e, "Transient accept error");
                continue;
            }
            Err(e) => return Err(e),
        };

        metrics::counter!("relayd_connections_total").increment(1);

        let guard = tracker.track();
        let upstream = Arc::clone(&upstream);
        let stopped = stop.stopped();

        tokio::spawn(async move {
            let _permit = permit;
            tokio::select! {
                result = relay_connection(stream, &upstream, connect_timeout) => match result {
                    Ok(stats) => tracing::debug!(
                        connection_id = %guard.id(),
                        peer_addr = %peer,
                        to_upstream = stats.to_upstream,
                        to_client = stats.to_client,
                        "Connection finished"
                    ),
                    Err(e) => tracing::debug!(
                        connection_id = %guard.id(),
                        peer_addr = %peer,
                        error = %e,
                        "Connection failed"
                    ),
                },
                _ = stopped => {
                    tracing::trace!(connection_id = %guard.id(), "Connection dropped on stop");
                }
            }
        });
    }
}
