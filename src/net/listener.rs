//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured local address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//! - Tell transient accept errors apart from fatal ones

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::RelayConfig;
use crate::error::{RuntimeError, StartupError};

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections wait until a slot becomes available.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    /// Bind to `local_address:local_port`. Must run inside a Tokio runtime.
    pub async fn bind(config: &RelayConfig) -> Result<Self, StartupError> {
        let address = config.listen_address();
        let addr: SocketAddr = address.parse().map_err(|e: std::net::AddrParseError| {
            StartupError::InvalidAddress {
                address: address.clone(),
                reason: e.to_string(),
            }
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind {
                address: address.clone(),
                source,
            })?;

        let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Waits while the limit is reached. The returned permit must be held for
    /// the connection's lifetime. Cancel-safe.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), RuntimeError> {
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::Fatal("connection limiter closed".to_string()))?;

        let (stream, addr) = self.inner.accept().await.map_err(RuntimeError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }

    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}

/// Accept errors caused by a single peer. The listener itself is fine.
pub fn is_transient_accept_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// A connection slot. Released back to the pool on drop, even if the
/// connection task panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(local_address: &str, local_port: u16, max_connections: usize) -> RelayConfig {
        RelayConfig {
            server: "127.0.0.1".into(),
            server_port: 9,
            local_address: local_address.into(),
            local_port,
            password: "secret".into(),
            method: "aes-256-cfb".into(),
            protocol: "origin".into(),
            protocol_param: String::new(),
            obfs: "plain".into(),
            obfs_param: String::new(),
            timeout: 5,
            max_connections,
            log_level: "info".into(),
        }
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let listener = Listener::bind(&config("127.0.0.1", 0, 4)).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
        assert_eq!(listener.available_permits(), 4);
    }

    #[tokio::test]
    async fn bind_conflict_is_startup_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        match Listener::bind(&config("127.0.0.1", port, 4)).await {
            Err(StartupError::Bind { address, .. }) => {
                assert_eq!(address, format!("127.0.0.1:{}", port))
            }
            other => panic!("expected bind error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn host_name_is_invalid_address() {
        let err = Listener::bind(&config("localhost", 1080, 4)).await.err().unwrap();
        assert_eq!(err.as_label(), "startup_invalid_address");
    }

    #[tokio::test]
    async fn accept_holds_permit_until_dropped() {
        let listener = Listener::bind(&config("127.0.0.1", 0, 2)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _client = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 1);

        drop(permit);
        assert_eq!(listener.available_permits(), 2);
    }

    #[test]
    fn transient_accept_errors() {
        assert!(is_transient_accept_error(&io::Error::from(io::ErrorKind::ConnectionAborted)));
        assert!(!is_transient_accept_error(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
