//! Configuration schema definitions.
//!
//! The field names follow the relay daemon's JSON config format, so an
//! existing `config.json` can be passed verbatim via `--configFile` or
//! `--configJson`.

use serde::Deserialize;

/// Root configuration for the relay daemon.
///
/// Loaded once at bootstrap and shared read-only (`Arc<RelayConfig>`) with
/// every service instance, including the ones created by a reload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Upstream server host name or IP.
    pub server: String,

    /// Upstream server port.
    pub server_port: u16,

    /// Local address the relay listens on.
    #[serde(default = "default_local_address")]
    pub local_address: String,

    /// Local port the relay listens on.
    pub local_port: u16,

    /// Shared secret for the cipher layer.
    pub password: String,

    /// Cipher method name (e.g. "aes-256-cfb").
    pub method: String,

    /// Protocol plugin name.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default)]
    pub protocol_param: String,

    /// Obfuscation plugin name.
    #[serde(default = "default_obfs")]
    pub obfs: String,

    #[serde(default)]
    pub obfs_param: String,

    /// Upstream connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum concurrent relayed connections (backpressure).
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl RelayConfig {
    /// `local_address:local_port`.
    pub fn listen_address(&self) -> String {
        join_host_port(&self.local_address, self.local_port)
    }

    /// `server:server_port`.
    pub fn upstream_address(&self) -> String {
        join_host_port(&self.server, self.server_port)
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

fn default_local_address() -> String {
    "127.0.0.1".to_string()
}

fn default_protocol() -> String {
    "origin".to_string()
}

fn default_obfs() -> String {
    "plain".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_connections() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}
