//! Error taxonomy for the supervisor.
//!
//! # Propagation
//! ```text
//! ConfigError  (BOOTSTRAP)      ─┐
//! StartupError (instance build) ─┼─→ SupervisorError → main → log fatal → exit 1
//! RuntimeError (instance run)   ─┘
//! ```
//!
//! None of these are recovered locally. The restart loop never retries an
//! instance that failed to build or failed while running.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Configuration could not be loaded or did not validate.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The JSON text was malformed or missed required fields.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The TOML file was malformed or missed required fields.
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Parsed, but semantically invalid.
    #[error("config validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Json(_) => "config_json",
            ConfigError::Toml(_) => "config_toml",
            ConfigError::Validation(_) => "config_validation",
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A service instance could not be constructed.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The listen address did not parse.
    #[error("invalid listen address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Binding the listening socket failed (port in use, permission denied).
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The instance's worker runtime could not be created.
    #[error("failed to start worker runtime: {0}")]
    Runtime(#[source] io::Error),

    /// Any other construction failure.
    #[error("{0}")]
    Other(String),
}

impl StartupError {
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupError::InvalidAddress { .. } => "startup_invalid_address",
            StartupError::Bind { .. } => "startup_bind",
            StartupError::Runtime(_) => "startup_runtime",
            StartupError::Other(_) => "startup_other",
        }
    }
}

/// A running service instance failed.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The listening socket stopped accepting.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Unrecoverable internal failure.
    #[error("fatal service error: {0}")]
    Fatal(String),
}

impl RuntimeError {
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Accept(_) => "runtime_accept",
            RuntimeError::Fatal(_) => "runtime_fatal",
        }
    }
}

/// Everything that can end the supervisor with a non-zero exit.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl SupervisorError {
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::Config(e) => e.as_label(),
            SupervisorError::Startup(e) => e.as_label(),
            SupervisorError::Runtime(e) => e.as_label(),
        }
    }

    /// Process exit status for this error. Always 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
