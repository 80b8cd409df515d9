//! Configuration validation.
//!
//! Serde already rejects malformed syntax and missing required fields; this
//! pass covers semantic checks. All problems are reported together.

use std::fmt;
use std::net::IpAddr;

use tokio::sync::Semaphore;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    ZeroPort(&'static str),
    ZeroValue(&'static str),
    TooLarge { field: &'static str, max: usize },
    InvalidLocalAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} must not be empty", field),
            ValidationError::ZeroPort(field) => write!(f, "{} must not be 0", field),
            ValidationError::ZeroValue(field) => write!(f, "{} must be greater than 0", field),
            ValidationError::TooLarge { field, max } => {
                write!(f, "{} must not exceed {}", field, max)
            }
            ValidationError::InvalidLocalAddress(addr) => {
                write!(f, "local_address {:?} is not an IP address", addr)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration. Pure: `&RelayConfig → Result<(), Vec<_>>`.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.trim().is_empty() {
        errors.push(ValidationError::EmptyField("server"));
    }
    if config.server_port == 0 {
        errors.push(ValidationError::ZeroPort("server_port"));
    }
    if config.local_port == 0 {
        errors.push(ValidationError::ZeroPort("local_port"));
    }
    if config.password.is_empty() {
        errors.push(ValidationError::EmptyField("password"));
    }
    if config.method.trim().is_empty() {
        errors.push(ValidationError::EmptyField("method"));
    }
    if config.timeout == 0 {
        errors.push(ValidationError::ZeroValue("timeout"));
    }
    if config.max_connections == 0 {
        errors.push(ValidationError::ZeroValue("max_connections"));
    }
    // The listener sizes a semaphore with it.
    if config.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooLarge {
            field: "max_connections",
            max: Semaphore::MAX_PERMITS,
        });
    }

    let local = config.local_address.trim_start_matches('[').trim_end_matches(']');
    if local.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidLocalAddress(config.local_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
