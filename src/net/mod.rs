//! Network layer used by the relay service.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (id, tracking, dial upstream, copy both ways)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection is tracked so a stopping instance can report what it drops
//! - Bytes are forwarded unchanged; cipher and obfuscation are not handled here

pub mod connection;
pub mod listener;
