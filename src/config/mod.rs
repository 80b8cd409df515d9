//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --configFile <path>  ─┐
//!                       ├─→ ConfigSource::select (file wins)
//! --configJson <text>  ─┘
//!     → loader.rs (read & deserialize, JSON or TOML)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with every service instance
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a reload signal restarts the service
//!   with the same in-memory config and does not re-read the source
//! - No default config: an empty source is a startup error
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_file, load_from_text, ConfigSource};
pub use schema::RelayConfig;
