//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (timestamped fmt output)
//! - Honour `RUST_LOG`, falling back to a default directive
//! - Apply the configured log level once the config is loaded
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - The filter sits behind a reload layer, so the level from the config file
//!   can take over after bootstrap without reinstalling the subscriber
//! - `RUST_LOG` always wins over the config file

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Handle to the installed log filter.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Switch to `relayd=<level>` unless `RUST_LOG` was set.
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        match EnvFilter::try_new(level_directive(level)) {
            Ok(filter) => {
                if let Err(e) = self.filter.reload(filter) {
                    tracing::warn!(error = %e, "Failed to apply log level");
                }
            }
            Err(e) => tracing::warn!(level, error = %e, "Ignoring invalid log level"),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `None` if a subscriber was already installed (e.g. in tests).
pub fn init_logging(default_level: &str) -> Option<LogHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(level_directive(default_level)), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok()?;

    Some(LogHandle {
        filter: handle,
        from_env,
    })
}

fn level_directive(level: &str) -> String {
    format!("relayd={}", level.trim().to_ascii_lowercase())
}
