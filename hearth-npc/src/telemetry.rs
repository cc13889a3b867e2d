//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

use hearth_core::config::GeneralConfig;

use crate::error::{NpcError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `general.log_level` when set. With
/// `general.json_logs` every event is written as one JSON line.
///
/// # Errors
/// `NpcError::Telemetry` for an invalid filter directive or when a global
/// subscriber is already installed.
pub fn init(config: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| NpcError::Telemetry(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| NpcError::Telemetry(e.to_string()))
}
