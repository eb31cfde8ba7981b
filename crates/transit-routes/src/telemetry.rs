//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Binaries and tests that want to see
//! them call [`init_tracing`] once.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is not set
    pub level: String,
    /// Include the event target in each line
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !VALID_LEVELS.contains(&self.level.as_str()) {
            return Err(Error::Config(format!(
                "invalid log level '{}', must be one of: {}",
                self.level,
                VALID_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Install the global subscriber
///
/// Returns `false` when a previous call already installed it.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    config.validate()?;

    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(false);
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| Error::Config(format!("failed to initialize tracing: {}", e)))?;

    Ok(true)
}
