//! Process-wide logging setup.
//!
//! Call [`init`] once at startup, before the registry is populated. Library
//! code only emits `tracing` events; nothing installs a subscriber implicitly.
//!
//! Targets used by this crate:
//! - `warden::registry` - component lifecycle
//! - `warden::access` - one line per security decision

use tracing_subscriber::EnvFilter;

use crate::settings::RuntimeConfig;

/// Target of per-request access log lines.
pub const ACCESS_TARGET: &str = "warden::access";

/// Logging options.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Default filter directives, used when `RUST_LOG` is not set.
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Reads `logging.level` and `logging.ansi`.
    pub fn from_runtime(config: &RuntimeConfig) -> Self {
        let defaults = Self::default();
        LoggingConfig {
            level: config.get_string("logging.level").unwrap_or(defaults.level),
            ansi: config
                .get::<bool>("logging.ansi")
                .ok()
                .flatten()
                .unwrap_or(defaults.ansi),
        }
    }
}

/// Installs the global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, in which case
/// the existing one is kept.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok()
}
