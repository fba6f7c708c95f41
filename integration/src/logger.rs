//! Unified logger for centralized logging configuration

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,

    /// Include thread IDs
    pub include_thread_ids: bool,

    /// Include target module paths
    pub include_targets: bool,

    /// Colour output
    pub ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_thread_ids: false,
            include_targets: true,
            ansi: true,
        }
    }
}

impl LoggerConfig {
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }
}

/// Outcome of installing the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerInit {
    Installed,
    /// Another subscriber was already set; the existing one stays active
    AlreadyInstalled,
}

/// Unified logger
pub struct UnifiedLogger;

impl UnifiedLogger {
    /// Initialize the global logger.
    ///
    /// An invalid level is an error. A second initialisation is not: the
    /// first subscriber keeps running and `AlreadyInstalled` is returned.
    pub fn init(config: LoggerConfig) -> anyhow::Result<LoggerInit> {
        // Create filter
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level)?,
        };

        // Create console layer
        let console_layer = fmt::layer()
            .with_target(config.include_targets)
            .with_thread_ids(config.include_thread_ids)
            .with_ansi(config.ansi);

        // Build subscriber and set as global default
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init();

        match installed {
            Ok(()) => {
                tracing::info!("Logging initialized with level: {}", config.level);
                Ok(LoggerInit::Installed)
            }
            Err(e) => {
                tracing::debug!("Logger already initialized: {}", e);
                Ok(LoggerInit::AlreadyInstalled)
            }
        }
    }

    /// Initialize with default configuration
    pub fn init_default() -> anyhow::Result<LoggerInit> {
        Self::init(LoggerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.include_targets);
    }

    #[test]
    fn test_second_init_is_tolerated() {
        let _ = UnifiedLogger::init(LoggerConfig::with_level("debug"));
        let again = UnifiedLogger::init(LoggerConfig::with_level("debug")).unwrap();
        assert_eq!(again, LoggerInit::AlreadyInstalled);
    }
}
