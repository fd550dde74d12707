//! Structured logging for the Tessera baker.
//!
//! Console output with uptime timestamps and module targets, plus a JSON log
//! file in debug builds when a log directory is configured. `RUST_LOG` always
//! takes precedence over the configured level.

use std::path::Path;

use tessera_config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written inside the log directory.
pub const LOG_FILE_NAME: &str = "tessera.log";

/// Initialize the global tracing subscriber.
///
/// # Arguments
///
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Optional logging section for level and log directory
///
/// # Examples
///
/// ```no_run
/// use tessera_config::LoggingConfig;
/// use tessera_log::init_logging;
///
/// init_logging(false, None);
///
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     log_dir: Some("./logs".into()),
/// };
/// init_logging(true, Some(&config));
/// ```
pub fn init_logging(debug_build: bool, config: Option<&LoggingConfig>) {
    let filter_str = config
        .map(|c| c.level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // bake workers are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let log_dir = config.and_then(|c| c.log_dir.as_deref());
    if debug_build
        && let Some(log_dir) = log_dir
        && let Some(log_file) = create_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!("JSON log file at {}", log_dir.join(LOG_FILE_NAME).display());
        return;
    }

    subscriber.init();
}

fn create_log_file(log_dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(log_dir).ok()?;
    std::fs::File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_subsystem_filter() {
        let filter = EnvFilter::new("info,tessera_bake=debug");
        let filter_str = format!("{filter}");
        assert!(filter_str.contains("tessera_bake=debug"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,tessera_worldgen=trace",
            "warn,tessera_bake=debug",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_file_created_in_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let file = create_log_file(&log_dir);
        assert!(file.is_some());
        assert!(log_dir.join(LOG_FILE_NAME).exists());
    }
}
