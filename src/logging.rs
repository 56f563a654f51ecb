//! Logging configuration using the tracing framework
//!
//! Logs can be controlled via the RUST_LOG environment variable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const DEFAULT_FILTER: &str = "k9track=info,warn";

/// Initialize the logging system
///
/// This sets up tracing with:
/// - Environment-based log level filtering (RUST_LOG)
/// - Formatted output to stderr, so `--json` output on stdout stays clean
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log level (e.g., "debug", "info", "warn", "error")
///   - Default: "k9track=info,warn"
///   - Examples:
///     - `RUST_LOG=k9track=debug` - Debug logs for this crate only
///     - `RUST_LOG=k9track::activity::catalog=trace` - Catalog merge tracing
///
/// # Examples
///
/// ```no_run
/// use k9track::logging;
///
/// logging::init();
/// tracing::info!("Application started");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(true)
                .with_file(false),
        )
        .init();
}

/// Initialize logging to a daily rolling file only
///
/// Used by the interactive board, where anything written to the terminal
/// would tear the rendered frame.
///
/// # Arguments
///
/// * `log_file_name` - Name of the log file (e.g., "k9track.log")
pub fn init_with_file(log_file_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    let log_dir = match Config::project_dirs() {
        Some(proj_dirs) => {
            let log_path = proj_dirs.data_dir().join("logs");
            std::fs::create_dir_all(&log_path)?;
            log_path
        }
        None => std::env::current_dir()?,
    };

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_file_name);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .try_init()?;

    Ok(())
}

/// Initialize logging for tests
///
/// Only errors are shown by default.
#[allow(dead_code)]
pub fn init_test() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_test_writer())
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn test_structured_logging() {
        init_test();
        tracing::info!(facility_id = "fac-1", code = "potty", "Structured log message");
    }
}

// Made with Bob
