//! Logging configuration for SQLFlow.
//!
//! The terminal UI owns stdout, so interactive runs log to a file. Non-interactive
//! runs (and debugging) can log to stderr instead.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initializes logging for TUI mode.
///
/// Location: `~/.local/state/sqlflow/sqlflow.log` on Linux (XDG state directory),
/// or the platform-appropriate state/config directory on other systems.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    // Truncated on each run
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Returns the path for the log file.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("sqlflow").join("sqlflow.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("sqlflow").join("sqlflow.log");
    }

    std::env::temp_dir().join("sqlflow.log")
}
