//! Logging setup from [`AppConfig`].

use rolling_logger::{LoggerError, LoggerOptions};

use crate::config::AppConfig;

pub fn logger_options(config: &AppConfig) -> LoggerOptions {
    let mut options = LoggerOptions::new(config.app_name.clone());
    options.log_dir = config.log_dir.clone();
    options.filter = config.log_filter.clone();
    options.max_bytes = config.max_log_bytes;
    options.max_files = config.max_log_files;
    options
}

/// Install the process-wide logger. Call once at startup.
pub fn init_from_config(config: &AppConfig) -> Result<(), LoggerError> {
    rolling_logger::init_logger_with(logger_options(config))?;
    let _ = rolling_logger::info(&format!(
        "{} using collection '{}'",
        config.app_name, config.collection
    ));
    Ok(())
}
