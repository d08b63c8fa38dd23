//! Shared startup for the binaries: logger setup.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::path::PathBuf;

use crate::config::{self, PathConfig};

/// 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Verbosity for tools that log at info by default
pub fn info_by_default(verbosity: u8) -> u8 {
    verbosity.saturating_add(1)
}

/// Initialize env_logger for console or file output
///
/// `log_file` is the `--log [FILE]` flag: `Some(None)` logs to the default
/// file in the data directory. Returns the file path when logging to a file.
pub fn init_logger(
    verbosity: u8,
    log_file: Option<&Option<PathBuf>>,
    paths: &PathConfig,
) -> Result<Option<PathBuf>> {
    let level = level_for(verbosity);

    if let Some(requested) = log_file {
        let log_path = requested
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, paths));
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(level)
            .filter_module("egui", LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
        return Ok(Some(log_path));
    }

    // Console logging (respects RUST_LOG if set)
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .filter_module("egui", LevelFilter::Info)
        .filter_module("eframe", LevelFilter::Info)
        .format_timestamp_millis()
        .init();
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn test_info_by_default_saturates() {
        assert_eq!(level_for(info_by_default(0)), LevelFilter::Info);
        assert_eq!(info_by_default(u8::MAX), u8::MAX);
        assert_eq!(level_for(info_by_default(u8::MAX)), LevelFilter::Trace);
    }
}
