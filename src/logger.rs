use rust_i18n::t;
use std::fs::File;
use std::path::Path;

use crate::constants::LOG_FILE_NAME;
use crate::error::AppError;

const CRATE_TARGET: &str = "webhook_buddy";

/// Simplifies file paths by extracting relevant parts from cargo registry paths
///
/// # Arguments
/// * `file_path` - The file path to simplify
///
/// # Returns
/// A simplified version of the file path
fn simplify_file_path(file_path: &str) -> String {
    if file_path.starts_with("src/") {
        return file_path.to_string();
    }

    if let Some((_, suffix)) = file_path.split_once(".cargo/registry/src/") {
        if let Some(first_slash) = suffix.find('/') {
            suffix[(first_slash + 1)..].to_string()
        } else {
            suffix.to_string()
        }
    } else {
        file_path.to_string()
    }
}

/// Formats log messages for console output with a simplified format
///
/// # Features
/// * Simplified time format (HH:MM:SS)
/// * Concise log format for console viewing
pub fn console_log_formatter(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
) {
    let level = record.level();
    let level_color = match level {
        log::Level::Error => "\x1B[31m", // red
        log::Level::Warn => "\x1B[33m",  // yellow
        log::Level::Info => "\x1B[32m",  // green
        log::Level::Debug => "\x1B[0m",  // normal
        log::Level::Trace => "\x1B[35m", // purple
    };
    let reset = "\x1B[0m";

    out.finish(format_args!(
        "{}{}[{}] {}:{} {}{}",
        level_color,
        chrono::Local::now().format("%H:%M:%S.%3f "),
        get_level(level),
        simplify_file_path(record.file().unwrap_or("")),
        record.line().unwrap_or(0),
        message,
        reset,
    ))
}

/// Formats log messages for file output with the full date
pub fn file_log_formatter(
    out: fern::FormatCallback,
    message: &std::fmt::Arguments,
    record: &log::Record,
) {
    out.finish(format_args!(
        "{}[{}] {}:{} {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        get_level(record.level()),
        simplify_file_path(record.file().unwrap_or("")),
        record.line().unwrap_or(0),
        message
    ))
}

/// Sets up the application logger with console and file outputs
///
/// # Arguments
/// * `log_dir` - Directory receiving `webhook-buddy.log`
pub fn setup_logger(log_dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        general(t!("main.failed_to_create_log_directory", error = e.to_string()))
    })?;
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    File::create(&log_file_path)
        .map_err(|e| general(t!("main.failed_to_create_log_file", error = e.to_string())))?;

    let base_dispatcher = fern::Dispatch::new().level(log::LevelFilter::Debug);

    let stdout_dispatcher = fern::Dispatch::new()
        .level(log::LevelFilter::Debug)
        .filter(|record| {
            record.target().starts_with(CRATE_TARGET) || record.level() < log::LevelFilter::Debug
        })
        .format(console_log_formatter)
        .chain(std::io::stdout());

    let file_dispatcher = fern::Dispatch::new()
        .level(log::LevelFilter::Info)
        .filter(|record| {
            record.target().starts_with(CRATE_TARGET) || record.level() < log::LevelFilter::Info
        })
        .format(file_log_formatter)
        .chain(
            fern::log_file(&log_file_path).map_err(|e| {
                general(t!("main.failed_to_create_log_file", error = e.to_string()))
            })?,
        );

    base_dispatcher
        .chain(stdout_dispatcher)
        .chain(file_dispatcher)
        .apply()
        .map_err(|e| general(t!("main.failed_to_initialize_logger", error = e.to_string())))?;

    log::debug!(
        "Logger initialized successfully, log file path: {:?}",
        log_file_path
    );
    Ok(())
}

fn general(message: impl Into<String>) -> AppError {
    AppError::General {
        message: message.into(),
    }
}

fn get_level(level: log::Level) -> String {
    match level {
        log::Level::Error => "E",
        log::Level::Warn => "W",
        log::Level::Info => "I",
        log::Level::Debug => "D",
        log::Level::Trace => "T",
    }
    .to_string()
}

#[cfg(test)]
use log::SetLoggerError;

/// Sets up a console-only logger for tests
#[cfg(test)]
pub fn setup_test_logger() -> Result<(), SetLoggerError> {
    if log::logger().enabled(&log::Metadata::builder().level(log::Level::Debug).build()) {
        return Ok(());
    }

    fern::Dispatch::new()
        .format(console_log_formatter)
        .level(log::LevelFilter::Debug)
        .filter(|record| {
            record.target().starts_with(CRATE_TARGET) || record.level() < log::LevelFilter::Debug
        })
        .chain(std::io::stdout())
        .apply()?;

    log::debug!("Test logger initialized successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_file_path() {
        assert_eq!(simplify_file_path("src/db/import.rs"), "src/db/import.rs");
        assert_eq!(
            simplify_file_path("/home/u/.cargo/registry/src/index.crates.io-6f17/reqwest-0.12.8/src/lib.rs"),
            "reqwest-0.12.8/src/lib.rs"
        );
        assert_eq!(simplify_file_path("/opt/other/lib.rs"), "/opt/other/lib.rs");
        assert_eq!(get_level(log::Level::Warn), "W");
    }
}
