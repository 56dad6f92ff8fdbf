//! Logging setup for the compressor
//!
//! Console output goes to stderr at INFO (TRACE with `--verbose`, or whatever
//! `RUST_LOG` asks for). The log file always receives TRACE, including the
//! captured output of every external tool. It rotates daily and only the
//! newest files are kept.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

/// Error type for logging setup
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log file path does not name a file
    #[error("Log file path has no file name: {0}")]
    InvalidLogFile(PathBuf),

    /// Failed to create the log directory
    #[error("Failed to create log directory: {0}")]
    Io(#[from] io::Error),

    /// The rolling log file could not be opened
    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),

    /// A global subscriber was already installed
    #[error("Failed to install logger: {0}")]
    Init(#[from] TryInitError),
}

/// Console level used when `RUST_LOG` is not set
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    }
}

/// Rotated log files kept next to the current one
pub const MAX_LOG_FILES: usize = 7;

/// Daily-rotating appender writing `<file_name>.<date>` files into `dir`
fn file_appender(dir: &Path, file_name: &Path) -> Result<RollingFileAppender, LoggingError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name.to_string_lossy())
        .max_log_files(MAX_LOG_FILES)
        .build(dir)?;
    Ok(appender)
}

/// Splits a log file path into the directory to write in and the file name
fn split_log_path(log_file: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = log_file
        .file_name()
        .ok_or_else(|| LoggingError::InvalidLogFile(log_file.to_path_buf()))?;

    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, PathBuf::from(file_name)))
}

/// Installs the global subscriber
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// whole run.
pub fn init_logging(verbose: bool, log_file: &Path) -> Result<WorkerGuard, LoggingError> {
    let (dir, file_name) = split_log_path(log_file)?;
    fs::create_dir_all(&dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(&dir, &file_name)?);

    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level(verbose).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(LevelFilter::TRACE),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_level() {
        assert_eq!(console_level(false), LevelFilter::INFO);
        assert_eq!(console_level(true), LevelFilter::TRACE);
    }

    #[test]
    fn test_split_bare_file_name() {
        let (dir, name) = split_log_path(Path::new("compress_videos.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("compress_videos.log"));
    }

    #[test]
    fn test_split_nested_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/media/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/media"));
        assert_eq!(name, PathBuf::from("run.log"));
    }

    #[test]
    fn test_file_appender_writes_dated_file() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let mut appender =
            file_appender(dir.path(), Path::new("compress_videos.log")).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("compress_videos.log."));
    }

    #[test]
    fn test_root_is_not_a_log_file() {
        let result = init_logging(false, Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidLogFile(_))));
    }
}
