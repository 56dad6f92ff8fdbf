//! Startup checks module
//!
//! Provides preflight checks run before the pipeline touches any file:
//! - ffmpeg is runnable (`ffmpeg -version`)
//! - ffprobe is runnable (`ffprobe -version`)

use crate::config::ToolsConfig;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{tool} not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },
}

/// Run `<tool> -version` and return its stdout
///
/// Both ffmpeg and ffprobe accept `-version` and exit zero.
pub fn check_tool_available(tool: &str) -> Result<String, StartupError> {
    let output = Command::new(tool)
        .arg("-version")
        .output()
        .map_err(|e| StartupError::ToolUnavailable {
            tool: tool.to_string(),
            reason: format!("{} -version failed; is it installed and in PATH? Error: {}", tool, e),
        })?;

    if !output.status.success() {
        return Err(StartupError::ToolUnavailable {
            tool: tool.to_string(),
            reason: format!("{} -version exited with {}", tool, output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse FFmpeg version string and extract major version number
///
/// Handles various FFmpeg version formats:
/// - Standard: "ffmpeg version 7.1 ..."
/// - N-prefixed: "ffmpeg version n7.1-... ..."
/// - ffprobe: "ffprobe version 7.1 ..."
pub fn parse_ffmpeg_version(version_output: &str) -> Option<u32> {
    let version_line = version_output
        .lines()
        .map(str::to_lowercase)
        .find(|line| line.contains(" version "))?;

    let version_part = version_line
        .split(" version ")
        .nth(1)?
        .split_whitespace()
        .next()?
        .to_string();

    let version_str = version_part.trim_start_matches('n');

    // Major version ends at the first '.' or '-'
    let major_str = version_str.split(|c| c == '.' || c == '-').next()?;

    major_str.parse().ok()
}

/// Run all startup checks in order
///
/// 1. ffmpeg availability
/// 2. ffprobe availability
pub fn run_startup_checks(tools: &ToolsConfig) -> Result<(), StartupError> {
    let ffmpeg_output = check_tool_available(&tools.ffmpeg)?;
    match parse_ffmpeg_version(&ffmpeg_output) {
        Some(major) => info!("Using {} (major version {})", tools.ffmpeg, major),
        None => warn!("Could not parse version of {}", tools.ffmpeg),
    }

    check_tool_available(&tools.ffprobe)?;
    debug!("Using {}", tools.ffprobe);

    Ok(())
}
