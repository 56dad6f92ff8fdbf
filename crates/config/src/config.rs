//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// A value was parsed but is not usable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Encoder settings applied to every job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodeConfig {
    /// Maximum long-edge resolution after scaling (default 720)
    #[serde(default = "default_max_resolution")]
    pub max_resolution: u32,
    /// Output frame rate (default 30)
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// ffmpeg video codec selector (default libx265)
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Encoder thread count (None = let ffmpeg decide)
    #[serde(default)]
    pub threads: Option<u32>,
}

fn default_max_resolution() -> u32 {
    720
}

fn default_fps() -> u32 {
    30
}

fn default_codec() -> String {
    "libx265".to_string()
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            max_resolution: default_max_resolution(),
            fps: default_fps(),
            codec: default_codec(),
            threads: None,
        }
    }
}

/// Output naming configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamingConfig {
    /// Token inserted before the extension of compressed files (default "cmp1")
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    "cmp1".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// Extensions to pick up, without the leading dot (matched case-insensitively)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Name of the ignore file looked up in the input directory
    #[serde(default = "default_ignore_file_name")]
    pub ignore_file_name: String,
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_ignore_file_name() -> String {
    ".cmpignore".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_file_name: default_ignore_file_name(),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - COMPRESS_MAX_RESOLUTION -> encode.max_resolution
    /// - COMPRESS_FPS -> encode.fps
    /// - COMPRESS_CODEC -> encode.codec
    /// - COMPRESS_THREADS -> encode.threads
    /// - COMPRESS_MARKER -> naming.marker
    /// - FFMPEG_PATH -> tools.ffmpeg
    /// - FFPROBE_PATH -> tools.ffprobe
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("COMPRESS_MAX_RESOLUTION") {
            if let Ok(res) = val.parse::<u32>() {
                self.encode.max_resolution = res;
            }
        }

        if let Ok(val) = env::var("COMPRESS_FPS") {
            if let Ok(fps) = val.parse::<u32>() {
                self.encode.fps = fps;
            }
        }

        if let Ok(val) = env::var("COMPRESS_CODEC") {
            if !val.trim().is_empty() {
                self.encode.codec = val.trim().to_string();
            }
        }

        // "auto" clears a thread count set in the file
        if let Ok(val) = env::var("COMPRESS_THREADS") {
            if val.eq_ignore_ascii_case("auto") {
                self.encode.threads = None;
            } else if let Ok(threads) = val.parse::<u32>() {
                self.encode.threads = Some(threads);
            }
        }

        if let Ok(val) = env::var("COMPRESS_MARKER") {
            if !val.trim().is_empty() {
                self.naming.marker = val.trim().to_string();
            }
        }

        if let Ok(val) = env::var("FFMPEG_PATH") {
            if !val.is_empty() {
                self.tools.ffmpeg = val;
            }
        }

        if let Ok(val) = env::var("FFPROBE_PATH") {
            if !val.is_empty() {
                self.tools.ffprobe = val;
            }
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encode.max_resolution == 0 {
            return Err(ConfigError::Invalid(
                "encode.max_resolution must be greater than 0".to_string(),
            ));
        }
        if self.encode.fps == 0 {
            return Err(ConfigError::Invalid(
                "encode.fps must be greater than 0".to_string(),
            ));
        }
        if self.encode.codec.trim().is_empty() {
            return Err(ConfigError::Invalid("encode.codec is empty".to_string()));
        }
        if self.encode.threads == Some(0) {
            return Err(ConfigError::Invalid(
                "encode.threads must be greater than 0 (omit it for automatic)".to_string(),
            ));
        }

        let marker = &self.naming.marker;
        if marker.is_empty() || marker.contains('.') || marker.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "naming.marker '{}' must be a non-empty token without '.' or '/'",
                marker
            )));
        }

        if self.discovery.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Invalid(
                "discovery.extensions must list at least one extension".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from file, apply environment overrides and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults with environment overrides, for runs without a config file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
