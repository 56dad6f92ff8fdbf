//! Video Compressor
//!
//! Scans a directory for videos, downscales each one with ffmpeg under a
//! compression-marked name, archives the original and reports what was saved.

pub mod archive;
pub mod cancel;
pub mod encode;
pub mod ignore;
pub mod job_executor;
pub mod logging;
pub mod pipeline;
pub mod probe;
pub mod scale;
pub mod scan;
pub mod startup;
pub mod stats;
pub mod tools;

pub use video_compressor_config as config;
pub use video_compressor_config::Config;
pub use archive::{archive_original, copy_file_metadata, ArchiveError};
pub use cancel::{install_ctrl_c_handler, CancelFlag};
pub use encode::{build_ffmpeg_command, run_ffmpeg, EncodeError, EncodeOutput, EncodeParams};
pub use ignore::IgnoreRules;
pub use job_executor::{Job, JobError, JobExecutor, JobOutcome, JobState};
pub use logging::{init_logging, LoggingError};
pub use pipeline::{Pipeline, PipelineError, PipelineSettings};
pub use probe::{parse_dimensions, probe_dimensions, ProbeError};
pub use scale::{scale_expression, video_filter, Dimensions};
pub use scan::{classify, scan_directory, ScanCandidate};
pub use startup::{check_tool_available, parse_ffmpeg_version, run_startup_checks, StartupError};
pub use stats::{format_bytes, RunStats};
pub use tools::{FfmpegTools, MediaTools};
