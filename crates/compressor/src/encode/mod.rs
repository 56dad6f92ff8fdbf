//! Encoding modules for the video compressor

pub mod ffmpeg;

pub use ffmpeg::{build_ffmpeg_command, run_ffmpeg, EncodeError, EncodeOutput, EncodeParams};
