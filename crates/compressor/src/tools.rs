//! External media tools used by the pipeline.

use crate::cancel::CancelFlag;
use crate::encode::{run_ffmpeg, EncodeError, EncodeOutput, EncodeParams};
use crate::probe::{probe_dimensions, ProbeError};
use crate::scale::Dimensions;
use std::path::Path;
use video_compressor_config::ToolsConfig;

/// The two external capabilities a job needs.
///
/// Calls are blocking; the pipeline runs them on the blocking thread pool.
pub trait MediaTools: Send + Sync {
    /// Width and height of the first video stream.
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError>;

    /// Runs one encode to completion, or until `cancel` is raised.
    fn transcode(&self, params: &EncodeParams, cancel: &CancelFlag)
        -> Result<EncodeOutput, EncodeError>;
}

/// ffprobe + ffmpeg from the configured locations.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegTools {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(cfg: &ToolsConfig) -> Self {
        Self::new(cfg.ffmpeg.clone(), cfg.ffprobe.clone())
    }
}

impl MediaTools for FfmpegTools {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        probe_dimensions(&self.ffprobe, path)
    }

    fn transcode(
        &self,
        params: &EncodeParams,
        cancel: &CancelFlag,
    ) -> Result<EncodeOutput, EncodeError> {
        run_ffmpeg(&self.ffmpeg, params, cancel)
    }
}
