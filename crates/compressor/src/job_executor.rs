//! Job executor module
//!
//! Runs one compression job: precondition check, probe, encode, metadata
//! copy and archival of the original. Cancellation during an external tool
//! call is reported as an outcome, not an error.

use crate::archive::{archive_original, copy_file_metadata, ArchiveError};
use crate::cancel::CancelFlag;
use crate::encode::{EncodeError, EncodeParams};
use crate::probe::ProbeError;
use crate::scale::video_filter;
use crate::scan::{compressed_file_name, ScanCandidate};
use crate::tools::MediaTools;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};
use video_compressor_config::EncodeConfig;

/// Error type for job execution operations
#[derive(Debug, Error)]
pub enum JobError {
    /// Destination existed before the encode started
    #[error("Output file {0} already exists")]
    OutputExists(PathBuf),

    /// No compressed name can be derived for the source
    #[error("Cannot derive an output name for {0}")]
    InvalidFileName(PathBuf),

    /// Dimension probe failed
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    /// Encoding failed
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Moving the original or copying its metadata failed
    #[error("Archival failed: {0}")]
    Archive(#[from] ArchiveError),

    /// Reading file sizes failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The blocking task running an external tool panicked
    #[error("External tool task panicked: {0}")]
    TaskPanicked(String),
}

/// Per-file state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Found by the scanner
    Discovered,
    /// Matched an ignore rule
    Ignored,
    /// Name already carries the compression marker
    AlreadyCompressed,
    /// Waiting for its turn
    Queued,
    /// ffmpeg is running
    Compressing,
    /// Encoded and original archived
    Completed,
    /// Interrupted by the operator
    Cancelled,
    /// Job failed
    Failed(String),
}

impl JobState {
    /// Convert state to string for logs
    pub fn as_str(&self) -> &str {
        match self {
            JobState::Discovered => "discovered",
            JobState::Ignored => "ignored",
            JobState::AlreadyCompressed => "already_compressed",
            JobState::Queued => "queued",
            JobState::Compressing => "compressing",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            JobState::Discovered | JobState::Queued | JobState::Compressing
        )
    }
}

/// One compression job
#[derive(Debug, Clone)]
pub struct Job {
    /// Path to the original video
    pub source: PathBuf,
    /// Path the compressed video is written to
    pub destination: PathBuf,
    /// Long-edge resolution cap
    pub max_resolution: u32,
    /// Output frame rate
    pub fps: u32,
    /// ffmpeg codec selector
    pub codec: String,
    /// Encoder thread count, None = automatic
    pub threads: Option<u32>,
    /// Current state of the job
    pub state: JobState,
    /// Original file size in bytes at discovery
    pub size_in_bytes_before: u64,
}

impl Job {
    /// Derive a queued job from a scan candidate
    ///
    /// The destination is `<output_dir>/<stem>.<marker>.<ext>`.
    pub fn new(
        candidate: &ScanCandidate,
        output_dir: &Path,
        marker: &str,
        encode: &EncodeConfig,
    ) -> Result<Self, JobError> {
        let name = compressed_file_name(&candidate.path, marker)
            .ok_or_else(|| JobError::InvalidFileName(candidate.path.clone()))?;

        Ok(Self {
            source: candidate.path.clone(),
            destination: output_dir.join(name),
            max_resolution: encode.max_resolution,
            fps: encode.fps,
            codec: encode.codec.clone(),
            threads: encode.threads,
            state: JobState::Queued,
            size_in_bytes_before: candidate.size_bytes,
        })
    }
}

/// How a job that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed {
        original_bytes: u64,
        compressed_bytes: u64,
        archived_to: PathBuf,
    },
    Cancelled,
}

/// Executes jobs one at a time against a set of media tools
pub struct JobExecutor {
    tools: Arc<dyn MediaTools>,
    archive_dir: PathBuf,
    cancel: CancelFlag,
}

impl JobExecutor {
    pub fn new(tools: Arc<dyn MediaTools>, archive_dir: PathBuf, cancel: CancelFlag) -> Self {
        Self {
            tools,
            archive_dir,
            cancel,
        }
    }

    /// Execute a job through the whole pipeline
    ///
    /// 1. Fails if the destination already exists, before any tool runs
    /// 2. Probes the source dimensions
    /// 3. Runs ffmpeg with the derived scale/fps filter
    /// 4. Copies timestamps and permissions onto the output
    /// 5. Moves the original into the archive directory
    ///
    /// If ffprobe or ffmpeg fails while the cancel flag is raised, any partial
    /// output is removed and `JobOutcome::Cancelled` is returned.
    pub async fn execute(&self, job: &mut Job) -> Result<JobOutcome, JobError> {
        info!("Compressing {}", job.source.display());

        if job.destination.exists() {
            let err = JobError::OutputExists(job.destination.clone());
            job.state = JobState::Failed(err.to_string());
            return Err(err);
        }
        debug!("Output file {}", job.destination.display());

        job.state = JobState::Compressing;

        match self.compress(job).await {
            Ok(outcome) => {
                job.state = match outcome {
                    JobOutcome::Completed { .. } => JobState::Completed,
                    JobOutcome::Cancelled => JobState::Cancelled,
                };
                Ok(outcome)
            }
            Err(e) => {
                job.state = JobState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn compress(&self, job: &Job) -> Result<JobOutcome, JobError> {
        let probe_result = {
            let tools = self.tools.clone();
            let source = job.source.clone();
            tokio::task::spawn_blocking(move || tools.probe(&source))
                .await
                .map_err(|e| JobError::TaskPanicked(e.to_string()))?
        };

        let dims = match probe_result {
            Ok(dims) => dims,
            Err(e) if self.cancel.is_cancelled() => {
                debug!("Probe of {} stopped by interrupt: {}", job.source.display(), e);
                warn!("Cancelled {}", job.source.display());
                return Ok(JobOutcome::Cancelled);
            }
            Err(e) => return Err(e.into()),
        };
        trace!("{} is {}", job.source.display(), dims);

        let params = EncodeParams {
            input_path: job.source.clone(),
            output_path: job.destination.clone(),
            video_filter: video_filter(dims, job.max_resolution, job.fps),
            codec: job.codec.clone(),
            threads: job.threads,
        };
        debug!("Video filter {}", params.video_filter);

        let encode_result = {
            let tools = self.tools.clone();
            let cancel = self.cancel.clone();
            tokio::task::spawn_blocking(move || tools.transcode(&params, &cancel))
                .await
                .map_err(|e| JobError::TaskPanicked(e.to_string()))?
        };

        let output = match encode_result {
            Ok(output) => output,
            Err(e) if self.cancel.is_cancelled() => {
                debug!("Encode of {} stopped by interrupt: {}", job.source.display(), e);
                remove_partial_output(&job.destination);
                warn!("Cancelled {}", job.source.display());
                return Ok(JobOutcome::Cancelled);
            }
            Err(e) => {
                error!("Encoding {} failed: {}", job.source.display(), e);
                remove_partial_output(&job.destination);
                return Err(e.into());
            }
        };
        trace!("{}", output.stdout);
        trace!("{}", output.stderr);

        copy_file_metadata(&job.source, &job.destination).map_err(ArchiveError::MetadataFailed)?;

        let original_bytes = fs::metadata(&job.source)?.len();
        let compressed_bytes = fs::metadata(&job.destination)?.len();

        let archived_to = archive_original(&job.source, &self.archive_dir)?;
        debug!("Moved original to {}", archived_to.display());

        Ok(JobOutcome::Completed {
            original_bytes,
            compressed_bytes,
            archived_to,
        })
    }
}

/// Deletes a half-written output, if ffmpeg got far enough to create one
fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}
