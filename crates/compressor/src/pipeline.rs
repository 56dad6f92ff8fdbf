//! Pipeline driver
//!
//! Prepares directories, loads the ignore file, scans the input directory and
//! runs the queued jobs one at a time in discovery order. Stops early, without
//! error, when the cancel flag is raised.

use crate::cancel::CancelFlag;
use crate::config::Config;
use crate::ignore::IgnoreRules;
use crate::job_executor::{Job, JobError, JobExecutor, JobOutcome};
use crate::scan::scan_directory;
use crate::stats::RunStats;
use crate::tools::MediaTools;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

const PROGRESS_TEMPLATE: &str = "{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}] {msg}";

/// Error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input directory does not exist
    #[error("Input directory does not exist: {0}")]
    InputDirMissing(PathBuf),

    /// Could not create the output or archive directory
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Ignore file exists but cannot be read
    #[error("Failed to read ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input directory listing failed
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A job failed; the run stops
    #[error("Compressing {path} failed: {source}")]
    Job {
        path: PathBuf,
        #[source]
        source: JobError,
    },
}

/// Directories and settings for one run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory scanned for videos
    pub input_dir: PathBuf,
    /// Directory compressed videos are written to
    pub output_dir: PathBuf,
    /// Directory originals are moved to
    pub archive_dir: PathBuf,
    /// Ignore file; a missing file means no rules
    pub ignore_file: PathBuf,
    pub config: Config,
}

impl PipelineSettings {
    /// Output next to the input, ignore file inside the input directory
    pub fn new(input_dir: PathBuf, archive_dir: PathBuf, config: Config) -> Self {
        let ignore_file = input_dir.join(&config.discovery.ignore_file_name);
        Self {
            output_dir: input_dir.clone(),
            input_dir,
            archive_dir,
            ignore_file,
            config,
        }
    }
}

/// Sequential compression pipeline
pub struct Pipeline {
    settings: PipelineSettings,
    executor: JobExecutor,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings, tools: Arc<dyn MediaTools>, cancel: CancelFlag) -> Self {
        let executor = JobExecutor::new(tools, settings.archive_dir.clone(), cancel.clone());
        Self {
            settings,
            executor,
            cancel,
        }
    }

    /// Run the pipeline and return its stats
    pub async fn run(&self) -> Result<RunStats, PipelineError> {
        let mut stats = RunStats::default();
        self.run_into(&mut stats).await?;
        Ok(stats)
    }

    /// Run the pipeline, accumulating into `stats`
    ///
    /// On error `stats` still holds everything counted before the failure.
    pub async fn run_into(&self, stats: &mut RunStats) -> Result<(), PipelineError> {
        let settings = &self.settings;
        debug!("Starting compression in {}", settings.input_dir.display());
        trace!(
            "Output dir: {} ; Original dir: {}",
            settings.output_dir.display(),
            settings.archive_dir.display()
        );

        self.prepare_directories()?;

        let ignore = IgnoreRules::load(&settings.ignore_file).map_err(|source| {
            PipelineError::IgnoreFile {
                path: settings.ignore_file.clone(),
                source,
            }
        })?;
        debug!("{} ignore rule(s) loaded", ignore.len());

        let candidates = scan_directory(
            &settings.input_dir,
            &settings.config.discovery.extensions,
            &ignore,
            &settings.config.naming.marker,
            stats,
        )
        .map_err(|source| PipelineError::Scan {
            path: settings.input_dir.clone(),
            source,
        })?;
        info!("{} video(s) to compress", candidates.len());

        let progress = new_progress_bar(candidates.len() as u64);

        for candidate in &candidates {
            if self.cancel.is_cancelled() {
                warn!("Interrupted, not starting remaining jobs");
                stats.cancelled = true;
                break;
            }

            let mut job = Job::new(
                candidate,
                &settings.output_dir,
                &settings.config.naming.marker,
                &settings.config.encode,
            )
            .map_err(|source| PipelineError::Job {
                path: candidate.path.clone(),
                source,
            })?;
            progress.set_message(file_label(&job.source));

            let outcome = self
                .executor
                .execute(&mut job)
                .await
                .map_err(|source| PipelineError::Job {
                    path: job.source.clone(),
                    source,
                });
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            };
            debug_assert!(job.state.is_terminal());
            trace!("{} -> {}", job.source.display(), job.state.as_str());

            match outcome {
                JobOutcome::Completed {
                    original_bytes,
                    compressed_bytes,
                    ..
                } => {
                    stats.record_compressed(original_bytes, compressed_bytes);
                    progress.inc(1);
                }
                JobOutcome::Cancelled => {
                    stats.cancelled = true;
                    break;
                }
            }
        }

        progress.finish_and_clear();
        Ok(())
    }

    /// Checks the input directory and creates the output and archive directories
    pub fn prepare_directories(&self) -> Result<(), PipelineError> {
        let settings = &self.settings;
        if !settings.input_dir.is_dir() {
            return Err(PipelineError::InputDirMissing(settings.input_dir.clone()));
        }

        for dir in [&settings.output_dir, &settings.archive_dir] {
            fs::create_dir_all(dir).map_err(|source| PipelineError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Progress over queued jobs, drawn only on an interactive stderr
fn new_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if !io::stderr().is_terminal() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
        return bar;
    }
    match ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        Ok(style) => bar.set_style(style.progress_chars("=> ")),
        Err(e) => debug!("Invalid progress template: {}", e),
    }
    bar
}
