//! CLI entry point for the video compressor
//!
//! Parses command line arguments, sets up logging and configuration, and runs
//! the compression pipeline once.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use video_compressor::{
    init_logging, install_ctrl_c_handler, run_startup_checks, CancelFlag, Config, FfmpegTools,
    Pipeline, PipelineSettings, RunStats,
};

/// Exit status when the pipeline aborts with an error
const EXIT_PIPELINE_ERROR: u8 = 10;

/// Compress videos with ffmpeg: capped resolution, fixed frame rate, originals archived
#[derive(Parser, Debug)]
#[command(name = "compress-videos")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input dir with uncompressed videos
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Output dir for originals
    #[arg(long, default_value = "../../_camera_originals")]
    originals: PathBuf,

    /// Output dir for compressed videos [default: input dir]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Ignore file listing globs to skip [default: <input>/.cmpignore]
    #[arg(long)]
    cmpignore: Option<PathBuf>,

    /// Verbose logging - all levels
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Log file location
    #[arg(long, default_value = "compress_videos.log")]
    log_file: PathBuf,

    /// Encoder threads [default: automatic]
    #[arg(long)]
    threads: Option<u32>,

    /// Path to a configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip ffmpeg/ffprobe availability checks
    #[arg(long, default_value = "false")]
    skip_checks: bool,
}

impl Args {
    fn pipeline_settings(&self, config: Config) -> PipelineSettings {
        let mut settings = PipelineSettings::new(self.input.clone(), self.originals.clone(), config);
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(cmpignore) = &self.cmpignore {
            settings.ignore_file = cmpignore.clone();
        }
        settings
    }
}

fn load_config(args: &Args) -> Result<Config, video_compressor::config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(threads) = args.threads {
        config.encode.threads = Some(threads);
        config.validate()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match init_logging(args.verbose, &args.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.skip_checks {
        warn!("Skipping startup checks (--skip-checks enabled)");
    } else if let Err(e) = run_startup_checks(&config.tools) {
        error!("Startup check failed: {}", e);
        return ExitCode::FAILURE;
    }

    let tools = Arc::new(FfmpegTools::from_config(&config.tools));
    let settings = args.pipeline_settings(config);

    let cancel = CancelFlag::new();
    let _ctrl_c = install_ctrl_c_handler(cancel.clone());

    let pipeline = Pipeline::new(settings, tools, cancel);
    let mut stats = RunStats::default();
    let result = pipeline.run_into(&mut stats).await;

    stats.log_summary();

    match result {
        Ok(()) if stats.cancelled => {
            info!("Stopped on interrupt");
            ExitCode::SUCCESS
        }
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_PIPELINE_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["compress-videos"]);
        assert_eq!(args.input, PathBuf::from("."));
        assert_eq!(args.originals, PathBuf::from("../../_camera_originals"));
        assert_eq!(args.log_file, PathBuf::from("compress_videos.log"));
        assert!(!args.verbose);
        assert!(args.threads.is_none());

        let settings = args.pipeline_settings(Config::default());
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert_eq!(settings.ignore_file, PathBuf::from("./.cmpignore"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "compress-videos",
            "-i",
            "/media/in",
            "-o",
            "/media/out",
            "--originals",
            "/media/orig",
            "--cmpignore",
            "/etc/cmpignore",
            "-v",
        ]);
        assert!(args.verbose);

        let settings = args.pipeline_settings(Config::default());
        assert_eq!(settings.input_dir, PathBuf::from("/media/in"));
        assert_eq!(settings.output_dir, PathBuf::from("/media/out"));
        assert_eq!(settings.archive_dir, PathBuf::from("/media/orig"));
        assert_eq!(settings.ignore_file, PathBuf::from("/etc/cmpignore"));
    }

    #[test]
    fn test_threads_flag_overrides_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[encode]\nthreads = 2\n").unwrap();

        let args = Args::parse_from([
            "compress-videos",
            "--config",
            path.to_str().unwrap(),
            "--threads",
            "6",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.encode.threads, Some(6));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let args = Args::parse_from([
            "compress-videos",
            "--config",
            path.to_str().unwrap(),
            "--threads",
            "0",
        ]);
        assert!(load_config(&args).is_err());
    }
}
