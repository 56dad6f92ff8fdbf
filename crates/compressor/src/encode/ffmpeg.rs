//! ffmpeg encoder module
//!
//! Builds and executes the ffmpeg re-encode command: scale + frame rate
//! filter, fixed codec, metadata carried over from the input.

use crate::cancel::CancelFlag;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// How often a running encode checks the cancel flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Error type for encoding operations
#[derive(Debug, Error)]
pub enum EncodeError {
    /// ffmpeg exited with non-zero status
    #[error("ffmpeg failed with exit code {code}:\n{output}")]
    FfmpegFailed { code: i32, output: String },

    /// ffmpeg was terminated by a signal
    #[error("ffmpeg was terminated by signal:\n{output}")]
    FfmpegTerminated { output: String },

    /// IO error while running ffmpeg
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for one ffmpeg encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    /// Path to the input video file
    pub input_path: PathBuf,
    /// Path for the encoded output file
    pub output_path: PathBuf,
    /// Value passed to `-vf` (scale and fps filters)
    pub video_filter: String,
    /// Value passed to `-c:v`
    pub codec: String,
    /// Value passed to `-threads`, omitted when None
    pub threads: Option<u32>,
}

/// Captured output of a finished ffmpeg run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOutput {
    pub stdout: String,
    pub stderr: String,
}

impl EncodeOutput {
    /// stdout and stderr joined for error reports
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Build the ffmpeg command for an encode
///
/// `ffmpeg -i <in> -map_metadata 0 -vf <filter> -c:v <codec> [-threads N] <out>`
pub fn build_ffmpeg_command(ffmpeg: &str, params: &EncodeParams) -> Command {
    let mut cmd = Command::new(ffmpeg);

    cmd.arg("-i").arg(&params.input_path);

    // Keep container metadata (creation time etc.) from the input
    cmd.arg("-map_metadata").arg("0");

    cmd.arg("-vf").arg(&params.video_filter);
    cmd.arg("-c:v").arg(&params.codec);

    if let Some(threads) = params.threads {
        cmd.arg("-threads").arg(threads.to_string());
    }

    cmd.arg(&params.output_path);

    cmd
}

/// Execute an ffmpeg encode
///
/// Output is captured. If `cancel` is raised while ffmpeg runs, the process
/// is killed and its non-zero exit is returned like any other failure; the
/// caller decides whether that counts as a cancellation.
pub fn run_ffmpeg(
    ffmpeg: &str,
    params: &EncodeParams,
    cancel: &CancelFlag,
) -> Result<EncodeOutput, EncodeError> {
    let mut cmd = build_ffmpeg_command(ffmpeg, params);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            // Fails only if the child already exited, which wait() reports
            let _ = child.kill();
            break child.wait()?;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = EncodeOutput {
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    };

    if status.success() {
        Ok(output)
    } else {
        match status.code() {
            Some(code) => Err(EncodeError::FfmpegFailed {
                code,
                output: output.combined(),
            }),
            None => Err(EncodeError::FfmpegTerminated {
                output: output.combined(),
            }),
        }
    }
}

/// Drains a child pipe on its own thread so ffmpeg never blocks on a full pipe
fn spawn_reader<R>(pipe: Option<R>) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
