//! Dimension probing via ffprobe.
//!
//! Asks ffprobe for the first video stream's size as a single `WxH` line.

use crate::scale::Dimensions;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::trace;

/// Error type for probe operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// ffprobe exited with a non-zero status.
    #[error("ffprobe failed: {0}")]
    FfprobeFailed(String),

    /// ffprobe output is not a `WxH` pair of positive integers.
    #[error("Unexpected ffprobe output: {0:?}")]
    Malformed(String),

    /// IO error while starting ffprobe.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the ffprobe command that prints `<width>x<height>`.
pub fn build_probe_command(ffprobe: &str, path: &Path) -> Command {
    let mut cmd = Command::new(ffprobe);
    cmd.args([
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=width,height",
        "-of",
        "csv=p=0:s=x",
    ]);
    cmd.arg(path);
    cmd
}

/// Probes the first video stream of `path`.
pub fn probe_dimensions(ffprobe: &str, path: &Path) -> Result<Dimensions, ProbeError> {
    let output = build_probe_command(ffprobe, path).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::FfprobeFailed(format!(
            "ffprobe exited with status {} for {}: {}",
            output.status,
            path.display(),
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let dims = parse_dimensions(&stdout)?;
    trace!("Probed {}: {}", path.display(), dims);
    Ok(dims)
}

/// Parses `"<width>x<height>"` (surrounding whitespace allowed).
pub fn parse_dimensions(output: &str) -> Result<Dimensions, ProbeError> {
    let malformed = || ProbeError::Malformed(output.to_string());

    let mut parts = output.trim().split('x');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let width: u32 = w.trim().parse().map_err(|_| malformed())?;
    let height: u32 = h.trim().parse().map_err(|_| malformed())?;
    if width == 0 || height == 0 {
        return Err(malformed());
    }

    Ok(Dimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("1920x1080\n").unwrap(), Dimensions::new(1920, 1080));
        assert_eq!(parse_dimensions("  720x1280 ").unwrap(), Dimensions::new(720, 1280));
    }

    #[test]
    fn test_parse_dimensions_rejects_malformed() {
        for bad in ["", "1920", "1920x", "x1080", "1920x1080x1", "axb", "0x1080", "1920,1080"] {
            let err = parse_dimensions(bad).unwrap_err();
            match err {
                ProbeError::Malformed(raw) => assert_eq!(raw, bad),
                other => panic!("expected Malformed for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_parse_dimensions_rejects_two_streams() {
        assert!(matches!(
            parse_dimensions("1920x1080\n1280x720\n"),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[test]
    fn test_build_probe_command() {
        let cmd = build_probe_command("ffprobe", Path::new("/media/clip.mp4"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(cmd.get_program(), std::ffi::OsStr::new("ffprobe"));
        assert_eq!(
            args,
            vec![
                "-v", "error", "-select_streams", "v:0", "-show_entries",
                "stream=width,height", "-of", "csv=p=0:s=x", "/media/clip.mp4",
            ]
        );
    }

    #[test]
    fn test_probe_missing_binary_is_io_error() {
        let result = probe_dimensions("/nonexistent/ffprobe-binary", Path::new("a.mp4"));
        assert!(matches!(result, Err(ProbeError::Io(_))));
    }

    #[cfg(unix)]
    mod with_fake_ffprobe {
        use super::super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_tool(dir: &TempDir, body: &str) -> String {
            let path = dir.path().join("fake-ffprobe");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().to_string()
        }

        #[test]
        fn test_probe_reads_stdout() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 1080x720");
            let dims = probe_dimensions(&tool, Path::new("video.mp4")).unwrap();
            assert_eq!(dims, Dimensions::new(1080, 720));
        }

        #[test]
        fn test_probe_non_zero_exit_fails() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 'no such file' >&2; exit 1");
            let err = probe_dimensions(&tool, Path::new("video.mp4")).unwrap_err();
            match err {
                ProbeError::FfprobeFailed(msg) => assert!(msg.contains("no such file")),
                other => panic!("expected FfprobeFailed, got {:?}", other),
            }
        }

        #[test]
        fn test_probe_garbage_output_is_malformed() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo N/A");
            let err = probe_dimensions(&tool, Path::new("video.mp4")).unwrap_err();
            assert!(matches!(err, ProbeError::Malformed(ref raw) if raw.trim() == "N/A"));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_parse_accepts_positive_pairs(width in 1u32..100_000, height in 1u32..100_000) {
            let parsed = parse_dimensions(&format!("{}x{}\n", width, height)).unwrap();
            prop_assert_eq!(parsed, Dimensions::new(width, height));
        }
    }
}
