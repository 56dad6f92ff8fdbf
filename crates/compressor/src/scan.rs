//! Scanner module for discovering video files in the input directory.
//!
//! Only the top level of the directory is scanned. Files are filtered by
//! extension, by the ignore rules and by the compression marker in their name.

use crate::ignore::IgnoreRules;
use crate::job_executor::JobState;
use crate::stats::RunStats;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A candidate video file discovered during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    /// Full path to the video file.
    pub path: PathBuf,
    /// File size in bytes at discovery time.
    pub size_bytes: u64,
}

/// Checks if a file has one of the given extensions (case-insensitive).
///
/// Extensions may be given with or without the leading dot.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Checks if any dot-separated segment after the first equals the marker.
///
/// `clip.cmp1.mp4` is marked, `cmp1.mp4` and `clip.cmp10.mp4` are not.
/// Names that are not valid UTF-8 are checked on their lossy form.
pub fn has_compression_marker(path: &Path, marker: &str) -> bool {
    path.file_name()
        .map(|name| {
            name.to_string_lossy()
                .split('.')
                .skip(1)
                .any(|segment| segment == marker)
        })
        .unwrap_or(false)
}

/// Builds the compressed file name: `name.ext` -> `name.<marker>.ext`.
///
/// The marker goes before the last extension only, so `a.b.mp4` becomes
/// `a.b.<marker>.mp4`. Names without an extension get the marker appended.
/// The stem is kept byte for byte, so non-UTF-8 names survive.
pub fn compressed_file_name(path: &Path, marker: &str) -> Option<OsString> {
    let mut name = path.file_stem()?.to_os_string();
    name.push(".");
    name.push(marker);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(name)
}

/// Moves a discovered file to `Ignored`, `AlreadyCompressed` or `Queued`.
///
/// Ignore rules win over the marker.
pub fn classify(path: &Path, ignore: &IgnoreRules, marker: &str) -> JobState {
    if ignore.is_ignored(path) {
        JobState::Ignored
    } else if has_compression_marker(path, marker) {
        JobState::AlreadyCompressed
    } else {
        JobState::Queued
    }
}

/// Lists the top-level files of `dir` with a matching extension.
///
/// Order is the directory enumeration order.
pub fn list_videos(dir: &Path, extensions: &[String]) -> io::Result<Vec<ScanCandidate>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;

        if !entry.file_type().is_file() {
            continue;
        }
        if !has_extension(entry.path(), extensions) {
            continue;
        }

        let metadata = entry.metadata().map_err(io::Error::from)?;
        found.push(ScanCandidate {
            path: entry.path().to_path_buf(),
            size_bytes: metadata.len(),
        });
    }

    Ok(found)
}

/// Scans `dir` and returns the files that should be compressed.
///
/// Every extension match counts as found; ignored and already-compressed
/// files are counted separately and dropped.
pub fn scan_directory(
    dir: &Path,
    extensions: &[String],
    ignore: &IgnoreRules,
    marker: &str,
    stats: &mut RunStats,
) -> io::Result<Vec<ScanCandidate>> {
    let mut candidates = Vec::new();

    for candidate in list_videos(dir, extensions)? {
        stats.record_found();
        trace!("{} {}", JobState::Discovered.as_str(), candidate.path.display());

        match classify(&candidate.path, ignore, marker) {
            JobState::Ignored => {
                debug!("Ignoring {} - ignore file", candidate.path.display());
                stats.record_ignored();
            }
            JobState::AlreadyCompressed => {
                trace!("Skipping {} - already compressed", candidate.path.display());
                stats.record_already_compressed();
            }
            _ => candidates.push(candidate),
        }
    }

    Ok(candidates)
}
