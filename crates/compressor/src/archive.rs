//! Archival of originals after a successful encode.
//!
//! The original is moved (never copied and kept) into the archive directory,
//! and its timestamps and permissions are carried over to the encoded file.

use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while archiving an original.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A file with the same name is already in the archive.
    #[error("Archive already contains {0}")]
    AlreadyArchived(PathBuf),

    /// The original has no file name to archive under.
    #[error("Cannot archive path without a file name: {0}")]
    NoFileName(PathBuf),

    /// Failed to move the original into the archive.
    #[error("Failed to move original into archive: {0}")]
    MoveFailed(io::Error),

    /// Failed to copy timestamps or permissions.
    #[error("Failed to copy file metadata: {0}")]
    MetadataFailed(io::Error),
}

/// Location the original will occupy inside the archive directory.
pub fn archive_path(original: &Path, archive_dir: &Path) -> Result<PathBuf, ArchiveError> {
    original
        .file_name()
        .map(|name| archive_dir.join(name))
        .ok_or_else(|| ArchiveError::NoFileName(original.to_path_buf()))
}

/// Copies access/modification times and permissions from `src` to `dst`.
pub fn copy_file_metadata(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::metadata(src)?;
    fs::set_permissions(dst, metadata.permissions())?;

    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dst, atime, mtime)
}

/// Moves `original` into `archive_dir`, returning its new path.
///
/// Tries a rename first and falls back to copy + remove when the archive is
/// on another filesystem. An existing file in the archive is never
/// overwritten.
pub fn archive_original(original: &Path, archive_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let destination = archive_path(original, archive_dir)?;
    if destination.exists() {
        return Err(ArchiveError::AlreadyArchived(destination));
    }

    if fs::rename(original, &destination).is_err() {
        fs::copy(original, &destination).map_err(ArchiveError::MoveFailed)?;
        copy_file_metadata(original, &destination).map_err(ArchiveError::MetadataFailed)?;
        fs::remove_file(original).map_err(ArchiveError::MoveFailed)?;
    }

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &[u8]) {
        let mut file = File::create(path).unwrap();
        file.write_all(content).unwrap();
    }

    #[test]
    fn test_archive_path() {
        let path = archive_path(Path::new("/media/in/clip.mp4"), Path::new("/media/originals"))
            .unwrap();
        assert_eq!(path, PathBuf::from("/media/originals/clip.mp4"));
    }

    #[test]
    fn test_archive_path_without_file_name() {
        let result = archive_path(Path::new("/"), Path::new("/media/originals"));
        assert!(matches!(result, Err(ArchiveError::NoFileName(_))));
    }

    #[test]
    fn test_archive_moves_original() {
        let temp_dir = TempDir::new().unwrap();
        let archive_dir = temp_dir.path().join("originals");
        fs::create_dir_all(&archive_dir).unwrap();

        let original = temp_dir.path().join("clip.mp4");
        write_file(&original, b"original content");

        let archived = archive_original(&original, &archive_dir).unwrap();

        assert!(!original.exists(), "Original should be moved away");
        assert_eq!(archived, archive_dir.join("clip.mp4"));
        assert_eq!(fs::read_to_string(&archived).unwrap(), "original content");
    }

    #[test]
    fn test_archive_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let archive_dir = temp_dir.path().join("originals");
        fs::create_dir_all(&archive_dir).unwrap();

        let original = temp_dir.path().join("clip.mp4");
        write_file(&original, b"new");
        write_file(&archive_dir.join("clip.mp4"), b"older");

        let result = archive_original(&original, &archive_dir);

        assert!(matches!(result, Err(ArchiveError::AlreadyArchived(_))));
        assert!(original.exists());
        assert_eq!(fs::read_to_string(archive_dir.join("clip.mp4")).unwrap(), "older");
    }

    #[test]
    fn test_archive_missing_original_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = archive_original(&temp_dir.path().join("gone.mp4"), temp_dir.path());
        // The archive path equals the original path here, which does not exist either
        assert!(matches!(result, Err(ArchiveError::MoveFailed(_))));
    }

    #[test]
    fn test_copy_file_metadata_carries_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.mp4");
        let dst = temp_dir.path().join("dst.mp4");
        write_file(&src, b"a");
        write_file(&dst, b"b");

        let stamp = FileTime::from_unix_time(1_647_113_617, 0);
        filetime::set_file_times(&src, stamp, stamp).unwrap();

        copy_file_metadata(&src, &dst).unwrap();

        let dst_meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&dst_meta), stamp);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_metadata_carries_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.mp4");
        let dst = temp_dir.path().join("dst.mp4");
        write_file(&src, b"a");
        write_file(&dst, b"b");
        fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();

        copy_file_metadata(&src, &dst).unwrap();

        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
