//! Virtual file archives (spec.md §4.3).
//!
//! Grounded on the family of archive headers under
//! `Core/include/DeepSea/Core/Streams/` (`FileArchive.h`,
//! `ResourceStream.h`): a [`FileArchive`] resolves a logical path to a
//! readable [`Stream`], regardless of whether that path lives on the local
//! filesystem, inside a packed resource bundle, or (on Android) inside the
//! APK's asset bundle. The three backends share one trait so the resource
//! manager never has to know which kind of archive a given path root maps
//! to.

use std::path::{Path, PathBuf};

use crate::error::{track_error, Error, Result};
use crate::streams::file_stream::{FileMode, FileStream};
use crate::streams::stream::Stream;

/// What a path inside an archive resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Missing,
    File,
    Directory,
}

/// One entry yielded while iterating a directory opened via
/// [`FileArchive::open_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub status: PathStatus,
}

/// Yields the entries of a directory opened via
/// [`FileArchive::open_directory`], skipping `.` and `..`. There is no
/// separate "close" call: dropping the iterator closes the underlying
/// directory handle.
pub trait DirectoryIterator: Send {
    /// Returns the next entry, or `None` once the directory is exhausted.
    fn next_directory_entry(&mut self) -> Result<Option<DirectoryEntry>>;
}

/// A source of readable streams keyed by logical path.
pub trait FileArchive: Send + Sync {
    /// Opens `path` for reading.
    fn open(&self, path: &str) -> Result<Box<dyn Stream>>;

    /// Reports whether `path` exists, and if so, as what.
    fn status(&self, path: &str) -> Result<PathStatus>;

    /// Opens `path` for directory iteration. Fails if `path` is missing or
    /// names a file.
    fn open_directory(&self, path: &str) -> Result<Box<dyn DirectoryIterator>>;
}

/// An archive backed directly by a directory on the local filesystem.
/// Covers both the plain "local" archive case and, on Android, the portion
/// of asset resolution that falls back to extracted files — the
/// packed-asset-bundle case itself is out of this subsystem's scope (no
/// equivalent of the Android NDK asset manager exists to bind against from
/// portable Rust).
pub struct LocalFileArchive {
    root: PathBuf,
}

impl LocalFileArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute() {
            return Err(track_error(Error::InvalidArgument(format!(
                "archive paths must be relative, got {path}"
            ))));
        }
        Ok(self.root.join(relative))
    }
}

impl FileArchive for LocalFileArchive {
    fn open(&self, path: &str) -> Result<Box<dyn Stream>> {
        let full = self.resolve(path)?;
        match self.status(path)? {
            PathStatus::Missing => Err(track_error(Error::NotFound(format!(
                "{path} not found in archive"
            )))),
            PathStatus::Directory => Err(track_error(Error::InvalidArgument(format!(
                "{path} is a directory"
            )))),
            PathStatus::File => {
                Ok(Box::new(FileStream::open(full, FileMode::Read)?))
            }
        }
    }

    fn status(&self, path: &str) -> Result<PathStatus> {
        let full = self.resolve(path)?;
        match full.metadata() {
            Ok(meta) if meta.is_dir() => Ok(PathStatus::Directory),
            Ok(_) => Ok(PathStatus::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PathStatus::Missing),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn open_directory(&self, path: &str) -> Result<Box<dyn DirectoryIterator>> {
        let full = self.resolve(path)?;
        match self.status(path)? {
            PathStatus::Missing => Err(track_error(Error::NotFound(format!(
                "{path} not found in archive"
            )))),
            PathStatus::File => Err(track_error(Error::InvalidArgument(format!(
                "{path} is a file, not a directory"
            )))),
            PathStatus::Directory => {
                let entries = std::fs::read_dir(&full).map_err(Error::from)?;
                Ok(Box::new(LocalDirectoryIterator { entries }))
            }
        }
    }
}

struct LocalDirectoryIterator {
    entries: std::fs::ReadDir,
}

impl DirectoryIterator for LocalDirectoryIterator {
    fn next_directory_entry(&mut self) -> Result<Option<DirectoryEntry>> {
        for entry in self.entries.by_ref() {
            let entry = entry.map_err(Error::from)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "." || name == ".." {
                continue;
            }
            let status = if entry.file_type().map_err(Error::from)?.is_dir() {
                PathStatus::Directory
            } else {
                PathStatus::File
            };
            return Ok(Some(DirectoryEntry { name, status }));
        }
        Ok(None)
    }
}
