//! `FileStream`: a [`Stream`] backed by an OS file handle.
//!
//! Grounded on the local-archive case of
//! `Core/include/DeepSea/Core/Streams/ResourceStream.h`: the common path
//! plain files take through the stream abstraction, with `std::fs::File`
//! standing in for a platform file handle.

use std::fs::File;
use std::io::{Read as _, Seek as _, SeekFrom, Write as _};
use std::path::Path;

use crate::error::{track_error, Error, Result};
use crate::streams::stream::{SeekOrigin, Stream};

/// How a [`FileStream`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    ReadWrite,
    Append,
}

pub struct FileStream {
    file: File,
}

impl FileStream {
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let path = path.as_ref();
        let mut options = std::fs::OpenOptions::new();
        match mode {
            FileMode::Read => {
                options.read(true);
            }
            FileMode::Write => {
                options.write(true).create(true).truncate(true);
            }
            FileMode::ReadWrite => {
                options.read(true).write(true).create(true);
            }
            FileMode::Append => {
                options.write(true).create(true).append(true);
            }
        }
        let file = options.open(path).map_err(|e| {
            track_error(Error::Io(format!("failed to open {}: {e}", path.display())))
        })?;
        Ok(Self { file })
    }
}

impl Stream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file.write(buf).map_err(Error::from)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let from = match origin {
            SeekOrigin::Begin => SeekFrom::Start(offset.max(0) as u64),
            SeekOrigin::Current => SeekFrom::Current(offset),
            SeekOrigin::End => SeekFrom::End(offset),
        };
        self.file.seek(from).map_err(Error::from)
    }

    fn remaining_bytes(&mut self) -> Result<Option<u64>> {
        let current = self.file.stream_position().map_err(Error::from)?;
        let len = self.file.metadata().map_err(Error::from)?.len();
        Ok(Some(len.saturating_sub(current)))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(Error::from)
    }

    fn restart(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0)).map_err(Error::from)?;
        Ok(())
    }

    fn is_restartable(&self) -> bool {
        true
    }
}
