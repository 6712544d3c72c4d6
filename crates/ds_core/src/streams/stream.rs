//! The byte-oriented random-access stream abstraction (spec.md §4.3).
//!
//! Grounded on `modules/Core/Core/include/DeepSea/Core/Streams/Stream.h`:
//! a stream is read, written, sought, and queried for its current position
//! and remaining length, with every concrete backend (file, memory,
//! archive entry) implementing the same handful of operations. Rust's
//! `std::io::{Read, Write, Seek}` cover read/write/seek already; `Stream`
//! adds two queries (`position`, `remaining_bytes`) the standard traits
//! don't expose directly (seeking to the end and back to measure length is
//! wasteful and not available on non-seekable archive entries).

use crate::error::Result;

/// A readable, writable, seekable byte stream.
///
/// Not every backend supports every operation (a compressed archive entry
/// is typically read-only and non-seekable); backends that don't support an
/// operation return [`crate::error::Error::PermissionDenied`].
pub trait Stream: Send {
    /// Reads up to `buf.len()` bytes, returning the number actually read.
    /// `0` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf`, or fails.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Seeks to `offset` bytes from `origin`.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64>;

    /// Returns the current byte offset from the start of the stream.
    fn position(&mut self) -> Result<u64> {
        self.seek(0, SeekOrigin::Current)
    }

    /// Returns the number of bytes from the current position to the end of
    /// the stream, if the backend can report it without destructively
    /// consuming data (most archive entries can't).
    fn remaining_bytes(&mut self) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Flushes any buffered writes to the backing store.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Resets the stream back to its start, for backends that can re-read
    /// from the beginning without reopening (a plain file can; a
    /// non-seekable archive entry or pipe typically can't).
    fn restart(&mut self) -> Result<()> {
        Err(crate::error::Error::PermissionDenied(
            "this stream is not restartable".into(),
        ))
    }

    /// True if [`Stream::restart`] is expected to succeed on this stream.
    fn is_restartable(&self) -> bool {
        false
    }
}

/// The reference point a [`Stream::seek`] offset is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Begin,
    Current,
    End,
}

/// Reads `buf.len()` bytes exactly, looping over short reads, and failing
/// with [`crate::error::Error::Io`] on premature end of stream. A
/// "must fill the buffer or error" convenience used throughout the
/// archive/resource loaders.
pub fn read_exact(stream: &mut dyn Stream, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(crate::error::Error::Io(
                "unexpected end of stream before buffer was filled".into(),
            ));
        }
        filled += n;
    }
    Ok(())
}

/// Reads from `stream`'s current position to its end, appending to `buf`,
/// and returns the number of bytes appended. Sizes `buf`'s reservation
/// exactly when [`Stream::remaining_bytes`] can report a length up front;
/// falls back to growing in fixed-size chunks for backends (most archive
/// entries) that can't.
pub fn read_until_end(stream: &mut dyn Stream, buf: &mut Vec<u8>) -> Result<usize> {
    let start_len = buf.len();
    if let Some(remaining) = stream.remaining_bytes()? {
        let remaining = remaining as usize;
        buf.resize(start_len + remaining, 0);
        read_exact(stream, &mut buf[start_len..])?;
        return Ok(remaining);
    }

    const CHUNK: usize = 4096;
    loop {
        let filled = buf.len();
        buf.resize(filled + CHUNK, 0);
        let n = stream.read(&mut buf[filled..])?;
        buf.truncate(filled + n);
        if n == 0 {
            break;
        }
    }
    Ok(buf.len() - start_len)
}
