//! Error taxonomy shared by every DeepSea crate.
//!
//! One flat `thiserror`-based enum of error *kinds* (spec.md §7), not a
//! tree of per-module error types, since nearly every DeepSea entry point
//! can only fail in one of these ways.

use std::cell::Cell;

use thiserror::Error;

/// The error taxonomy from spec.md §7.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A precondition on inputs was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failed, including allocator-limit exhaustion.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// An index or byte offset exceeds a container's capacity.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A named resource, node, or archive entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks the required context (missing `ResourceContext`,
    /// wrong thread, disabled backend feature, ...).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A binary blob failed verification.
    #[error("format error: {0}")]
    Format(String),

    /// The underlying stream or OS call failed.
    #[error("io error: {0}")]
    Io(String),

    /// A user-provided buffer is too small to hold the result.
    #[error("buffer too small: {0}")]
    Size(String),
}

impl Error {
    /// The error kind, with the associated message stripped.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Error::OutOfRange(_) => ErrorKind::OutOfRange,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::Format(_) => ErrorKind::Format,
            Error::Io(_) => ErrorKind::Io,
            Error::Size(_) => ErrorKind::Size,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// The error taxonomy with no attached message, for the thread-local
/// "last error" cell kept for C-API-compatibility callers (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[default]
    None,
    InvalidArgument,
    OutOfMemory,
    OutOfRange,
    NotFound,
    PermissionDenied,
    Format,
    Io,
    Size,
}

thread_local! {
    static LAST_ERROR: Cell<ErrorKind> = const { Cell::new(ErrorKind::None) };
}

/// Records the kind of the most recent error for this thread.
///
/// This is not the primary error channel (every fallible call here still
/// returns a `Result<_, Error>`); it exists only so that a C-API shim layer
/// built on top of these crates can report an `errno`-style last error
/// without threading a `Result` through an ABI boundary.
pub fn set_last_error(kind: ErrorKind) {
    LAST_ERROR.with(|cell| cell.set(kind));
}

/// Reads back the kind set by the most recent [`set_last_error`] call on
/// this thread.
#[must_use]
pub fn last_error() -> ErrorKind {
    LAST_ERROR.with(Cell::get)
}

/// Convenience alias used throughout the DeepSea crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Records `err`'s kind in the thread-local last-error cell and returns it
/// unchanged, for use at the tail of a fallible function:
/// `foo().map_err(track_error)`.
pub fn track_error(err: Error) -> Error {
    set_last_error(err.kind());
    err
}
