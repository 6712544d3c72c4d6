//! Thread creation/join/sleep wrappers (spec.md §4.2).
//!
//! Wraps the platform thread APIs (`pthread`/Win32) behind a single handle
//! with create/join/detach/sleep/exit. `std::thread` already gives the
//! same shape on every platform DeepSea targets, so this module is a thin
//! naming layer rather than a reimplementation.

use std::time::Duration;

use crate::error::{track_error, Error, Result};
use crate::profile::{CallSite, ScopeGuard, ScopeType};

/// Identifies an OS thread, independent of whether it is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(std::thread::ThreadId);

/// A joinable thread handle.
pub struct Thread {
    handle: Option<std::thread::JoinHandle<()>>,
    id: ThreadId,
}

impl Thread {
    /// Spawns `f` on a new OS thread, optionally named `name` (surfaced in
    /// panics and most OS-level debuggers/profilers) and with a
    /// `stack_size` override in bytes (the platform default is used when
    /// `None`).
    pub fn spawn(
        name: Option<&str>,
        stack_size: Option<usize>,
        f: impl FnOnce() + Send + 'static,
    ) -> Result<Self> {
        let mut builder = std::thread::Builder::new();
        if let Some(name) = name {
            builder = builder.name(name.to_string());
        }
        if let Some(stack_size) = stack_size {
            builder = builder.stack_size(stack_size);
        }
        let handle = builder
            .spawn(f)
            .map_err(|e| track_error(Error::Io(format!("failed to spawn thread: {e}"))))?;
        let id = ThreadId(handle.thread().id());
        Ok(Self {
            handle: Some(handle),
            id,
        })
    }

    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Blocks until the thread finishes. Joining more than once, or a
    /// thread that panicked, is reported as an error rather than panicking
    /// the caller.
    pub fn join(mut self) -> Result<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| track_error(Error::InvalidArgument("thread already joined".into())))?;
        handle.join().map_err(|_| {
            track_error(Error::Io(
                "thread panicked before it could be joined".into(),
            ))
        })
    }

    /// Detaches the thread, letting it run to completion independently.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

/// Returns the id of the calling thread.
#[must_use]
pub fn current_id() -> ThreadId {
    ThreadId(std::thread::current().id())
}

/// Suspends the calling thread for at least `duration`. `name` identifies
/// the wait in the profiler's `Wait`-scope timeline (e.g. `"vsync"`,
/// `"job queue"`), not the thread itself.
pub fn sleep(duration: Duration, name: &str) {
    let _guard = ScopeGuard::new(
        ScopeType::Wait,
        name,
        CallSite {
            file: file!(),
            function: "ds_core::thread::sleep",
            line: line!(),
        },
    );
    std::thread::sleep(duration);
}

/// Yields the remainder of the calling thread's current scheduling slice.
pub fn yield_now() {
    std::thread::yield_now();
}
