//! Resource path roots (spec.md §4.3), grounded on
//! `modules/Core/Core/include/DeepSea/Core/Streams/ResourceStream.h`'s
//! `dsResourceStream_setContext`/`dsResourceStream_getDirectory`: embedded,
//! local, and dynamic data directories are process-global configuration,
//! set once during startup and read by every subsystem that opens a
//! resource by logical path afterward.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{track_error, Error, Result};

/// Which of the three resource roots a logical path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRoot {
    /// Read-only data shipped inside the application bundle.
    Embedded,
    /// Read-only data installed alongside the application (OS package data
    /// directories, DLC, ...).
    Local,
    /// Read-write data the application generates at runtime (save games,
    /// caches, ...).
    Dynamic,
}

/// The three process-global resource directories.
#[derive(Debug, Clone)]
pub struct ResourceRoots {
    pub embedded: PathBuf,
    pub local: PathBuf,
    pub dynamic: PathBuf,
}

static ROOTS: OnceLock<ResourceRoots> = OnceLock::new();

/// Installs the process-wide resource roots. Must be called at most once;
/// a second call is rejected so one subsystem can't silently redirect
/// another's already-opened archives mid-run.
pub fn set_resource_roots(roots: ResourceRoots) -> Result<()> {
    ROOTS.set(roots).map_err(|_| {
        track_error(Error::PermissionDenied(
            "resource roots were already set".into(),
        ))
    })
}

/// Returns the process-wide resource roots, if [`set_resource_roots`] has
/// been called.
#[must_use]
pub fn resource_roots() -> Option<&'static ResourceRoots> {
    ROOTS.get()
}

/// The result of a [`status`] query: what a logical path resolves to once
/// every resource root has been checked, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathQueryStatus {
    Missing,
    ExistsFile,
    ExistsDirectory,
    Error,
}

/// Checks `path` against the embedded, local, and dynamic roots in that
/// priority order, returning the first root where it resolves to something.
/// Unlike [`resolve`], this never fails: an unset root configuration or an
/// invalid path both collapse into [`PathQueryStatus::Error`] rather than a
/// `Result`, since callers typically just want to branch on where (if
/// anywhere) a path lives.
#[must_use]
pub fn status(path: &str) -> PathQueryStatus {
    let Some(roots) = resource_roots() else {
        return PathQueryStatus::Error;
    };
    let relative = Path::new(path);
    if relative.is_absolute() {
        return PathQueryStatus::Error;
    }
    for base in [&roots.embedded, &roots.local, &roots.dynamic] {
        match base.join(relative).metadata() {
            Ok(meta) if meta.is_dir() => return PathQueryStatus::ExistsDirectory,
            Ok(_) => return PathQueryStatus::ExistsFile,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(_) => return PathQueryStatus::Error,
        }
    }
    PathQueryStatus::Missing
}

/// Resolves `path`, relative to `root`, to an absolute filesystem path.
pub fn resolve(root: ResourceRoot, path: &str) -> Result<PathBuf> {
    let roots = resource_roots().ok_or_else(|| {
        track_error(Error::PermissionDenied(
            "resource roots have not been set".into(),
        ))
    })?;
    let relative = Path::new(path);
    if relative.is_absolute() {
        return Err(track_error(Error::InvalidArgument(format!(
            "resource paths must be relative, got {path}"
        ))));
    }
    let base = match root {
        ResourceRoot::Embedded => &roots.embedded,
        ResourceRoot::Local => &roots.local,
        ResourceRoot::Dynamic => &roots.dynamic,
    };
    Ok(base.join(relative))
}
