//! Optional profiler hooks, grounded on spec.md §4.2.
//!
//! Modeled as a function-pointer-style table (frame start/end, scope
//! push/pop, stat reporting, GPU timing) that is entirely optional: a
//! profiler with any null function disables itself. Expressed here as a
//! single [`Profiler`] trait object behind a process-wide cell, the usual
//! shape for engine-wide singleton state that every subsystem needs read
//! access to but only one place ever installs.

use std::sync::OnceLock;

use parking_lot::RwLock;

/// The kind of a pushed profiler scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    Function,
    Scope,
    Wait,
    Lock,
}

/// Where a scope or stat was reported from.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

/// Implemented by a host-provided profiler backend. Every method has a
/// default no-op body, so a partial implementation behaves like the
/// original's "any null function pointer" case for the functions it omits
/// — except here the *whole* profiler is still installed, just with some
/// hooks inert, rather than being disabled wholesale. Hosts that want the
/// original's all-or-nothing semantics can check their own flags inside
/// their trait impl.
pub trait Profiler: Send + Sync {
    fn frame_start(&self, _site: CallSite) {}
    fn frame_end(&self, _site: CallSite) {}
    fn push_scope(&self, _ty: ScopeType, _name: &str, _site: CallSite) {}
    fn pop_scope(&self, _site: CallSite) {}
    fn stat(&self, _category: &str, _name: &str, _value: f64) {}
    fn gpu_time(&self, _name: &str, _milliseconds: f64) {}
}

static PROFILER: OnceLock<RwLock<Option<Box<dyn Profiler>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Box<dyn Profiler>>> {
    PROFILER.get_or_init(|| RwLock::new(None))
}

/// Installs the process-wide profiler backend. Passing `None` disables
/// profiling entirely (equivalent to every hook being null).
pub fn set_profiler(profiler: Option<Box<dyn Profiler>>) {
    *slot().write() = profiler;
}

/// Returns true if a profiler backend is currently installed.
#[must_use]
pub fn is_enabled() -> bool {
    slot().read().is_some()
}

pub fn frame_start(site: CallSite) {
    if let Some(p) = slot().read().as_ref() {
        p.frame_start(site);
    }
}

pub fn frame_end(site: CallSite) {
    if let Some(p) = slot().read().as_ref() {
        p.frame_end(site);
    }
}

pub fn push_scope(ty: ScopeType, name: &str, site: CallSite) {
    if let Some(p) = slot().read().as_ref() {
        p.push_scope(ty, name, site);
    }
}

pub fn pop_scope(site: CallSite) {
    if let Some(p) = slot().read().as_ref() {
        p.pop_scope(site);
    }
}

pub fn stat(category: &str, name: &str, value: f64) {
    if let Some(p) = slot().read().as_ref() {
        p.stat(category, name, value);
    }
}

pub fn gpu_time(name: &str, milliseconds: f64) {
    if let Some(p) = slot().read().as_ref() {
        p.gpu_time(name, milliseconds);
    }
}

/// RAII guard that pushes a scope on creation and pops it on drop, the
/// typical usage pattern for a push/pop scope pair.
pub struct ScopeGuard {
    site: CallSite,
}

impl ScopeGuard {
    #[must_use]
    pub fn new(ty: ScopeType, name: &str, site: CallSite) -> Self {
        push_scope(ty, name, site);
        Self { site }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        pop_scope(self.site);
    }
}

/// `profile_scope!(ScopeType::Function, "dsPoolAllocator_alloc")`
#[macro_export]
macro_rules! profile_scope {
    ($ty:expr, $name:expr) => {
        let _guard = $crate::profile::ScopeGuard::new(
            $ty,
            $name,
            $crate::profile::CallSite {
                file: file!(),
                function: "",
                line: line!(),
            },
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingProfiler {
        pushes: Arc<AtomicU32>,
        pops: Arc<AtomicU32>,
    }

    impl Profiler for CountingProfiler {
        fn push_scope(&self, _ty: ScopeType, _name: &str, _site: CallSite) {
            self.pushes.fetch_add(1, Ordering::SeqCst);
        }
        fn pop_scope(&self, _site: CallSite) {
            self.pops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn disabled_by_default_is_inert() {
        set_profiler(None);
        assert!(!is_enabled());
        // Must not panic with no profiler installed.
        push_scope(
            ScopeType::Function,
            "noop",
            CallSite { file: "x", function: "y", line: 1 },
        );
    }

    #[test]
    fn scope_guard_pushes_and_pops_exactly_once() {
        let pushes = Arc::new(AtomicU32::new(0));
        let pops = Arc::new(AtomicU32::new(0));
        set_profiler(Some(Box::new(CountingProfiler {
            pushes: pushes.clone(),
            pops: pops.clone(),
        })));
        {
            let _guard = ScopeGuard::new(
                ScopeType::Scope,
                "work",
                CallSite { file: "x", function: "y", line: 1 },
            );
            assert_eq!(pushes.load(Ordering::SeqCst), 1);
            assert_eq!(pops.load(Ordering::SeqCst), 0);
        }
        assert_eq!(pops.load(Ordering::SeqCst), 1);
        set_profiler(None);
    }
}
