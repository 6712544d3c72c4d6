//! The thread-scoped resource context guard (spec.md §4.4).
//!
//! Grounded on `Render/src/Resources/ResourceManager.c`'s
//! `dsResourceManager_createResourceContext` /
//! `dsResourceManager_destroyResourceContext` /
//! `dsResourceManager_canUseResources`: a resource context binds one OS
//! thread to one resource manager for the lifetime of the context, and
//! GPU-resource creation/destruction calls are only valid on a thread that
//! currently holds one. Here the binding is an RAII guard instead of an
//! explicit create/destroy pair, so a panicking thread can't leak a stale
//! binding.

use std::cell::RefCell;
use std::sync::Arc;

use ds_core::thread::ThreadLocalSlot;

use ds_core::error::track_error;

use crate::error::{Error, Result};
use crate::manager::{ResourceManager, ResourceManagerShared};

thread_local! {
    static ACTIVE_CONTEXT: RefCell<Option<usize>> = const { RefCell::new(None) };
}

fn slot() -> ThreadLocalSlot<usize> {
    ThreadLocalSlot::new(&ACTIVE_CONTEXT)
}

fn identity(shared: &Arc<ResourceManagerShared>) -> usize {
    Arc::as_ptr(shared) as usize
}

pub(crate) fn has_context_for(shared: &Arc<ResourceManagerShared>) -> bool {
    slot().with_ref(|v| v == Some(&identity(shared)))
}

/// An RAII guard representing the calling thread's right to create and
/// destroy GPU resources against one [`ResourceManager`]. Dropping it
/// (including via an unwinding panic) unbinds the thread.
pub struct ResourceContext {
    manager: ResourceManager,
}

impl ResourceContext {
    pub(crate) fn bind(manager: ResourceManager) -> Result<Self> {
        if manager.is_main_thread() {
            return Err(track_error(Error::PermissionDenied(
                "the main thread always has implicit resource access and cannot bind an \
                 explicit resource context"
                    .into(),
            )));
        }
        if slot().is_set() {
            return Err(track_error(Error::PermissionDenied(
                "this thread already has a resource context bound".into(),
            )));
        }
        slot().set(identity(&manager.inner));
        Ok(Self { manager })
    }

    /// The manager this context is bound to.
    #[must_use]
    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }
}

impl Drop for ResourceContext {
    fn drop(&mut self) {
        slot().clear();
        self.manager.release_context();
    }
}
