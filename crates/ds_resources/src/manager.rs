//! The GPU resource manager (spec.md §4.4).
//!
//! Grounded on `Render/src/Resources/ResourceManager.c`: the manager tracks
//! how many live instances of each GPU resource class exist, independent of
//! which rendering backend created them, so a shutdown that still has live
//! resources can name exactly what leaked rather than reporting one opaque
//! count.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ds_core::error::track_error;
use ds_core::log::{log_message, Level};
use ds_core::thread::{self, ThreadId};

use crate::context::ResourceContext;
use crate::error::{Error, Result};

const LOG_TAG: &str = "ds_resources::manager";

/// One counter per GPU resource class the manager tracks.
///
/// Kept as a fixed, named set of fields (rather than a `HashMap<Class, u32>`)
/// because the shutdown leak report needs to name each class individually
/// in a fixed order: one `if count > 0, log it` check per class.
#[derive(Default)]
struct Counters {
    contexts: AtomicU32,
    buffers: AtomicU32,
    textures: AtomicU32,
    shader_modules: AtomicU32,
    shaders: AtomicU32,
    materials: AtomicU32,
    material_descs: AtomicU32,
    shader_variable_groups: AtomicU32,
    shader_variable_group_descs: AtomicU32,
    framebuffers: AtomicU32,
    renderbuffers: AtomicU32,
    geometries: AtomicU32,
    fences: AtomicU32,
}

impl Counters {
    /// `(name, live count)` for every resource class, in report order.
    fn snapshot(&self) -> [(&'static str, u32); 12] {
        [
            ("buffer", self.buffers.load(Ordering::Acquire)),
            ("texture", self.textures.load(Ordering::Acquire)),
            ("shader module", self.shader_modules.load(Ordering::Acquire)),
            ("shader", self.shaders.load(Ordering::Acquire)),
            ("material", self.materials.load(Ordering::Acquire)),
            (
                "material description",
                self.material_descs.load(Ordering::Acquire),
            ),
            (
                "shader variable group",
                self.shader_variable_groups.load(Ordering::Acquire),
            ),
            (
                "shader variable group description",
                self.shader_variable_group_descs.load(Ordering::Acquire),
            ),
            ("framebuffer", self.framebuffers.load(Ordering::Acquire)),
            ("renderbuffer", self.renderbuffers.load(Ordering::Acquire)),
            ("geometry", self.geometries.load(Ordering::Acquire)),
            ("fence", self.fences.load(Ordering::Acquire)),
        ]
    }
}

/// The resource class a `ResourceManager::track_*`/`untrack_*` call applies
/// to. Public so backends outside this crate can participate in the same
/// leak accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Buffer,
    Texture,
    ShaderModule,
    Shader,
    Material,
    MaterialDesc,
    ShaderVariableGroup,
    ShaderVariableGroupDesc,
    Framebuffer,
    Renderbuffer,
    Geometry,
    Fence,
}

pub(crate) struct ResourceManagerShared {
    counters: Counters,
    name: String,
    /// The thread that constructed this manager. Recorded once, at
    /// construction, rather than tracked as changeable process state: a
    /// resource manager is created on the application's main/render thread
    /// and lives for the process's lifetime.
    main_thread: ThreadId,
    max_resource_contexts: u32,
}

/// A handle to a GPU resource manager. Cloning shares the same underlying
/// counters, matching how a single manager is shared across every thread
/// that can record resources against it.
#[derive(Clone)]
pub struct ResourceManager {
    pub(crate) inner: Arc<ResourceManagerShared>,
}

impl ResourceManager {
    /// Creates a manager bounding its resource contexts at
    /// `max_resource_contexts`. The calling thread is recorded as this
    /// manager's main thread: it can always use resources without binding
    /// an explicit context, and it can never bind one itself.
    #[must_use]
    pub fn new(name: impl Into<String>, max_resource_contexts: u32) -> Self {
        Self {
            inner: Arc::new(ResourceManagerShared {
                counters: Counters::default(),
                name: name.into(),
                main_thread: thread::current_id(),
                max_resource_contexts,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True if the calling thread is the one that constructed this manager.
    #[must_use]
    pub(crate) fn is_main_thread(&self) -> bool {
        thread::current_id() == self.inner.main_thread
    }

    /// Binds a new [`ResourceContext`] to the calling thread. Fails if the
    /// calling thread is this manager's main thread (which never needs an
    /// explicit context), if it already has one bound (to this manager or
    /// any other), or if `max_resource_contexts` bound contexts are already
    /// live.
    pub fn create_resource_context(&self) -> Result<ResourceContext> {
        loop {
            let current = self.inner.counters.contexts.load(Ordering::Acquire);
            if current >= self.inner.max_resource_contexts {
                return Err(track_error(Error::OutOfMemory(format!(
                    "resource manager '{}' already has the maximum {} resource context(s) bound",
                    self.name(),
                    self.inner.max_resource_contexts
                ))));
            }
            if self
                .inner
                .counters
                .contexts
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        ResourceContext::bind(self.clone()).inspect_err(|_| {
            self.inner.counters.contexts.fetch_sub(1, Ordering::AcqRel);
        })
    }

    pub(crate) fn release_context(&self) {
        self.inner.counters.contexts.fetch_sub(1, Ordering::AcqRel);
    }

    /// Returns true if the calling thread can create and destroy GPU
    /// resources against this manager: either it is this manager's main
    /// thread (which always has implicit access) or it currently has a
    /// resource context bound.
    #[must_use]
    pub fn can_use_resources(&self) -> bool {
        self.is_main_thread() || crate::context::has_context_for(&self.inner)
    }

    fn counter(&self, class: ResourceClass) -> &AtomicU32 {
        match class {
            ResourceClass::Buffer => &self.inner.counters.buffers,
            ResourceClass::Texture => &self.inner.counters.textures,
            ResourceClass::ShaderModule => &self.inner.counters.shader_modules,
            ResourceClass::Shader => &self.inner.counters.shaders,
            ResourceClass::Material => &self.inner.counters.materials,
            ResourceClass::MaterialDesc => &self.inner.counters.material_descs,
            ResourceClass::ShaderVariableGroup => &self.inner.counters.shader_variable_groups,
            ResourceClass::ShaderVariableGroupDesc => {
                &self.inner.counters.shader_variable_group_descs
            }
            ResourceClass::Framebuffer => &self.inner.counters.framebuffers,
            ResourceClass::Renderbuffer => &self.inner.counters.renderbuffers,
            ResourceClass::Geometry => &self.inner.counters.geometries,
            ResourceClass::Fence => &self.inner.counters.fences,
        }
    }

    /// Records the creation of one resource of `class`. Call sites must
    /// hold a [`ResourceContext`] on this manager.
    pub fn track_create(&self, class: ResourceClass) -> Result<()> {
        if !self.can_use_resources() {
            return Err(track_error(Error::PermissionDenied(format!(
                "no resource context bound on this thread for manager '{}'",
                self.name()
            ))));
        }
        self.counter(class).fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Records the destruction of one resource of `class`.
    pub fn track_destroy(&self, class: ResourceClass) {
        self.counter(class).fetch_sub(1, Ordering::AcqRel);
    }

    /// Reports every resource class with a non-zero live count at
    /// `Level::Error`, one line per class, then the outstanding context
    /// count. Called once, typically just before the manager itself is
    /// dropped.
    pub fn report_leaks(&self) {
        let contexts = self.inner.counters.contexts.load(Ordering::Acquire);
        for (name, count) in self.inner.counters.snapshot() {
            if count > 0 {
                log_message(
                    Level::Error,
                    LOG_TAG,
                    file!(),
                    line!(),
                    &format!(
                        "resource manager '{}' leaked {count} {name}(s)",
                        self.name()
                    ),
                );
            }
        }
        if contexts > 0 {
            log_message(
                Level::Error,
                LOG_TAG,
                file!(),
                line!(),
                &format!(
                    "resource manager '{}' still has {contexts} resource context(s) bound",
                    self.name()
                ),
            );
        }
    }
}
