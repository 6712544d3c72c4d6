//! `FullScreenResolve`: draws a full-screen quad, sharing one piece of
//! geometry across every instance in the process rather than allocating it
//! per scene (spec.md §4.6).
//!
//! Grounded on `modules/Scene/Scene/src/ItemLists/SceneFullScreenResolve.c`:
//! the quad is process-wide, not per-scene, because every full-screen
//! resolve pass draws the exact same two triangles regardless of which
//! scene or view it belongs to. The shared geometry's create-on-first-use /
//! destroy-on-last-release behavior is guarded here by
//! [`ds_core::thread::SpinLock`] over a [`Weak`], so the geometry
//! disappears on its own once the last `FullScreenResolve` referencing it
//! is dropped, without a separate manual refcount to keep in sync.

use std::sync::{Arc, Weak};

use ds_core::thread::SpinLock;

use crate::item_list::{EntryId, EntryList, ItemListType};
use crate::tree::SceneTreeNode;

/// The shared full-screen-quad geometry. Stands in for the actual GPU
/// vertex/index buffers a render backend would own; this subsystem only
/// needs to prove the geometry is created once and shared, not render it.
pub struct SharedQuadGeometry {
    pub vertex_count: u32,
}

static SHARED_QUAD: SpinLock<Option<Weak<SharedQuadGeometry>>> = SpinLock::new(None);

/// Returns the process-wide quad, creating it if this is the first live
/// reference, or upgrading the cached [`Weak`] if an earlier
/// `FullScreenResolve` already created it and is still alive.
fn acquire_shared_quad() -> Arc<SharedQuadGeometry> {
    let mut slot = SHARED_QUAD.lock();
    if let Some(existing) = slot.as_ref().and_then(Weak::upgrade) {
        return existing;
    }
    let created = Arc::new(SharedQuadGeometry { vertex_count: 4 });
    *slot = Some(Arc::downgrade(&created));
    created
}

/// Number of process-wide `FullScreenResolve` lists currently sharing the
/// quad, for tests; not needed by the item list itself since `Arc`/`Weak`
/// already track this.
#[cfg(test)]
fn shared_quad_is_alive() -> bool {
    SHARED_QUAD.lock().as_ref().is_some_and(|w| w.strong_count() > 0)
}

/// Draws a full-screen quad for every registered node (typically exactly
/// one per view, since a full-screen pass doesn't depend on scene
/// position).
pub struct FullScreenResolve {
    name: String,
    quad: Arc<SharedQuadGeometry>,
    entries: EntryList<Arc<SceneTreeNode>>,
}

impl FullScreenResolve {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quad: acquire_shared_quad(),
            entries: EntryList::new(),
        }
    }

    #[must_use]
    pub fn quad(&self) -> &Arc<SharedQuadGeometry> {
        &self.quad
    }
}

impl ItemListType for FullScreenResolve {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, tree_node: &Arc<SceneTreeNode>) -> EntryId {
        self.entries.insert(tree_node.clone())
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.mark_removed(entry);
    }

    fn commit(&mut self) {
        self.entries.compact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SceneNode;

    #[test]
    fn quad_is_shared_across_instances_and_freed_when_last_is_dropped() {
        assert!(!shared_quad_is_alive());
        let a = FullScreenResolve::new("resolveA");
        let b = FullScreenResolve::new("resolveB");
        assert!(Arc::ptr_eq(a.quad(), b.quad()));
        assert!(shared_quad_is_alive());
        drop(a);
        assert!(shared_quad_is_alive(), "b still holds a strong reference");
        drop(b);
        assert!(!shared_quad_is_alive());
    }

    #[test]
    fn add_and_remove_track_registered_nodes() {
        let mut list = FullScreenResolve::new("resolve");
        let node = SceneTreeNode::new(SceneNode::new("n", vec![]), None);
        let entry = list.add_node(&node);
        list.remove_node(entry);
        list.commit();
        assert_eq!(list.entries.len(), 0);
    }
}
