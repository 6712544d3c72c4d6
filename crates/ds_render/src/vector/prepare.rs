//! `VectorDrawPrepare`: caches tessellated vector-graphics geometry,
//! re-uploading only when the source layout actually changed (spec.md
//! §4.8).
//!
//! Grounded on spec.md §4.8's description of the item list: walk attached
//! vector-image nodes; per entry, compare the node's monotonically
//! increasing layout version against what's cached; if they differ, rerun
//! layout and re-upload, otherwise call `refresh` to re-stage texture
//! deltas rather than doing nothing at all.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use ds_scene::item_list::{EntryId, EntryList, ItemListType};
use ds_scene::tree::SceneTreeNode;

/// One tessellated vertex of a vector shape.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VectorVertex {
    pub position: [f32; 2],
    pub color: [u8; 4],
}

/// A node's vector image geometry, attached as node data via
/// [`crate::node::SceneNode::with_data`] wrapped in [`VectorImageNodeData`]
/// so [`VectorDrawPrepare`] can pull from it without the node and the item
/// list sharing a concrete type.
pub trait VectorImageSource: Send + Sync {
    /// Bumped by whatever owns the image whenever its geometry-affecting
    /// state changes (a resize, a different DPI target, an edited path).
    fn layout_version(&self) -> u64;

    /// Tessellates the current layout. Only called when `layout_version`
    /// has moved past what `VectorDrawPrepare` has cached.
    fn vertices(&self) -> Vec<VectorVertex>;

    /// Re-stages texture references for already-tessellated geometry.
    /// Called instead of `vertices` when the layout version is unchanged,
    /// so a texture atlas repack between frames doesn't need a full
    /// re-tessellation to be picked up.
    fn refresh(&self) {}
}

/// Node data wrapping a [`VectorImageSource`].
pub struct VectorImageNodeData(pub Arc<dyn VectorImageSource>);

struct Entry {
    tree_node: Arc<SceneTreeNode>,
    cached_version: Option<u64>,
    prepared: Vec<VectorVertex>,
}

/// Walks attached vector-image nodes each frame, re-tessellating only when
/// a node's layout version has moved past what's cached.
pub struct VectorDrawPrepare {
    name: String,
    entries: EntryList<Entry>,
}

impl VectorDrawPrepare {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: EntryList::new(),
        }
    }

    #[must_use]
    pub fn prepared(&self, entry: EntryId) -> Option<&[VectorVertex]> {
        self.entries.get(entry).map(|e| e.prepared.as_slice())
    }

    #[must_use]
    pub fn cached_version(&self, entry: EntryId) -> Option<u64> {
        self.entries.get(entry).and_then(|e| e.cached_version)
    }

    /// Forces the next `update` call to re-tessellate `entry` regardless of
    /// version, e.g. after a device loss invalidated GPU-side state the
    /// cached version number can't reflect.
    pub fn invalidate(&mut self, entry: EntryId) {
        if let Some(e) = self.entries.get_mut(entry) {
            e.cached_version = None;
        }
    }
}

impl ItemListType for VectorDrawPrepare {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, tree_node: &Arc<SceneTreeNode>) -> EntryId {
        self.entries.insert(Entry {
            tree_node: tree_node.clone(),
            cached_version: None,
            prepared: Vec::new(),
        })
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.mark_removed(entry);
    }

    fn update(&mut self, _dt_seconds: f32) {
        for (_, entry) in self.entries.iter_mut() {
            let Some(source) = entry.tree_node.node().data::<VectorImageNodeData>() else {
                continue;
            };
            let version = source.0.layout_version();
            if entry.cached_version == Some(version) {
                source.0.refresh();
            } else {
                entry.prepared = source.0.vertices();
                entry.cached_version = Some(version);
            }
        }
    }

    fn commit(&mut self) {
        self.entries.compact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_scene::node::SceneNode;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct FakeVectorImage {
        version: AtomicU64,
        refreshes: Mutex<u32>,
    }

    impl VectorImageSource for FakeVectorImage {
        fn layout_version(&self) -> u64 {
            self.version.load(Ordering::SeqCst)
        }

        fn vertices(&self) -> Vec<VectorVertex> {
            vec![VectorVertex {
                position: [self.version.load(Ordering::SeqCst) as f32, 0.0],
                color: [255; 4],
            }]
        }

        fn refresh(&self) {
            *self.refreshes.lock().unwrap() += 1;
        }
    }

    fn node_with_source(source: Arc<FakeVectorImage>) -> Arc<SceneTreeNode> {
        let node = SceneNode::with_data("vector", vec![], VectorImageNodeData(source));
        SceneTreeNode::new(node, None)
    }

    #[test]
    fn same_version_calls_refresh_instead_of_reuploading() {
        let source = Arc::new(FakeVectorImage {
            version: AtomicU64::new(1),
            refreshes: Mutex::new(0),
        });
        let tree_node = node_with_source(source.clone());

        let mut list = VectorDrawPrepare::new("vectorDrawPrepare");
        let entry = list.add_node(&tree_node);

        list.update(0.016);
        assert_eq!(list.cached_version(entry), Some(1));
        assert_eq!(list.prepared(entry).unwrap().len(), 1);

        list.update(0.016);
        assert_eq!(*source.refreshes.lock().unwrap(), 1, "unchanged version should refresh, not reupload");
    }

    #[test]
    fn changed_version_triggers_reupload() {
        let source = Arc::new(FakeVectorImage {
            version: AtomicU64::new(1),
            refreshes: Mutex::new(0),
        });
        let tree_node = node_with_source(source.clone());

        let mut list = VectorDrawPrepare::new("vectorDrawPrepare");
        let entry = list.add_node(&tree_node);
        list.update(0.016);

        source.version.store(2, Ordering::SeqCst);
        list.update(0.016);

        assert_eq!(list.cached_version(entry), Some(2));
        assert_eq!(*source.refreshes.lock().unwrap(), 0);
    }

    #[test]
    fn invalidate_forces_the_next_update_to_reupload() {
        let source = Arc::new(FakeVectorImage {
            version: AtomicU64::new(1),
            refreshes: Mutex::new(0),
        });
        let tree_node = node_with_source(source.clone());

        let mut list = VectorDrawPrepare::new("vectorDrawPrepare");
        let entry = list.add_node(&tree_node);
        list.update(0.016);
        list.invalidate(entry);
        list.update(0.016);

        assert_eq!(*source.refreshes.lock().unwrap(), 0, "invalidate should force a reupload, not a refresh");
    }
}
