//! `TransformData`: the simplest illustrative item list from spec.md §4.6
//! — it tracks a node's current world transform for consumption by
//! whatever draws it, with no logic beyond bookkeeping.
//!
//! Grounded on `modules/Scene/Scene/src/ViewTransformData.c`'s shape (an
//! item list that exists purely to mirror transforms into GPU-visible
//! form); the CPU-side bookkeeping below is the part of that file this
//! crate owns; the actual GPU upload is the render backend's job (see
//! `crate::backend`).

use std::sync::Arc;

use glam::Mat4;

use crate::item_list::{EntryId, EntryList, ItemListType};
use crate::tree::SceneTreeNode;

struct Entry {
    tree_node: Arc<SceneTreeNode>,
    last_transform: Mat4,
}

/// Tracks the current world transform of every node registered with it.
pub struct TransformData {
    name: String,
    entries: EntryList<Entry>,
}

impl TransformData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: EntryList::new(),
        }
    }

    /// The last transform recorded for `entry`, if it's still registered.
    #[must_use]
    pub fn transform(&self, entry: EntryId) -> Option<Mat4> {
        self.entries.get(entry).map(|e| e.last_transform)
    }
}

impl ItemListType for TransformData {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, tree_node: &Arc<SceneTreeNode>) -> EntryId {
        self.entries.insert(Entry {
            tree_node: tree_node.clone(),
            last_transform: tree_node.world_transform(),
        })
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.mark_removed(entry);
    }

    fn update(&mut self, _dt_seconds: f32) {
        for (_, entry) in self.entries.iter_mut() {
            entry.last_transform = entry.tree_node.world_transform();
        }
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
    fn update_refreshes_the_cached_transform() {
        let mut list = TransformData::new("transformData");
        let tree_node = SceneTreeNode::new(SceneNode::new("n", vec![]), None);
        let entry = list.add_node(&tree_node);
        assert_eq!(list.transform(entry).unwrap(), Mat4::IDENTITY);

        tree_node.set_local_transform(Mat4::from_translation(glam::Vec3::ONE));
        crate::tree::update_transforms(&tree_node, Mat4::IDENTITY);
        list.update(0.016);
        assert_eq!(
            list.transform(entry).unwrap(),
            Mat4::from_translation(glam::Vec3::ONE)
        );
    }

    #[test]
    fn removed_entries_are_gone_after_commit() {
        let mut list = TransformData::new("transformData");
        let tree_node = SceneTreeNode::new(SceneNode::new("n", vec![]), None);
        let entry = list.add_node(&tree_node);
        list.remove_node(entry);
        list.commit();
        assert!(list.transform(entry).is_none());
    }
}
