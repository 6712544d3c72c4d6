//! `Scene`: owns the tree and drives the item-list execution pipeline for
//! one frame (spec.md §4.5, §4.6).

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::item_list::ItemListType;
use crate::node::SceneNode;
use crate::tree::{self, SceneTreeNode};

pub struct Scene {
    root: Arc<SceneTreeNode>,
    item_lists: FxHashMap<String, Box<dyn ItemListType>>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: SceneTreeNode::new(SceneNode::new("root", vec![]), None),
            item_lists: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Arc<SceneTreeNode> {
        &self.root
    }

    pub fn add_item_list(&mut self, list: Box<dyn ItemListType>) {
        self.item_lists.insert(list.name().to_string(), list);
    }

    #[must_use]
    pub fn item_list(&self, name: &str) -> Option<&dyn ItemListType> {
        self.item_lists.get(name).map(AsRef::as_ref)
    }

    pub fn item_list_mut(&mut self, name: &str) -> Option<&mut (dyn ItemListType + '_)> {
        self.item_lists.get_mut(name).map(AsMut::as_mut)
    }

    /// Instantiates `node` under `parent` (the scene root if `None`),
    /// registering it with every item list its [`SceneNode::item_lists`]
    /// names.
    pub fn add_node(
        &mut self,
        parent: Option<&Arc<SceneTreeNode>>,
        node: Arc<SceneNode>,
    ) -> Arc<SceneTreeNode> {
        let parent = parent.unwrap_or(&self.root).clone();
        let tree_node = SceneTreeNode::new(node.clone(), Some(&parent));
        parent.add_child(tree_node.clone());

        let mut registrations = FxHashMap::default();
        for list_name in node.item_lists() {
            if let Some(list) = self.item_lists.get_mut(list_name) {
                let entry = list.add_node(&tree_node);
                registrations.insert(list_name.clone(), entry);
            }
        }
        *tree_node.entries.write() = registrations;
        tree_node
    }

    /// Removes `tree_node` and its entire subtree, unregistering every
    /// instantiation from the item lists it was registered with.
    pub fn remove_node(&mut self, tree_node: &Arc<SceneTreeNode>) {
        for child in tree_node.children() {
            self.remove_node(&child);
        }
        if let Some(parent) = tree_node.parent() {
            parent.remove_child(tree_node);
        }
        let registrations = tree_node.entries.read().clone();
        for (list_name, entry) in &registrations {
            if let Some(list) = self.item_lists.get_mut(list_name) {
                list.remove_node(*entry);
            }
        }
    }

    /// Moves `tree_node` (and its subtree) to be a child of `new_parent`
    /// (the scene root if `None`), notifying every item list it's
    /// registered with so lists like [`crate::lists::HandoffList`] can
    /// start a transition rather than snapping to the new pose.
    pub fn reparent_node(
        &mut self,
        tree_node: &Arc<SceneTreeNode>,
        new_parent: Option<&Arc<SceneTreeNode>>,
    ) {
        let new_parent = new_parent.unwrap_or(&self.root).clone();
        let old_world = tree_node.world_transform();

        if let Some(old_parent) = tree_node.parent() {
            old_parent.remove_child(tree_node);
        }
        new_parent.add_child(tree_node.clone());
        tree_node.set_parent(Some(&new_parent));

        let registrations = tree_node.entries.read().clone();
        for (list_name, entry) in &registrations {
            if let Some(list) = self.item_lists.get_mut(list_name) {
                list.reparent_node(*entry, Some(&new_parent), old_world);
            }
        }
    }

    pub fn pre_transform_update(&mut self, dt_seconds: f32) {
        for list in self.item_lists.values_mut() {
            list.pre_transform_update(dt_seconds);
        }
    }

    /// Recomputes world transforms for the whole tree. Called between
    /// `pre_transform_update` and `update`: item lists that want to react
    /// to an updated transform must do so in `update`, not
    /// `pre_transform_update`.
    pub fn update_transforms(&mut self) {
        tree::update_transforms(&self.root, Mat4::IDENTITY);
    }

    pub fn update(&mut self, dt_seconds: f32) {
        for list in self.item_lists.values_mut() {
            list.update(dt_seconds);
        }
    }

    pub fn pre_render_pass(&mut self) {
        for list in self.item_lists.values_mut() {
            list.pre_render_pass();
        }
    }

    /// Runs the full per-frame pipeline in a fixed order: pre-transform
    /// hooks, transform propagation, update, pre-render-pass, then commit
    /// (which compacts every list's pending removals).
    pub fn run_frame(&mut self, dt_seconds: f32) {
        self.pre_transform_update(dt_seconds);
        self.update_transforms();
        self.update(dt_seconds);
        self.pre_render_pass();
        self.commit();
    }

    pub fn commit(&mut self) {
        for list in self.item_lists.values_mut() {
            list.commit();
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for list in self.item_lists.values_mut() {
            list.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::TransformData;

    #[test]
    fn add_node_registers_with_named_item_lists() {
        let mut scene = Scene::new();
        scene.add_item_list(Box::new(TransformData::new("transformData")));

        let node = SceneNode::new("n", vec!["transformData".into()]);
        let tree_node = scene.add_node(None, node);

        assert_eq!(tree_node.entries.read().len(), 1);
        assert!(tree_node.entries.read().contains_key("transformData"));
    }

    #[test]
    fn remove_node_unregisters_and_detaches_subtree() {
        let mut scene = Scene::new();
        scene.add_item_list(Box::new(TransformData::new("transformData")));

        let parent_node = SceneNode::new("p", vec!["transformData".into()]);
        let parent = scene.add_node(None, parent_node);
        let child_node = SceneNode::new("c", vec!["transformData".into()]);
        let child = scene.add_node(Some(&parent), child_node);

        scene.remove_node(&parent);
        assert!(scene.root().children().is_empty());
        assert!(child.parent().is_none() || !scene.root().children().iter().any(|c| Arc::ptr_eq(c, &child)));
    }

    #[test]
    fn run_frame_drives_registered_lists() {
        let mut scene = Scene::new();
        scene.add_item_list(Box::new(TransformData::new("transformData")));
        let node = SceneNode::new("n", vec!["transformData".into()]);
        let tree_node = scene.add_node(None, node);
        tree_node.set_local_transform(Mat4::from_translation(glam::Vec3::X));

        scene.run_frame(0.016);

        let list = scene.item_list("transformData").unwrap();
        let _ = list.name();
    }
}
