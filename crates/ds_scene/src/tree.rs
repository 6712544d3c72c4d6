//! `SceneTreeNode`: one instantiation of a [`SceneNode`] at a particular
//! tree position (spec.md §4.5).
//!
//! A `SceneNode` can be shared under multiple parents, so its world
//! transform is not a property of the node itself — it depends on which
//! instantiation (which path from the scene root) you mean. `SceneTreeNode`
//! holds that path-specific state: a non-owning back-reference to its
//! parent instantiation (owning it would create a reference cycle with the
//! parent's child list) and the transform accumulated from the root down
//! to this point.

use std::sync::{Arc, Weak};

use glam::Mat4;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::item_list::EntryId;
use crate::node::SceneNode;

/// One instantiation of a [`SceneNode`] within a scene's tree.
pub struct SceneTreeNode {
    node: Arc<SceneNode>,
    parent: RwLock<Option<Weak<SceneTreeNode>>>,
    children: RwLock<Vec<Arc<SceneTreeNode>>>,
    local_transform: RwLock<Mat4>,
    /// Overrides `local_transform` for this frame's propagation when set,
    /// e.g. a [`crate::lists::HandoffList`] transition in flight. Cleared
    /// once the owning item list is done driving the node externally.
    base_transform: RwLock<Option<Mat4>>,
    /// When true alongside a `base_transform`, the node's world transform
    /// *is* `base_transform`, skipping multiplication by the parent's
    /// world transform entirely.
    no_parent_transform: RwLock<bool>,
    world_transform: RwLock<Mat4>,
    /// Per-item-list entry id this instantiation was registered under,
    /// keyed by item list name, so `Scene::remove_node` can tell each
    /// item list which entry to drop without a linear search.
    pub(crate) entries: RwLock<FxHashMap<String, EntryId>>,
}

impl SceneTreeNode {
    #[must_use]
    pub(crate) fn new(node: Arc<SceneNode>, parent: Option<&Arc<SceneTreeNode>>) -> Arc<Self> {
        Arc::new(Self {
            node,
            parent: RwLock::new(parent.map(Arc::downgrade)),
            children: RwLock::new(Vec::new()),
            local_transform: RwLock::new(Mat4::IDENTITY),
            base_transform: RwLock::new(None),
            no_parent_transform: RwLock::new(false),
            world_transform: RwLock::new(Mat4::IDENTITY),
            entries: RwLock::new(FxHashMap::default()),
        })
    }

    #[must_use]
    pub fn node(&self) -> &Arc<SceneNode> {
        &self.node
    }

    #[must_use]
    pub fn parent(&self) -> Option<Arc<SceneTreeNode>> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Arc<SceneTreeNode>>) {
        *self.parent.write() = parent.map(Arc::downgrade);
    }

    #[must_use]
    pub fn children(&self) -> Vec<Arc<SceneTreeNode>> {
        self.children.read().clone()
    }

    pub(crate) fn add_child(&self, child: Arc<SceneTreeNode>) {
        self.children.write().push(child);
    }

    pub(crate) fn remove_child(&self, child: &Arc<SceneTreeNode>) {
        let mut children = self.children.write();
        if let Some(pos) = children.iter().position(|c| Arc::ptr_eq(c, child)) {
            children.remove(pos);
        }
    }

    #[must_use]
    pub fn local_transform(&self) -> Mat4 {
        *self.local_transform.read()
    }

    pub fn set_local_transform(&self, transform: Mat4) {
        *self.local_transform.write() = transform;
    }

    #[must_use]
    pub fn world_transform(&self) -> Mat4 {
        *self.world_transform.read()
    }

    #[must_use]
    pub fn base_transform(&self) -> Option<Mat4> {
        *self.base_transform.read()
    }

    #[must_use]
    pub fn no_parent_transform(&self) -> bool {
        *self.no_parent_transform.read()
    }

    /// Points this instantiation's transform propagation at an externally
    /// computed matrix rather than `local_transform`, for the current and
    /// every subsequent frame until cleared with `set_base_transform(None,
    /// false)`. With `no_parent_transform` set, `transform` is taken as the
    /// node's absolute world transform; otherwise it is combined with the
    /// parent's world transform like `local_transform` normally is.
    pub fn set_base_transform(&self, transform: Option<Mat4>, no_parent_transform: bool) {
        *self.base_transform.write() = transform;
        *self.no_parent_transform.write() = no_parent_transform;
    }

    /// Walks up to the root, accumulating local transforms, independent of
    /// the last `update_transforms` pass. Used by item lists (e.g. the
    /// handoff list) that need a node's ancestor chain on demand rather
    /// than waiting for the next full propagation.
    #[must_use]
    pub fn ancestors(self: &Arc<Self>) -> Vec<Arc<SceneTreeNode>> {
        let mut result = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            result.push(node);
        }
        result
    }
}

/// Recomputes every `world_transform` under `root` by depth-first
/// traversal, multiplying each node's local transform by its parent's
/// already-updated world transform. `root`'s own world transform is taken
/// as `root_transform` (identity for an actual scene root).
pub fn update_transforms(root: &Arc<SceneTreeNode>, root_transform: Mat4) {
    *root.world_transform.write() = root_transform;
    let mut stack: Vec<Arc<SceneTreeNode>> = root.children();
    // Depth-first, parent-before-child: each node's world transform is
    // final by the time its children are visited, so push in reverse to
    // keep left-to-right order without changing the traversal's semantics.
    stack.reverse();
    let mut frontier = stack;
    while let Some(node) = frontier.pop() {
        let parent_world = node
            .parent()
            .map(|p| p.world_transform())
            .unwrap_or(root_transform);
        let world = match node.base_transform() {
            Some(base) if node.no_parent_transform() => base,
            Some(base) => parent_world * base,
            None => parent_world * node.local_transform(),
        };
        *node.world_transform.write() = world;
        let mut children = node.children();
        children.reverse();
        frontier.extend(children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SceneNode;

    #[test]
    fn world_transform_composes_down_the_tree() {
        let root_node = SceneNode::new("root", vec![]);
        let child_node = SceneNode::new("child", vec![]);

        let root = SceneTreeNode::new(root_node, None);
        let child = SceneTreeNode::new(child_node, Some(&root));
        root.add_child(child.clone());
        child.set_parent(Some(&root));

        root.set_local_transform(Mat4::from_translation(glam::Vec3::new(1.0, 0.0, 0.0)));
        child.set_local_transform(Mat4::from_translation(glam::Vec3::new(0.0, 2.0, 0.0)));

        update_transforms(&root, Mat4::IDENTITY);

        assert_eq!(
            root.world_transform(),
            Mat4::from_translation(glam::Vec3::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            child.world_transform().transform_point3(glam::Vec3::ZERO),
            glam::Vec3::new(1.0, 2.0, 0.0)
        );
    }

    #[test]
    fn no_parent_transform_takes_the_base_transform_verbatim() {
        let root = SceneTreeNode::new(SceneNode::new("root", vec![]), None);
        let child = SceneTreeNode::new(SceneNode::new("child", vec![]), Some(&root));
        root.add_child(child.clone());
        child.set_parent(Some(&root));

        root.set_local_transform(Mat4::from_translation(glam::Vec3::new(5.0, 0.0, 0.0)));
        let pinned = Mat4::from_translation(glam::Vec3::new(9.0, 9.0, 9.0));
        child.set_base_transform(Some(pinned), true);

        update_transforms(&root, Mat4::IDENTITY);
        assert_eq!(child.world_transform(), pinned);
    }

    #[test]
    fn base_transform_without_no_parent_still_combines_with_the_parent() {
        let root = SceneTreeNode::new(SceneNode::new("root", vec![]), None);
        let child = SceneTreeNode::new(SceneNode::new("child", vec![]), Some(&root));
        root.add_child(child.clone());
        child.set_parent(Some(&root));

        root.set_local_transform(Mat4::from_translation(glam::Vec3::new(1.0, 0.0, 0.0)));
        child.set_base_transform(Some(Mat4::from_translation(glam::Vec3::new(0.0, 3.0, 0.0))), false);

        update_transforms(&root, Mat4::IDENTITY);
        assert_eq!(
            child.world_transform().transform_point3(glam::Vec3::ZERO),
            glam::Vec3::new(1.0, 3.0, 0.0)
        );
    }

    #[test]
    fn ancestors_walks_to_the_root() {
        let a = SceneTreeNode::new(SceneNode::new("a", vec![]), None);
        let b = SceneTreeNode::new(SceneNode::new("b", vec![]), Some(&a));
        let c = SceneTreeNode::new(SceneNode::new("c", vec![]), Some(&b));
        assert_eq!(c.ancestors().len(), 2);
    }
}
