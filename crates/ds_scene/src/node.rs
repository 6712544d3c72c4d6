//! `SceneNode`: the shared, reference-counted description of one scene
//! graph node (spec.md §4.5).
//!
//! A `SceneNode` is a template, not a tree position: the same node can be
//! shared under several parents (think: one mesh definition instanced in
//! many places), so it owns its children by shared reference and carries
//! no parent pointer of its own. [`crate::tree::SceneTreeNode`] is the
//! per-instantiation counterpart that does know where it sits.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

/// Per-node-type data a concrete node kind attaches, downcast by whichever
/// item list knows how to interpret it (e.g. a mesh node's geometry
/// handle, a light node's color/intensity). Plays the role a
/// `void* userData` paired with a type-specific vtable would in a
/// non-generic runtime.
pub trait NodeData: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> NodeData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shared scene graph node.
///
/// Children are owned by `Arc`, so a node may be attached under multiple
/// parents (or appear more than once under the same parent); freeing a
/// `SceneNode` only actually drops it once every owner — every parent it's
/// attached to, plus every [`crate::tree::SceneTreeNode`] instantiation —
/// has released its reference.
pub struct SceneNode {
    name: String,
    /// Names of the item lists this node participates in, e.g.
    /// `["transformData", "instanceTransformData"]`. Drives which item
    /// lists `Scene::add_node` registers this node with.
    item_lists: Vec<String>,
    data: Option<Box<dyn NodeData>>,
    children: RwLock<Vec<Arc<SceneNode>>>,
}

impl SceneNode {
    #[must_use]
    pub fn new(name: impl Into<String>, item_lists: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            item_lists,
            data: None,
            children: RwLock::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn with_data(
        name: impl Into<String>,
        item_lists: Vec<String>,
        data: impl NodeData,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            item_lists,
            data: Some(Box::new(data)),
            children: RwLock::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn item_lists(&self) -> &[String] {
        &self.item_lists
    }

    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.data.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// Attaches `child` as an additional child of this node. Does not
    /// de-duplicate: attaching the same child twice is legal and produces
    /// two tree instantiations when the scene is built — a node may be its
    /// own sibling.
    pub fn add_child(self: &Arc<Self>, child: Arc<SceneNode>) {
        self.children.write().push(child);
    }

    pub fn remove_child(self: &Arc<Self>, child: &Arc<SceneNode>) -> bool {
        let mut children = self.children.write();
        if let Some(pos) = children.iter().position(|c| Arc::ptr_eq(c, child)) {
            children.remove(pos);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn children(&self) -> Vec<Arc<SceneNode>> {
        self.children.read().clone()
    }
}
