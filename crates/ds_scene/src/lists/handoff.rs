//! `HandoffList`: blends a node's visual transform across a reparent so it
//! doesn't visually snap to its new parent's pose (spec.md §4.6).
//!
//! Grounded on `modules/Scene/Scene/src/ItemLists/SceneHandoffList.c`. The
//! part of that algorithm worth preserving exactly: the transition isn't
//! decomposed relative to the scene root, it's decomposed relative to the
//! lowest node the old and new parent chains have in common. Reparenting a
//! node to a sibling under the same grandparent produces a small, local
//! blend; reparenting it across the whole scene produces a blend relative
//! to the root, same as if there were no common ancestor at all.

use std::sync::{Arc, Weak};

use glam::{Mat4, Quat, Vec3};

use crate::item_list::{EntryId, EntryList, ItemListType};
use crate::tree::SceneTreeNode;

#[derive(Clone, Copy)]
struct Pose {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Pose {
    fn decompose(transform: Mat4) -> Self {
        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    fn compose(self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Self {
            translation: from.translation.lerp(to.translation, t),
            rotation: from.rotation.slerp(to.rotation, t),
            scale: from.scale.lerp(to.scale, t),
        }
    }
}

struct Entry {
    tree_node: Arc<SceneTreeNode>,
    last_parent: Option<Weak<SceneTreeNode>>,
    /// Set while a transition is in flight; `None` once it has finished.
    transition: Option<Transition>,
}

struct Transition {
    relative_to: Weak<SceneTreeNode>,
    from: Pose,
    elapsed: f32,
}

/// Blends a reparented node's pose across `transition_seconds` rather than
/// letting it jump to wherever its new parent places it.
pub struct HandoffList {
    name: String,
    transition_seconds: f32,
    entries: EntryList<Entry>,
}

fn ancestor_chain(node: Option<&Arc<SceneTreeNode>>) -> Vec<Arc<SceneTreeNode>> {
    let Some(node) = node else {
        return Vec::new();
    };
    let mut chain = vec![node.clone()];
    chain.extend(node.ancestors());
    chain
}

fn lowest_common_ancestor(
    old_parent: Option<&Arc<SceneTreeNode>>,
    new_parent: Option<&Arc<SceneTreeNode>>,
) -> Option<Arc<SceneTreeNode>> {
    let old_chain = ancestor_chain(old_parent);
    let new_chain = ancestor_chain(new_parent);
    for old_ancestor in &old_chain {
        for new_ancestor in &new_chain {
            if Arc::ptr_eq(old_ancestor, new_ancestor) {
                return Some(old_ancestor.clone());
            }
        }
    }
    None
}

impl HandoffList {
    #[must_use]
    pub fn new(name: impl Into<String>, transition_seconds: f32) -> Self {
        Self {
            name: name.into(),
            transition_seconds: transition_seconds.max(0.0),
            entries: EntryList::new(),
        }
    }

    #[must_use]
    pub fn is_transitioning(&self, entry: EntryId) -> bool {
        self.entries
            .get(entry)
            .is_some_and(|e| e.transition.is_some())
    }
}

impl ItemListType for HandoffList {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_node(&mut self, tree_node: &Arc<SceneTreeNode>) -> EntryId {
        self.entries.insert(Entry {
            tree_node: tree_node.clone(),
            last_parent: tree_node.parent().as_ref().map(Arc::downgrade),
            transition: None,
        })
    }

    fn remove_node(&mut self, entry: EntryId) {
        self.entries.mark_removed(entry);
    }

    fn reparent_node(
        &mut self,
        entry: EntryId,
        new_parent: Option<&Arc<SceneTreeNode>>,
        old_world_transform: Mat4,
    ) {
        let Some(e) = self.entries.get_mut(entry) else {
            return;
        };
        let old_parent = e.last_parent.as_ref().and_then(Weak::upgrade);
        let common = lowest_common_ancestor(old_parent.as_ref(), new_parent);

        let relative_world = common
            .as_ref()
            .map_or(Mat4::IDENTITY, |c| c.world_transform());
        let from = Pose::decompose(relative_world.inverse() * old_world_transform);

        e.transition = if self.transition_seconds > 0.0 {
            common.map(|c| Transition {
                relative_to: Arc::downgrade(&c),
                from,
                elapsed: 0.0,
            })
        } else {
            None
        };
        e.last_parent = new_parent.map(Arc::downgrade);
    }

    fn pre_transform_update(&mut self, dt_seconds: f32) {
        for (_, entry) in self.entries.iter_mut() {
            let Some(transition) = &mut entry.transition else {
                continue;
            };
            let Some(relative_to) = transition.relative_to.upgrade() else {
                entry.transition = None;
                continue;
            };

            transition.elapsed += dt_seconds;
            let t = (transition.elapsed / self.transition_seconds).clamp(0.0, 1.0);

            let to = Pose::decompose(
                relative_to.world_transform().inverse() * entry.tree_node.world_transform(),
            );
            let blended = Pose::lerp(transition.from, to, t);
            let world = relative_to.world_transform() * blended.compose();

            if t >= 1.0 {
                // Land on the exact pose the parent chain alone would now
                // produce, then hand propagation back to `local_transform`.
                entry.tree_node.set_local_transform(
                    entry
                        .tree_node
                        .parent()
                        .map_or(world, |p| p.world_transform().inverse() * world),
                );
                entry.tree_node.set_base_transform(None, false);
                entry.transition = None;
            } else {
                // Absolute: the common ancestor driving this transition may
                // not be the node's direct parent, so skip parent
                // multiplication entirely rather than re-deriving a
                // parent-relative local transform every frame.
                entry.tree_node.set_base_transform(Some(world), true);
            }
        }
    }

    fn commit(&mut self) {
        self.entries.compact();
    }
}
