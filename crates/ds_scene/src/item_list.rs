//! The scene item-list execution pipeline (spec.md §4.6).
//!
//! An item list is a polymorphic processor (`ItemListType`) that tracks a
//! subset of the scene's tree nodes and runs one stage of the frame
//! pipeline over them — computing transforms, preparing draw data,
//! resolving a render pass, and so on. [`EntryList`] is the dense-array
//! storage every concrete item list (`crate::lists::*`) builds on: ids are
//! monotonic and never reused even though the backing storage is a plain
//! `Vec`, because removal is lazy (marked, then compacted in one pass
//! rather than shifting the array on every single remove).

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::tree::SceneTreeNode;

/// Identifies one node's registration with one item list. Monotonically
/// increasing and never reused, so a stale id from before a `remove_node`
/// can never silently refer to a different, later entry.
pub type EntryId = u64;

/// Lifecycle hooks an item list implements to participate in the frame
/// pipeline. Every hook has a default no-op body except `add_node` and
/// `remove_node`, the two every item list must implement to have any
/// entries at all.
pub trait ItemListType: Send + Sync {
    fn name(&self) -> &str;

    /// Registers `tree_node` with this item list, returning the entry id
    /// to address it by afterward.
    fn add_node(&mut self, tree_node: &Arc<SceneTreeNode>) -> EntryId;

    /// Called when the scene node backing `entry` was mutated in a way the
    /// item list needs to know about (e.g. its attached node data changed).
    fn update_node(&mut self, _entry: EntryId) {}

    /// Unregisters `entry`. Implementations should mark the slot for lazy
    /// removal rather than compacting immediately; `commit` is where
    /// compaction happens.
    fn remove_node(&mut self, entry: EntryId);

    /// Called after `entry`'s tree node has already been moved under
    /// `new_parent`. `old_world_transform` is the node's world transform
    /// immediately before the move, letting a list that cares about visual
    /// continuity (e.g. [`crate::lists::handoff::HandoffList`]) start a
    /// transition from where the node actually was.
    fn reparent_node(
        &mut self,
        _entry: EntryId,
        _new_parent: Option<&Arc<SceneTreeNode>>,
        _old_world_transform: Mat4,
    ) {
    }

    /// Runs before the scene's tree-wide transform propagation. A list
    /// that drives a node's transform externally (e.g.
    /// [`crate::lists::handoff::HandoffList`]) must set its
    /// `base_transform` here rather than in `update`, so the propagation
    /// that immediately follows — and this frame's render — sees it.
    fn pre_transform_update(&mut self, _dt_seconds: f32) {}

    /// Per-frame update, after transforms are current.
    fn update(&mut self, _dt_seconds: f32) {}

    /// Runs immediately before a render pass that uses this item list.
    fn pre_render_pass(&mut self) {}

    /// Compacts pending removals and otherwise finalizes this frame's
    /// state for consumption by the renderer.
    fn commit(&mut self) {}

    /// Releases any resources this item list owns (e.g. process-wide
    /// shared geometry refcounts). Called once, when the item list itself
    /// is being torn down.
    fn destroy(&mut self) {}
}

struct Slot<T> {
    id: EntryId,
    data: T,
}

/// Dense-array storage for an item list's entries, with O(1) lookup by
/// [`EntryId`] and lazy, batched removal.
pub struct EntryList<T> {
    slots: Vec<Slot<T>>,
    index_of: FxHashMap<EntryId, usize>,
    pending_remove: Vec<usize>,
    next_id: EntryId,
}

impl<T> Default for EntryList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntryList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            index_of: FxHashMap::default(),
            pending_remove: Vec::new(),
            next_id: 0,
        }
    }

    /// Inserts `data` under a freshly minted id.
    pub fn insert(&mut self, data: T) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        let index = self.slots.len();
        self.slots.push(Slot { id, data });
        self.index_of.insert(id, index);
        id
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.index_of.get(&id).map(|&i| &self.slots[i].data)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        let index = *self.index_of.get(&id)?;
        Some(&mut self.slots[index].data)
    }

    /// Marks `id` for removal. The slot still exists (and is still
    /// iterated by [`Self::iter`]) until the next [`Self::compact`].
    pub fn mark_removed(&mut self, id: EntryId) {
        if let Some(index) = self.index_of.remove(&id) {
            self.pending_remove.push(index);
        }
    }

    /// Compacts every slot marked since the last compaction out of the
    /// dense array via swap-remove, in descending index order so earlier
    /// removals don't invalidate later indices.
    pub fn compact(&mut self) {
        if self.pending_remove.is_empty() {
            return;
        }
        self.pending_remove.sort_unstable();
        self.pending_remove.dedup();
        for &index in self.pending_remove.iter().rev() {
            self.slots.swap_remove(index);
            if index < self.slots.len() {
                let moved_id = self.slots[index].id;
                self.index_of.insert(moved_id, index);
            }
        }
        self.pending_remove.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.pending_remove.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &T)> {
        self.slots.iter().map(|s| (s.id, &s.data))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntryId, &mut T)> {
        self.slots.iter_mut().map(|s| (s.id, &mut s.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut list: EntryList<&'static str> = EntryList::new();
        let a = list.insert("a");
        let b = list.insert("b");
        list.mark_removed(a);
        list.compact();
        let c = list.insert("c");
        assert!(c > b);
        assert_ne!(c, a);
    }

    #[test]
    fn removal_is_lazy_until_compact() {
        let mut list: EntryList<u32> = EntryList::new();
        let a = list.insert(1);
        let _b = list.insert(2);
        list.mark_removed(a);
        assert_eq!(list.iter().count(), 2, "slot still present before compact");
        assert_eq!(list.len(), 1, "logical length already reflects the removal");
        list.compact();
        assert_eq!(list.iter().count(), 1);
        assert!(list.get(a).is_none());
    }

    #[test]
    fn compact_preserves_remaining_entries_lookup() {
        let mut list: EntryList<u32> = EntryList::new();
        let ids: Vec<_> = (0..5).map(|i| list.insert(i)).collect();
        list.mark_removed(ids[1]);
        list.mark_removed(ids[3]);
        list.compact();
        assert_eq!(list.len(), 3);
        for (i, &id) in ids.iter().enumerate() {
            if i == 1 || i == 3 {
                assert!(list.get(id).is_none());
            } else {
                assert_eq!(*list.get(id).unwrap(), i as u32);
            }
        }
    }
}
