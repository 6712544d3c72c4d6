//! Scene graph and item-list execution pipeline.

pub mod backend;
pub mod error;
pub mod item_list;
pub mod lists;
pub mod node;
pub mod scene;
pub mod tree;

pub use item_list::{EntryId, ItemListType};
pub use node::{NodeData, SceneNode};
pub use scene::Scene;
pub use tree::SceneTreeNode;
