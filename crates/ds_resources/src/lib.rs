//! Thread-scoped resource contexts and the GPU resource manager.

pub mod context;
pub mod error;
pub mod manager;

pub use context::ResourceContext;
pub use manager::{ResourceClass, ResourceManager};
