//! Vector graphics draw data preparation (spec.md §4.8).

pub mod prepare;

pub use prepare::{VectorDrawPrepare, VectorImageNodeData, VectorImageSource, VectorVertex};
