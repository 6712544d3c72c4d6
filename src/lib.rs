//! DeepSea foundation runtime and scene execution core.
//!
//! This crate is a thin facade re-exporting the engine's member crates, the
//! same way the rest of the DeepSea engine's umbrella crate ties its
//! modules together:
//!
//! - [`ds_core`] — allocators, threads, streams/archives, errors, logging,
//!   profiling.
//! - [`ds_resources`] — thread-scoped resource contexts and the GPU
//!   resource manager.
//! - [`ds_scene`] — the scene graph and item-list execution pipeline.
//! - [`ds_render`] — text and vector draw data preparation.

pub use ds_core as core;
pub use ds_render as render;
pub use ds_resources as resources;
pub use ds_scene as scene;
