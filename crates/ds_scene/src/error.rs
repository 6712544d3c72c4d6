//! Re-exports the shared error taxonomy (spec.md §7).

pub use ds_core::error::{Error, Result};
