//! Re-exports the shared error taxonomy (spec.md §7) so callers of this
//! crate don't need to depend on `ds_core` directly just to name the error
//! type.

pub use ds_core::error::{Error, Result};
