//! Text rendering data preparation (spec.md §4.7).

pub mod render_buffer;

pub use render_buffer::{
    CommittedText, GlyphKind, GlyphVertex, IndexWidth, TessellatedGlyphVertex, TextRenderBuffer,
};
