//! `TextRenderBuffer`: accumulates glyph quads into vertex/index buffers
//! ready for a single draw call (spec.md §4.7).
//!
//! Grounded on `Text/src/TextRenderBuffer.c`. Three choices from the
//! original are preserved exactly rather than simplified away:
//!
//! - Glyphs are partitioned into a "standard" bucket and an "icon" bucket
//!   up front, since icon glyphs (emoji, bitmap icon fonts) never need the
//!   tessellated vertex layout standard text curves sometimes do, and
//!   mixing them would force every vertex to carry fields only some of
//!   them use.
//! - The index buffer is 16-bit when the vertex count fits and 32-bit only
//!   when it doesn't, rather than always picking the wider format for
//!   simplicity — text rendering is one of the highest glyph-count, most
//!   bandwidth-sensitive draw paths in the engine.
//! - `commit` triggers early once a partition crosses three-quarters full,
//!   not only when completely full, so a caller streaming glyphs in doesn't
//!   stall waiting for the last few percent of a buffer that's already
//!   large enough to amortize the draw call.

use bytemuck::Pod;

use ds_core::error::{track_error, Error, Result};
use ds_scene::backend::{CommandBuffer, Material, Shader};

/// Which partition a glyph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Standard,
    Icon,
}

/// Whether the index buffer addresses vertices with 16 or 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// Picks the narrowest width that can address `vertex_capacity`
    /// vertices.
    #[must_use]
    pub fn for_vertex_capacity(vertex_capacity: usize) -> Self {
        if vertex_capacity <= u16::MAX as usize + 1 {
            IndexWidth::U16
        } else {
            IndexWidth::U32
        }
    }

    #[must_use]
    pub fn bytes_per_index(self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// A non-tessellated glyph vertex: a plain textured, tinted quad corner.
/// Used for the icon partition, and for the standard partition when the
/// font doesn't need curve tessellation.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: [u8; 4],
}

/// A tessellated glyph vertex, carrying the extra per-vertex curve
/// parameters an SDF/Bezier glyph rendering technique needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TessellatedGlyphVertex {
    pub base: GlyphVertex,
    pub geometry_params: [f32; 4],
}

struct Partition<V> {
    vertices: Vec<V>,
    /// Indices stored widened to `u32`; narrowed to the buffer's actual
    /// [`IndexWidth`] only when packed for upload via [`Self::pack_indices`].
    indices: Vec<u32>,
    capacity_glyphs: usize,
}

impl<V: Pod> Partition<V> {
    fn new(capacity_glyphs: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity_glyphs * 4),
            indices: Vec::with_capacity(capacity_glyphs * 6),
            capacity_glyphs,
        }
    }

    fn glyph_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn is_full(&self) -> bool {
        self.glyph_count() >= self.capacity_glyphs
    }

    /// True once this partition has used at least three-quarters of its
    /// glyph capacity, the early-commit threshold.
    fn is_three_quarters_full(&self) -> bool {
        self.glyph_count() * 4 >= self.capacity_glyphs * 3
    }

    fn add_glyph(&mut self, quad: [V; 4]) -> Result<()> {
        if self.is_full() {
            return Err(Error::OutOfRange(format!(
                "glyph partition is full at {} glyphs",
                self.capacity_glyphs
            )));
        }
        let base = self.vertices.len() as u32;
        self.vertices.extend(quad);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        Ok(())
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    fn pack_indices(&self, width: IndexWidth) -> Vec<u8> {
        match width {
            IndexWidth::U16 => self
                .indices
                .iter()
                .flat_map(|&i| (i as u16).to_le_bytes())
                .collect(),
            IndexWidth::U32 => self
                .indices
                .iter()
                .flat_map(|&i| i.to_le_bytes())
                .collect(),
        }
    }
}

/// Accumulates standard and icon glyph quads for one text draw call.
pub struct TextRenderBuffer<V: Pod> {
    index_width: IndexWidth,
    standard: Partition<V>,
    icon: Partition<V>,
}

impl<V: Pod> TextRenderBuffer<V> {
    /// Creates a buffer sized for `standard_capacity` standard glyphs and
    /// `icon_capacity` icon glyphs. The index width is picked once, up
    /// front, from the larger of the two partitions' vertex counts, since
    /// both partitions are drawn from the same logical buffer set.
    #[must_use]
    pub fn new(standard_capacity: usize, icon_capacity: usize) -> Self {
        let max_vertices = standard_capacity.max(icon_capacity) * 4;
        Self {
            index_width: IndexWidth::for_vertex_capacity(max_vertices),
            standard: Partition::new(standard_capacity),
            icon: Partition::new(icon_capacity),
        }
    }

    #[must_use]
    pub fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    fn partition(&self, kind: GlyphKind) -> &Partition<V> {
        match kind {
            GlyphKind::Standard => &self.standard,
            GlyphKind::Icon => &self.icon,
        }
    }

    fn partition_mut(&mut self, kind: GlyphKind) -> &mut Partition<V> {
        match kind {
            GlyphKind::Standard => &mut self.standard,
            GlyphKind::Icon => &mut self.icon,
        }
    }

    /// Appends one glyph's quad (four corner vertices, in
    /// bottom-left/bottom-right/top-left/top-right winding) to `kind`'s
    /// partition.
    pub fn add_glyph(&mut self, kind: GlyphKind, quad: [V; 4]) -> Result<()> {
        self.partition_mut(kind).add_glyph(quad).map_err(track_error)
    }

    /// True once either partition has crossed the three-quarters-full
    /// threshold and should be committed before more glyphs arrive.
    #[must_use]
    pub fn should_commit(&self) -> bool {
        self.standard.is_three_quarters_full() || self.icon.is_three_quarters_full()
    }

    /// Packs both partitions' vertex and index data ready for upload, in
    /// `(standard, icon)` order, and clears the buffer for the next batch.
    pub fn commit(&mut self) -> CommittedText<V> {
        let committed = CommittedText {
            standard_vertices: std::mem::take(&mut self.standard.vertices),
            standard_indices: self.standard.pack_indices(self.index_width),
            icon_vertices: std::mem::take(&mut self.icon.vertices),
            icon_indices: self.icon.pack_indices(self.index_width),
            index_width: self.index_width,
        };
        self.standard.clear();
        self.icon.clear();
        committed
    }

    #[must_use]
    pub fn glyph_count(&self, kind: GlyphKind) -> usize {
        self.partition(kind).glyph_count()
    }
}

/// The result of [`TextRenderBuffer::commit`]: packed, upload-ready vertex
/// and index data for both partitions.
pub struct CommittedText<V> {
    pub standard_vertices: Vec<V>,
    pub standard_indices: Vec<u8>,
    pub icon_vertices: Vec<V>,
    pub icon_indices: Vec<u8>,
    pub index_width: IndexWidth,
}

impl<V> CommittedText<V> {
    /// Issues one indexed draw call per non-empty partition: standard
    /// glyphs first (their own shader/material, typically tessellated),
    /// then icons (a plain textured quad shader/material). A partition
    /// with nothing committed is skipped rather than issuing a zero-index
    /// draw.
    pub fn draw(
        &self,
        command_buffer: &mut dyn CommandBuffer,
        standard_shader: &dyn Shader,
        standard_material: &dyn Material,
        icon_shader: &dyn Shader,
        icon_material: &dyn Material,
    ) {
        let bytes_per_index = self.index_width.bytes_per_index() as u32;
        if !self.standard_vertices.is_empty() {
            command_buffer.bind_shader(standard_shader);
            command_buffer.bind_material(standard_material);
            command_buffer
                .draw_indexed(self.standard_indices.len() as u32 / bytes_per_index, 1);
        }
        if !self.icon_vertices.is_empty() {
            command_buffer.bind_shader(icon_shader);
            command_buffer.bind_material(icon_material);
            command_buffer.draw_indexed(self.icon_indices.len() as u32 / bytes_per_index, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockShader(&'static str);
    impl Shader for MockShader {
        fn name(&self) -> &str {
            self.0
        }
    }

    struct MockMaterial<'a>(&'a MockShader);
    impl<'a> Material for MockMaterial<'a> {
        fn shader(&self) -> &dyn Shader {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingCommandBuffer {
        bound_shaders: Vec<String>,
        indexed_draws: Vec<(u32, u32)>,
    }
    impl CommandBuffer for RecordingCommandBuffer {
        fn bind_shader(&mut self, shader: &dyn Shader) {
            self.bound_shaders.push(shader.name().to_string());
        }
        fn bind_material(&mut self, _material: &dyn Material) {}
        fn draw(&mut self, _vertex_count: u32, _instance_count: u32) {}
        fn draw_indexed(&mut self, index_count: u32, instance_count: u32) {
            self.indexed_draws.push((index_count, instance_count));
        }
    }

    fn quad(x: f32) -> [GlyphVertex; 4] {
        [
            GlyphVertex { position: [x, 0.0, 0.0], tex_coord: [0.0, 0.0], color: [255; 4] },
            GlyphVertex { position: [x + 1.0, 0.0, 0.0], tex_coord: [1.0, 0.0], color: [255; 4] },
            GlyphVertex { position: [x, 1.0, 0.0], tex_coord: [0.0, 1.0], color: [255; 4] },
            GlyphVertex { position: [x + 1.0, 1.0, 0.0], tex_coord: [1.0, 1.0], color: [255; 4] },
        ]
    }

    #[test]
    fn standard_and_icon_glyphs_are_kept_in_separate_partitions() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(16, 16);
        buf.add_glyph(GlyphKind::Standard, quad(0.0)).unwrap();
        buf.add_glyph(GlyphKind::Icon, quad(10.0)).unwrap();
        assert_eq!(buf.glyph_count(GlyphKind::Standard), 1);
        assert_eq!(buf.glyph_count(GlyphKind::Icon), 1);
    }

    #[test]
    fn full_partition_rejects_further_glyphs() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(2, 2);
        buf.add_glyph(GlyphKind::Standard, quad(0.0)).unwrap();
        buf.add_glyph(GlyphKind::Standard, quad(1.0)).unwrap();
        assert!(matches!(
            buf.add_glyph(GlyphKind::Standard, quad(2.0)),
            Err(Error::OutOfRange(_))
        ));
    }

    #[test]
    fn should_commit_triggers_at_three_quarters_full() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(4, 4);
        assert!(!buf.should_commit());
        for i in 0..3 {
            buf.add_glyph(GlyphKind::Standard, quad(i as f32)).unwrap();
        }
        assert!(buf.should_commit());
    }

    #[test]
    fn large_capacity_selects_32_bit_indices() {
        let buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(20_000, 0);
        assert_eq!(buf.index_width(), IndexWidth::U32);
        let small: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(10, 10);
        assert_eq!(small.index_width(), IndexWidth::U16);
    }

    #[test]
    fn commit_clears_the_buffer_and_packs_indices() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(10, 10);
        buf.add_glyph(GlyphKind::Standard, quad(0.0)).unwrap();
        let committed = buf.commit();
        assert_eq!(committed.standard_vertices.len(), 4);
        assert_eq!(committed.standard_indices.len(), 6 * 2);
        assert_eq!(buf.glyph_count(GlyphKind::Standard), 0);
    }

    #[test]
    fn draw_issues_one_indexed_draw_per_nonempty_partition() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(10, 10);
        buf.add_glyph(GlyphKind::Standard, quad(0.0)).unwrap();
        buf.add_glyph(GlyphKind::Standard, quad(1.0)).unwrap();
        let committed = buf.commit();

        let standard_shader = MockShader("standard");
        let standard_material = MockMaterial(&standard_shader);
        let icon_shader = MockShader("icon");
        let icon_material = MockMaterial(&icon_shader);
        let mut cmd = RecordingCommandBuffer::default();

        committed.draw(
            &mut cmd,
            &standard_shader,
            &standard_material,
            &icon_shader,
            &icon_material,
        );

        assert_eq!(cmd.bound_shaders, vec!["standard".to_string()]);
        assert_eq!(cmd.indexed_draws, vec![(12, 1)]);
    }

    #[test]
    fn draw_skips_an_empty_partition() {
        let mut buf: TextRenderBuffer<GlyphVertex> = TextRenderBuffer::new(10, 10);
        buf.add_glyph(GlyphKind::Icon, quad(0.0)).unwrap();
        let committed = buf.commit();

        let standard_shader = MockShader("standard");
        let standard_material = MockMaterial(&standard_shader);
        let icon_shader = MockShader("icon");
        let icon_material = MockMaterial(&icon_shader);
        let mut cmd = RecordingCommandBuffer::default();

        committed.draw(
            &mut cmd,
            &standard_shader,
            &standard_material,
            &icon_shader,
            &icon_material,
        );

        assert_eq!(cmd.bound_shaders, vec!["icon".to_string()]);
        assert_eq!(cmd.indexed_draws, vec![(6, 1)]);
    }
}
