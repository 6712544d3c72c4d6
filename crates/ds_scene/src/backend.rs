//! Minimal seams for the render backend this subsystem drives but does not
//! implement (spec.md's Non-goals explicitly exclude the GPU driver layer,
//! shader compilation, and the render graph).
//!
//! Item lists like [`crate::lists::TransformData`] and
//! [`crate::lists::FullScreenResolve`] need *something* to hand their
//! prepared per-frame data to once `commit()` runs; these traits are that
//! seam. A real backend (wgpu, Vulkan, whatever) implements them outside
//! this crate; nothing here does GPU work.

/// Records draw calls and state changes for one render pass.
pub trait CommandBuffer: Send {
    fn bind_shader(&mut self, shader: &dyn Shader);
    fn bind_material(&mut self, material: &dyn Material);
    fn draw(&mut self, vertex_count: u32, instance_count: u32);
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32);
}

/// An opaque compiled shader program.
pub trait Shader: Send + Sync {
    fn name(&self) -> &str;
}

/// A bound set of shader parameters (textures, uniform buffers, ...).
pub trait Material: Send + Sync {
    fn shader(&self) -> &dyn Shader;
}

/// Drives one or more render passes over a [`CommandBuffer`].
pub trait Renderer: Send + Sync {
    fn begin_frame(&mut self) -> Box<dyn CommandBuffer>;
    fn submit(&mut self, command_buffer: Box<dyn CommandBuffer>);
}

/// One render pass's worth of target/viewport state, handed to item lists'
/// `pre_render_pass` hook so they can cull or select LODs for that pass
/// specifically.
pub trait RenderPass: Send + Sync {
    fn name(&self) -> &str;
    fn viewport(&self) -> (u32, u32, u32, u32);
}
