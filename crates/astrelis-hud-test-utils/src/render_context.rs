//! Traits abstracting the GPU device and the draw-submission pass.
//!
//! [`RenderContext`] covers resource creation and queue writes, [`DrawTarget`]
//! covers issuing a draw into whatever pass the host engine is recording.

use crate::gpu_types::*;
use wgpu::{
    BindGroupLayoutDescriptor, BufferDescriptor, SamplerDescriptor, ShaderModuleDescriptor,
    TextureDescriptor, TextureViewDescriptor,
};

/// Trait abstracting GPU resource creation and queue operations.
///
/// Methods take `&self` and return owned wrapper types, so one context can be
/// shared between several HUD components behind an `Arc<dyn RenderContext>`
/// and mock implementations can record calls through interior mutability.
///
/// # Example
///
/// ```rust,no_run
/// use astrelis_hud_test_utils::RenderContext;
/// use wgpu::{BufferDescriptor, BufferUsages};
///
/// fn upload(ctx: &dyn RenderContext, bytes: &[u8]) {
///     let buffer = ctx.create_buffer(&BufferDescriptor {
///         label: Some("scratch"),
///         size: bytes.len() as u64,
///         usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     });
///     ctx.write_buffer(&buffer, 0, bytes);
/// }
/// ```
pub trait RenderContext: Send + Sync {
    // Buffer operations

    /// Create a GPU buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer;

    /// Write `data` into `buffer` at byte `offset`.
    ///
    /// For real buffers this maps to `queue.write_buffer()`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    // Texture operations

    /// Create a GPU texture.
    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture;

    /// Overwrite one layer of a 2D texture array, starting at texel (0, 0).
    fn write_texture_layer(&self, texture: &GpuTexture, write: TextureLayerWrite, data: &[u8]);

    /// Create a view of a texture.
    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        desc: &TextureViewDescriptor,
    ) -> GpuTextureView;

    /// Create a texture sampler.
    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler;

    // Shader and pipeline operations

    /// Create a shader module from source code.
    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule;

    /// Create a bind group layout.
    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout;

    /// Create a bind group from wrapped resources.
    fn create_bind_group(&self, desc: &GpuBindGroupDescriptor) -> GpuBindGroup;

    /// Create a render pipeline (and its layout) from wrapped resources.
    fn create_render_pipeline(&self, desc: &GpuRenderPipelineDescriptor) -> GpuRenderPipeline;
}

/// World-space bounding volume submitted with a draw.
///
/// Host engines that cull per draw use this; `wgpu` passes ignore it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawBounds {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
}

impl DrawBounds {
    /// A cube of edge length `size` centred on the origin.
    pub fn cube(size: f32) -> Self {
        let half = size * 0.5;
        Self {
            center: [0.0; 3],
            half_extents: [half; 3],
        }
    }
}

/// Everything needed to issue one indexed, instanced, indirect draw.
#[derive(Clone, Copy, Debug)]
pub struct IndexedIndirectDraw<'a> {
    pub pipeline: &'a GpuRenderPipeline,
    pub bind_group: &'a GpuBindGroup,
    pub vertex_buffer: &'a GpuBuffer,
    pub index_buffer: &'a GpuBuffer,
    pub index_format: wgpu::IndexFormat,
    pub indirect_buffer: &'a GpuBuffer,
    /// Byte offset of the argument block inside `indirect_buffer`.
    pub indirect_offset: u64,
    pub bounds: DrawBounds,
}

/// The host draw-submission collaborator.
///
/// The call is treated as synchronous: it has completed from the caller's
/// point of view before the next frame mutates the argument buffer.
pub trait DrawTarget {
    fn draw_indexed_indirect(&mut self, draw: &IndexedIndirectDraw<'_>);
}

impl DrawTarget for wgpu::RenderPass<'_> {
    fn draw_indexed_indirect(&mut self, draw: &IndexedIndirectDraw<'_>) {
        self.set_pipeline(draw.pipeline.as_wgpu());
        self.set_bind_group(0, draw.bind_group.as_wgpu(), &[]);
        self.set_vertex_buffer(0, draw.vertex_buffer.as_wgpu().slice(..));
        self.set_index_buffer(draw.index_buffer.as_wgpu().slice(..), draw.index_format);
        wgpu::RenderPass::draw_indexed_indirect(
            self,
            draw.indirect_buffer.as_wgpu(),
            draw.indirect_offset,
        );
    }
}
