//! Single-draw render pipeline for the HUD.
//!
//! Every HUD element is one instance of a shared unit quad. The instance count
//! lives in a small indirect argument buffer; each frame only that field is
//! rewritten and one `draw_indexed_indirect` is issued. Billboarding, SDF
//! text, health-bar clipping and floating-text motion all run in the shader.

use std::sync::Arc;

use astrelis_hud_test_utils::{
    DrawBounds, DrawTarget, GpuBindGroup, GpuBindGroupDescriptor, GpuBindGroupEntry,
    GpuBindGroupLayout, GpuBindingResource, GpuBuffer, GpuRenderPipeline,
    GpuRenderPipelineDescriptor, GpuSampler, GpuTextureView, IndexedIndirectDraw, RenderContext,
    TextureLayerWrite,
};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::{
    config::{FloatingTextConfig, ShaderParams},
    error::{HudError, HudResult},
    profiling::profile_function,
    shader::{HUD_SHADER_NAME, ShaderProvider},
};

/// Edge length of the cube submitted as the draw's bounding volume.
///
/// Elements are anchored in world space but face the screen, so no tight
/// bound exists; the host must never cull the HUD draw.
pub const DRAW_BOUNDS_SIZE: f32 = 10_000.0;

/// Edge length of the opaque white atlas used until one is supplied.
pub const DEFAULT_ATLAS_SIZE: u32 = 256;

/// Indexed indirect draw arguments, laid out as `draw_indexed_indirect`
/// expects them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DrawIndexedIndirect {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

// SAFETY: DrawIndexedIndirect is a repr(C) struct of 4-byte integers with no padding
unsafe impl Pod for DrawIndexedIndirect {}
unsafe impl Zeroable for DrawIndexedIndirect {}

static_assertions::const_assert_eq!(std::mem::size_of::<DrawIndexedIndirect>(), 20);

impl DrawIndexedIndirect {
    /// Byte offset of `instance_count`, the only field rewritten per frame.
    pub const INSTANCE_COUNT_OFFSET: u64 =
        std::mem::offset_of!(DrawIndexedIndirect, instance_count) as u64;

    pub const fn new(
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> Self {
        Self {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        }
    }

    pub const fn size() -> u64 {
        std::mem::size_of::<Self>() as u64
    }
}

/// Uniform block shared by both shader stages.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct HudParams {
    pub view_proj: [[f32; 4]; 4],
    /// Viewport size in pixels.
    pub viewport: [f32; 2],
    /// Clock reading in seconds, same timeline as floating-text start times.
    pub time: f32,
    pub sdf_threshold: f32,
    pub sdf_softness: f32,
    pub rise_height: f32,
    pub bounce_scale: f32,
    pub _padding: f32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<HudParams>(), 96);

impl HudParams {
    pub fn new(shader: &ShaderParams, floating_text: &FloatingTextConfig) -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            viewport: [1280.0, 720.0],
            time: 0.0,
            sdf_threshold: shader.sdf_threshold,
            sdf_softness: shader.sdf_softness,
            rise_height: floating_text.rise_height,
            bounce_scale: floating_text.bounce_scale,
            _padding: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    const fn new(position: [f32; 2], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

// V is flipped so atlas rows read top-down on every backend.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new([-0.5, -0.5], [0.0, 1.0]),
    QuadVertex::new([0.5, -0.5], [1.0, 1.0]),
    QuadVertex::new([0.5, 0.5], [1.0, 0.0]),
    QuadVertex::new([-0.5, 0.5], [0.0, 0.0]),
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 0,
    },
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 8,
        shader_location: 1,
    },
];

/// Resources the bind group references besides the renderer's own.
#[derive(Clone, Debug)]
struct BoundResources {
    instances: GpuBuffer,
    float_texts: GpuBuffer,
    avatars: GpuTextureView,
}

pub struct HudRenderer {
    ctx: Arc<dyn RenderContext>,
    pipeline: GpuRenderPipeline,
    bind_group_layout: GpuBindGroupLayout,
    bind_group: Option<GpuBindGroup>,
    bound: Option<BoundResources>,
    sampler: GpuSampler,
    atlas: GpuTextureView,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    params_buffer: GpuBuffer,
    indirect_buffer: GpuBuffer,
    params: HudParams,
    params_dirty: bool,
}

impl HudRenderer {
    /// Build the pipeline, quad geometry, argument buffer and default atlas.
    ///
    /// Fails with [`HudError::MissingShader`] before creating any GPU
    /// resource when `shaders` has no source for the HUD shader.
    pub fn new(
        ctx: Arc<dyn RenderContext>,
        shaders: &dyn ShaderProvider,
        target_format: wgpu::TextureFormat,
        params: HudParams,
    ) -> HudResult<Self> {
        let Some(source) = shaders.shader_source(HUD_SHADER_NAME) else {
            tracing::warn!("HUD shader '{}' not found, renderer disabled", HUD_SHADER_NAME);
            return Err(HudError::MissingShader {
                name: HUD_SHADER_NAME.to_string(),
            });
        };

        let shader = ctx.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some("HUD Shader"),
            source: wgpu::ShaderSource::Wgsl(source),
        });

        let bind_group_layout = ctx.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("HUD Bind Group Layout"),
            entries: &[
                // Instances
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Floating text records
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Params
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Atlas
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Avatar array
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = ctx.create_render_pipeline(&GpuRenderPipelineDescriptor {
            label: Some("HUD Pipeline"),
            shader: &shader,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            bind_group_layouts: &[&bind_group_layout],
            vertex_buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &QUAD_ATTRIBUTES,
            }],
            color_target: wgpu::ColorTargetState {
                format: target_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
        });

        let sampler = ctx.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("HUD Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let vertex_buffer = Self::create_filled_buffer(
            ctx.as_ref(),
            "HUD Quad Vertex Buffer",
            wgpu::BufferUsages::VERTEX,
            bytemuck::cast_slice(&QUAD_VERTICES),
        );
        let index_buffer = Self::create_filled_buffer(
            ctx.as_ref(),
            "HUD Quad Index Buffer",
            wgpu::BufferUsages::INDEX,
            bytemuck::cast_slice(&QUAD_INDICES),
        );
        let params_buffer = Self::create_filled_buffer(
            ctx.as_ref(),
            "HUD Params Buffer",
            wgpu::BufferUsages::UNIFORM,
            bytemuck::bytes_of(&params),
        );
        let indirect_buffer = Self::create_filled_buffer(
            ctx.as_ref(),
            "HUD Indirect Args Buffer",
            wgpu::BufferUsages::INDIRECT,
            bytemuck::bytes_of(&DrawIndexedIndirect::new(QUAD_INDICES.len() as u32, 0, 0, 0, 0)),
        );

        let atlas = Self::create_default_atlas(ctx.as_ref());

        tracing::debug!("HUD renderer created for {:?}", target_format);

        Ok(Self {
            ctx,
            pipeline,
            bind_group_layout,
            bind_group: None,
            bound: None,
            sampler,
            atlas,
            vertex_buffer,
            index_buffer,
            params_buffer,
            indirect_buffer,
            params,
            params_dirty: false,
        })
    }

    fn create_filled_buffer(
        ctx: &dyn RenderContext,
        label: &str,
        usage: wgpu::BufferUsages,
        contents: &[u8],
    ) -> GpuBuffer {
        let buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: contents.len() as u64,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.write_buffer(&buffer, 0, contents);
        buffer
    }

    fn create_default_atlas(ctx: &dyn RenderContext) -> GpuTextureView {
        let size = DEFAULT_ATLAS_SIZE;
        let texture = ctx.create_texture(&wgpu::TextureDescriptor {
            label: Some("HUD Default Atlas"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let white = vec![255u8; (size * size * 4) as usize];
        ctx.write_texture_layer(
            &texture,
            TextureLayerWrite {
                layer: 0,
                width: size,
                height: size,
                bytes_per_row: size * 4,
            },
            &white,
        );
        ctx.create_texture_view(&texture, &wgpu::TextureViewDescriptor::default())
    }

    /// Bind the instance and floating-text buffers and the avatar array.
    ///
    /// Until this is called [`render`](Self::render) draws nothing.
    pub fn bind(
        &mut self,
        instances: &GpuBuffer,
        float_texts: &GpuBuffer,
        avatars: &GpuTextureView,
    ) {
        self.bound = Some(BoundResources {
            instances: instances.clone(),
            float_texts: float_texts.clone(),
            avatars: avatars.clone(),
        });
        self.rebuild_bind_group();
    }

    /// Replace the static atlas (icons and SDF glyphs).
    pub fn set_atlas(&mut self, atlas: GpuTextureView) {
        self.atlas = atlas;
        self.rebuild_bind_group();
    }

    fn rebuild_bind_group(&mut self) {
        let Some(bound) = &self.bound else {
            return;
        };
        let bind_group = self.ctx.create_bind_group(&GpuBindGroupDescriptor {
            label: Some("HUD Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                GpuBindGroupEntry {
                    binding: 0,
                    resource: GpuBindingResource::Buffer(&bound.instances),
                },
                GpuBindGroupEntry {
                    binding: 1,
                    resource: GpuBindingResource::Buffer(&bound.float_texts),
                },
                GpuBindGroupEntry {
                    binding: 2,
                    resource: GpuBindingResource::Buffer(&self.params_buffer),
                },
                GpuBindGroupEntry {
                    binding: 3,
                    resource: GpuBindingResource::TextureView(&self.atlas),
                },
                GpuBindGroupEntry {
                    binding: 4,
                    resource: GpuBindingResource::TextureView(&bound.avatars),
                },
                GpuBindGroupEntry {
                    binding: 5,
                    resource: GpuBindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.bind_group = Some(bind_group);
    }

    pub fn is_bound(&self) -> bool {
        self.bind_group.is_some()
    }

    pub fn params(&self) -> &HudParams {
        &self.params
    }

    pub fn set_time(&mut self, time: f32) {
        if self.params.time != time {
            self.params.time = time;
            self.params_dirty = true;
        }
    }

    /// Camera transform and viewport size in pixels.
    pub fn set_camera(&mut self, view_proj: Mat4, viewport: Vec2) {
        self.params.view_proj = view_proj.to_cols_array_2d();
        self.params.viewport = viewport.to_array();
        self.params_dirty = true;
    }

    pub fn set_shader_params(&mut self, shader: &ShaderParams) {
        self.params.sdf_threshold = shader.sdf_threshold;
        self.params.sdf_softness = shader.sdf_softness;
        self.params_dirty = true;
    }

    /// Upload the uniform block if it changed. Returns whether it did.
    pub fn upload_params(&mut self) -> bool {
        if !self.params_dirty {
            return false;
        }
        self.ctx
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
        self.params_dirty = false;
        true
    }

    pub fn indirect_buffer(&self) -> &GpuBuffer {
        &self.indirect_buffer
    }

    pub fn params_buffer(&self) -> &GpuBuffer {
        &self.params_buffer
    }

    pub fn vertex_buffer(&self) -> &GpuBuffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &GpuBuffer {
        &self.index_buffer
    }

    /// Issue the single HUD draw for `active_count` instances.
    ///
    /// Does nothing and returns `false` when `active_count` is zero or no
    /// buffers are bound. Otherwise rewrites only the argument buffer's
    /// instance count, uploads changed params and submits one draw.
    pub fn render(&mut self, target: &mut dyn DrawTarget, active_count: usize) -> bool {
        profile_function!();

        if active_count == 0 || self.bind_group.is_none() {
            return false;
        }

        let count = u32::try_from(active_count).unwrap_or(u32::MAX);
        self.ctx.write_buffer(
            &self.indirect_buffer,
            DrawIndexedIndirect::INSTANCE_COUNT_OFFSET,
            bytemuck::bytes_of(&count),
        );
        self.upload_params();

        let Some(bind_group) = &self.bind_group else {
            return false;
        };
        target.draw_indexed_indirect(&IndexedIndirectDraw {
            pipeline: &self.pipeline,
            bind_group,
            vertex_buffer: &self.vertex_buffer,
            index_buffer: &self.index_buffer,
            index_format: wgpu::IndexFormat::Uint16,
            indirect_buffer: &self.indirect_buffer,
            indirect_offset: 0,
            bounds: DrawBounds::cube(DRAW_BOUNDS_SIZE),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{BuiltinShaders, ShaderLibrary};
    use astrelis_hud_test_utils::{MockRenderContext, MockRenderPass, RenderCall};

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn params() -> HudParams {
        HudParams::new(&ShaderParams::default(), &FloatingTextConfig::default())
    }

    fn renderer() -> (Arc<MockRenderContext>, HudRenderer) {
        let mock = Arc::new(MockRenderContext::new());
        let renderer = HudRenderer::new(mock.clone(), &BuiltinShaders, FORMAT, params()).unwrap();
        (mock, renderer)
    }

    fn storage(mock: &MockRenderContext, size: u64) -> GpuBuffer {
        mock.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn avatar_view(mock: &MockRenderContext) -> GpuTextureView {
        let texture = mock.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 4,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        mock.create_texture_view(&texture, &wgpu::TextureViewDescriptor::default())
    }

    fn bound_renderer() -> (Arc<MockRenderContext>, HudRenderer) {
        let (mock, mut renderer) = renderer();
        let instances = storage(&mock, 64 * 16);
        let float_texts = storage(&mock, 16 * 4);
        let avatars = avatar_view(&mock);
        renderer.bind(&instances, &float_texts, &avatars);
        mock.clear_calls();
        (mock, renderer)
    }

    fn args(mock: &MockRenderContext, renderer: &HudRenderer) -> DrawIndexedIndirect {
        bytemuck::pod_read_unaligned(&mock.buffer_contents(renderer.indirect_buffer()))
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(DrawIndexedIndirect::size(), 20);
        assert_eq!(DrawIndexedIndirect::INSTANCE_COUNT_OFFSET, 4);
        assert_eq!(std::mem::size_of::<HudParams>(), 96);
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
    }

    #[test]
    fn test_missing_shader_creates_nothing() {
        let mock = Arc::new(MockRenderContext::new());
        let result = HudRenderer::new(mock.clone(), &ShaderLibrary::new(), FORMAT, params());

        assert!(matches!(result, Err(HudError::MissingShader { .. })));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_initial_geometry_and_args() {
        let (mock, renderer) = renderer();

        assert_eq!(mock.count_shader_creates(), 1);
        assert_eq!(mock.count_render_pipeline_creates(), 1);
        assert_eq!(args(&mock, &renderer), DrawIndexedIndirect::new(6, 0, 0, 0, 0));
        assert_eq!(
            mock.buffer_usage(renderer.indirect_buffer()),
            Some(wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST)
        );

        let vertices = mock.buffer_contents(renderer.vertex_buffer());
        let first: QuadVertex = bytemuck::pod_read_unaligned(&vertices[..16]);
        assert_eq!(first.position, [-0.5, -0.5]);
        assert_eq!(first.uv, [0.0, 1.0]);

        let indices = mock.buffer_contents(renderer.index_buffer());
        let indices: [u16; 6] = bytemuck::pod_read_unaligned(&indices[..12]);
        assert_eq!(indices, [0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_default_atlas_is_white() {
        let (mock, _renderer) = renderer();
        let writes: Vec<_> = mock
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RenderCall::WriteTextureLayer { layer, size, .. } => Some((layer, size)),
                _ => None,
            })
            .collect();
        assert_eq!(writes, vec![(0, 256 * 256 * 4)]);
    }

    #[test]
    fn test_render_unbound_is_noop() {
        let (mock, mut renderer) = renderer();
        mock.clear_calls();
        let mut pass = MockRenderPass::new();

        assert!(!renderer.is_bound());
        assert!(!renderer.render(&mut pass, 100));
        assert_eq!(pass.draw_count(), 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_render_zero_count_is_noop() {
        let (mock, mut renderer) = bound_renderer();
        let mut pass = MockRenderPass::new();

        assert!(!renderer.render(&mut pass, 0));
        assert_eq!(pass.draw_count(), 0);
        assert_eq!(mock.count_buffer_writes(), 0);
    }

    #[test]
    fn test_render_writes_count_and_draws_once() {
        let (mock, mut renderer) = bound_renderer();
        let mut pass = MockRenderPass::new();

        assert!(renderer.render(&mut pass, 3120));

        assert_eq!(pass.draw_count(), 1);
        let draw = &pass.draws()[0];
        assert_eq!(draw.indirect_offset, 0);
        assert_eq!(draw.bounds, DrawBounds::cube(DRAW_BOUNDS_SIZE));
        assert_eq!(draw.indirect_buffer_id, renderer.indirect_buffer().mock_id());

        assert_eq!(mock.buffer_writes(renderer.indirect_buffer()), vec![(4, 4)]);
        assert_eq!(args(&mock, &renderer), DrawIndexedIndirect::new(6, 3120, 0, 0, 0));
    }

    #[test]
    fn test_params_upload_only_when_changed() {
        let (mock, mut renderer) = bound_renderer();
        let mut pass = MockRenderPass::new();

        renderer.render(&mut pass, 1);
        assert!(mock.buffer_writes(renderer.params_buffer()).is_empty());

        renderer.set_time(1.5);
        renderer.set_camera(Mat4::IDENTITY, Vec2::new(800.0, 600.0));
        renderer.render(&mut pass, 1);
        renderer.set_time(1.5);
        renderer.render(&mut pass, 1);

        assert_eq!(mock.buffer_writes(renderer.params_buffer()), vec![(0, 96)]);
        let uploaded: HudParams =
            bytemuck::pod_read_unaligned(&mock.buffer_contents(renderer.params_buffer()));
        assert_eq!(uploaded.time, 1.5);
        assert_eq!(uploaded.viewport, [800.0, 600.0]);
        assert_eq!(uploaded.sdf_threshold, 0.5);
    }

    #[test]
    fn test_set_atlas_rebinds() {
        let (mock, mut renderer) = bound_renderer();
        let atlas = avatar_view(&mock);

        renderer.set_atlas(atlas);
        assert_eq!(mock.count_bind_group_creates(), 1);
        assert!(renderer.is_bound());
    }
}
