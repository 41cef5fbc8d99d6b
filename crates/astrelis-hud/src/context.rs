//! Real GPU context backing [`RenderContext`].
//!
//! The HUD only needs storage buffers, a texture array and one render
//! pipeline, so the context requests default limits and no optional features.

use std::sync::Arc;

use astrelis_hud_test_utils::{
    GpuBindGroup, GpuBindGroupDescriptor, GpuBindGroupLayout, GpuBindingResource, GpuBuffer,
    GpuRenderPipeline, GpuRenderPipelineDescriptor, GpuSampler, GpuShaderModule, GpuTexture,
    GpuTextureView, RenderContext, TextureLayerWrite,
};
use wgpu::{
    BindGroupLayoutDescriptor, BufferDescriptor, SamplerDescriptor, ShaderModuleDescriptor,
    TextureDescriptor, TextureViewDescriptor,
};

use crate::error::HudResult;

/// A shared wgpu instance, adapter, device and queue.
///
/// ```rust,no_run
/// use astrelis_hud::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync().expect("no GPU");
/// let ctx2 = ctx.clone(); // Cheap clone (Arc)
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

/// Adapter and device selection.
#[derive(Debug, Clone)]
pub struct GraphicsContextDescriptor {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub limits: wgpu::Limits,
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            limits: wgpu::Limits::default(),
            label: Some("HUD Device"),
        }
    }
}

impl GraphicsContext {
    pub async fn new_owned() -> HudResult<Arc<Self>> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Blocks the current thread until the context is created.
    pub fn new_owned_sync() -> HudResult<Arc<Self>> {
        pollster::block_on(Self::new_owned())
    }

    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> HudResult<Arc<Self>> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await
            .inspect_err(|err| tracing::warn!("No GPU adapter for the HUD: {}", err))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_limits: descriptor.limits.clone(),
                label: descriptor.label,
                ..Default::default()
            })
            .await?;

        tracing::info!("Created HUD graphics context on {}", adapter.get_info().name);

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        GpuBuffer::from_wgpu(self.device.create_buffer(desc))
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer.as_wgpu(), offset, data);
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        GpuTexture::from_wgpu(self.device.create_texture(desc))
    }

    fn write_texture_layer(&self, texture: &GpuTexture, write: TextureLayerWrite, data: &[u8]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: texture.as_wgpu(),
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: write.layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(write.bytes_per_row),
                rows_per_image: Some(write.height),
            },
            wgpu::Extent3d {
                width: write.width,
                height: write.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        desc: &TextureViewDescriptor,
    ) -> GpuTextureView {
        GpuTextureView::from_wgpu(texture.as_wgpu().create_view(desc))
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler {
        GpuSampler::from_wgpu(self.device.create_sampler(desc))
    }

    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule {
        GpuShaderModule::from_wgpu(self.device.create_shader_module(desc.clone()))
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        GpuBindGroupLayout::from_wgpu(self.device.create_bind_group_layout(desc))
    }

    fn create_bind_group(&self, desc: &GpuBindGroupDescriptor) -> GpuBindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = desc
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupEntry {
                binding: entry.binding,
                resource: match entry.resource {
                    GpuBindingResource::Buffer(buffer) => buffer.as_wgpu().as_entire_binding(),
                    GpuBindingResource::TextureView(view) => {
                        wgpu::BindingResource::TextureView(view.as_wgpu())
                    }
                    GpuBindingResource::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(sampler.as_wgpu())
                    }
                },
            })
            .collect();

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: desc.label,
            layout: desc.layout.as_wgpu(),
            entries: &entries,
        });
        GpuBindGroup::from_wgpu(bind_group)
    }

    fn create_render_pipeline(&self, desc: &GpuRenderPipelineDescriptor) -> GpuRenderPipeline {
        let layouts: Vec<&wgpu::BindGroupLayout> = desc
            .bind_group_layouts
            .iter()
            .map(|layout| layout.as_wgpu())
            .collect();

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: desc.label,
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label,
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: desc.shader.as_wgpu(),
                    entry_point: Some(desc.vertex_entry),
                    buffers: desc.vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: desc.shader.as_wgpu(),
                    entry_point: Some(desc.fragment_entry),
                    targets: &[Some(desc.color_target.clone())],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: desc.primitive,
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        GpuRenderPipeline::from_wgpu(pipeline)
    }
}
