//! Mock implementation of RenderContext and DrawTarget for testing.
//!
//! This module provides a mock GPU context that records operations
//! without actually interacting with the GPU. Buffer and texture writes
//! are applied to shadow copies so tests can assert on uploaded bytes.

use crate::{
    gpu_types::*,
    render_context::{DrawBounds, DrawTarget, IndexedIndirectDraw, RenderContext},
};
use parking_lot::Mutex;
use wgpu::*;

/// Records a GPU operation call for verification in tests.
#[derive(Debug, Clone)]
pub enum RenderCall {
    CreateBuffer {
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer_id: usize,
        offset: u64,
        size: usize,
    },
    CreateTexture {
        width: u32,
        height: u32,
        layers: u32,
        format: TextureFormat,
    },
    WriteTextureLayer {
        texture_id: usize,
        layer: u32,
        size: usize,
    },
    CreateTextureView {
        texture_id: usize,
    },
    CreateShaderModule {
        label: Option<String>,
    },
    CreateRenderPipeline {
        label: Option<String>,
    },
    CreateBindGroupLayout {
        label: Option<String>,
    },
    CreateBindGroup {
        label: Option<String>,
        entries: usize,
    },
    CreateSampler {
        label: Option<String>,
    },
}

/// Mock buffers stored in the context.
#[derive(Debug, Clone)]
struct MockBuffer {
    usage: BufferUsages,
    contents: Vec<u8>,
}

/// Mock textures stored in the context.
#[derive(Debug, Clone)]
struct MockTexture {
    size: Extent3d,
    bytes_per_texel: u32,
    contents: Vec<u8>,
}

impl MockTexture {
    fn layer_len(&self) -> usize {
        (self.size.width * self.size.height * self.bytes_per_texel) as usize
    }
}

/// Mock implementation of RenderContext for testing.
///
/// Methods take `&self` but need to mutate internal state, so everything sits
/// behind `parking_lot::Mutex` to keep the context `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use astrelis_hud_test_utils::{MockRenderContext, RenderContext};
/// use wgpu::*;
///
/// let mock = MockRenderContext::new();
///
/// let buffer = mock.create_buffer(&BufferDescriptor {
///     label: None,
///     size: 1024,
///     usage: BufferUsages::VERTEX,
///     mapped_at_creation: false,
/// });
///
/// assert!(buffer.is_mock());
/// assert_eq!(mock.count_buffer_creates(), 1);
/// ```
pub struct MockRenderContext {
    /// Recorded calls for verification
    calls: Mutex<Vec<RenderCall>>,

    /// Shadow buffers, indexed by mock id
    buffers: Mutex<Vec<MockBuffer>>,

    /// Shadow textures, indexed by mock id
    textures: Mutex<Vec<MockTexture>>,

    /// Counters for generating IDs
    next_view_id: Mutex<usize>,
    next_shader_id: Mutex<usize>,
    next_pipeline_id: Mutex<usize>,
    next_bind_group_layout_id: Mutex<usize>,
    next_bind_group_id: Mutex<usize>,
    next_sampler_id: Mutex<usize>,
}

impl MockRenderContext {
    /// Create a new mock render context.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
            textures: Mutex::new(Vec::new()),
            next_view_id: Mutex::new(0),
            next_shader_id: Mutex::new(0),
            next_pipeline_id: Mutex::new(0),
            next_bind_group_layout_id: Mutex::new(0),
            next_bind_group_id: Mutex::new(0),
            next_sampler_id: Mutex::new(0),
        }
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Count buffer creates.
    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    /// Count buffer write operations.
    pub fn count_buffer_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    /// Count texture creates.
    pub fn count_texture_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateTexture { .. }))
    }

    /// Count texture layer writes.
    pub fn count_texture_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteTextureLayer { .. }))
    }

    /// Count shader module creates.
    pub fn count_shader_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateShaderModule { .. }))
    }

    /// Count render pipeline creates.
    pub fn count_render_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateRenderPipeline { .. }))
    }

    /// Count bind group creates.
    pub fn count_bind_group_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBindGroup { .. }))
    }

    /// `(offset, size)` of every recorded write into `buffer`, in call order.
    pub fn buffer_writes(&self, buffer: &GpuBuffer) -> Vec<(u64, usize)> {
        let Some(id) = buffer.mock_id() else {
            return Vec::new();
        };
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::WriteBuffer {
                    buffer_id,
                    offset,
                    size,
                } if *buffer_id == id => Some((*offset, *size)),
                _ => None,
            })
            .collect()
    }

    /// Layers written into `texture`, in call order.
    pub fn texture_layer_writes(&self, texture: &GpuTexture) -> Vec<u32> {
        let Some(id) = texture.mock_id() else {
            return Vec::new();
        };
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                RenderCall::WriteTextureLayer {
                    texture_id, layer, ..
                } if *texture_id == id => Some(*layer),
                _ => None,
            })
            .collect()
    }

    /// Current shadow contents of a mock buffer.
    ///
    /// Returns an empty vector for buffers this context did not create.
    pub fn buffer_contents(&self, buffer: &GpuBuffer) -> Vec<u8> {
        buffer
            .mock_id()
            .and_then(|id| self.buffers.lock().get(id).map(|b| b.contents.clone()))
            .unwrap_or_default()
    }

    /// Usage flags a mock buffer was created with.
    pub fn buffer_usage(&self, buffer: &GpuBuffer) -> Option<BufferUsages> {
        buffer
            .mock_id()
            .and_then(|id| self.buffers.lock().get(id).map(|b| b.usage))
    }

    /// Current shadow contents of one layer of a mock texture, tightly packed.
    pub fn texture_layer(&self, texture: &GpuTexture, layer: u32) -> Option<Vec<u8>> {
        let id = texture.mock_id()?;
        let textures = self.textures.lock();
        let texture = textures.get(id)?;
        if layer >= texture.size.depth_or_array_layers {
            return None;
        }
        let len = texture.layer_len();
        let start = layer as usize * len;
        Some(texture.contents[start..start + len].to_vec())
    }

    /// Clear recorded calls (useful between test steps).
    ///
    /// Shadow contents are kept.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_id(counter: &Mutex<usize>) -> usize {
        let mut id = counter.lock();
        let value = *id;
        *id += 1;
        value
    }
}

impl Default for MockRenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> GpuBuffer {
        let mut buffers = self.buffers.lock();
        let id = buffers.len();

        buffers.push(MockBuffer {
            usage: desc.usage,
            contents: vec![0; desc.size as usize],
        });

        self.calls.lock().push(RenderCall::CreateBuffer {
            size: desc.size,
            usage: desc.usage,
        });

        GpuBuffer::mock(id, desc.size)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        let Some(buffer_id) = buffer.mock_id() else {
            return;
        };

        if let Some(shadow) = self.buffers.lock().get_mut(buffer_id) {
            let start = offset as usize;
            let end = start + data.len();
            assert!(
                end <= shadow.contents.len(),
                "write of {} bytes at offset {} overflows mock buffer of {} bytes",
                data.len(),
                offset,
                shadow.contents.len()
            );
            shadow.contents[start..end].copy_from_slice(data);
        }

        self.calls.lock().push(RenderCall::WriteBuffer {
            buffer_id,
            offset,
            size: data.len(),
        });
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> GpuTexture {
        let mut textures = self.textures.lock();
        let id = textures.len();

        let bytes_per_texel = desc.format.block_copy_size(None).unwrap_or(4);
        let len = desc.size.width
            * desc.size.height
            * desc.size.depth_or_array_layers
            * bytes_per_texel;

        textures.push(MockTexture {
            size: desc.size,
            bytes_per_texel,
            contents: vec![0; len as usize],
        });

        self.calls.lock().push(RenderCall::CreateTexture {
            width: desc.size.width,
            height: desc.size.height,
            layers: desc.size.depth_or_array_layers,
            format: desc.format,
        });

        GpuTexture::mock(id, desc.size, desc.format)
    }

    fn write_texture_layer(&self, texture: &GpuTexture, write: TextureLayerWrite, data: &[u8]) {
        let Some(texture_id) = texture.mock_id() else {
            return;
        };

        if let Some(shadow) = self.textures.lock().get_mut(texture_id) {
            assert!(
                write.layer < shadow.size.depth_or_array_layers,
                "layer {} out of range for mock texture with {} layers",
                write.layer,
                shadow.size.depth_or_array_layers
            );
            let texel = shadow.bytes_per_texel as usize;
            let row_len = write.width as usize * texel;
            let dst_pitch = shadow.size.width as usize * texel;
            let layer_start = write.layer as usize * shadow.layer_len();
            for row in 0..write.height as usize {
                let src = row * write.bytes_per_row as usize;
                let dst = layer_start + row * dst_pitch;
                shadow.contents[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
            }
        }

        self.calls.lock().push(RenderCall::WriteTextureLayer {
            texture_id,
            layer: write.layer,
            size: data.len(),
        });
    }

    fn create_texture_view(
        &self,
        texture: &GpuTexture,
        _desc: &TextureViewDescriptor,
    ) -> GpuTextureView {
        let view_id = Self::next_id(&self.next_view_id);

        self.calls.lock().push(RenderCall::CreateTextureView {
            texture_id: texture.mock_id().unwrap_or(usize::MAX),
        });

        GpuTextureView::mock(view_id)
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> GpuSampler {
        let sampler_id = Self::next_id(&self.next_sampler_id);

        self.calls.lock().push(RenderCall::CreateSampler {
            label: desc.label.map(|s| s.to_string()),
        });

        GpuSampler::mock(sampler_id)
    }

    fn create_shader_module(&self, desc: &ShaderModuleDescriptor) -> GpuShaderModule {
        let shader_id = Self::next_id(&self.next_shader_id);

        self.calls.lock().push(RenderCall::CreateShaderModule {
            label: desc.label.map(|s| s.to_string()),
        });

        GpuShaderModule::mock(shader_id)
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        let layout_id = Self::next_id(&self.next_bind_group_layout_id);

        self.calls.lock().push(RenderCall::CreateBindGroupLayout {
            label: desc.label.map(|s| s.to_string()),
        });

        GpuBindGroupLayout::mock(layout_id)
    }

    fn create_bind_group(&self, desc: &GpuBindGroupDescriptor) -> GpuBindGroup {
        let bind_group_id = Self::next_id(&self.next_bind_group_id);

        self.calls.lock().push(RenderCall::CreateBindGroup {
            label: desc.label.map(|s| s.to_string()),
            entries: desc.entries.len(),
        });

        GpuBindGroup::mock(bind_group_id)
    }

    fn create_render_pipeline(&self, desc: &GpuRenderPipelineDescriptor) -> GpuRenderPipeline {
        let pipeline_id = Self::next_id(&self.next_pipeline_id);

        self.calls.lock().push(RenderCall::CreateRenderPipeline {
            label: desc.label.map(|s| s.to_string()),
        });

        GpuRenderPipeline::mock(pipeline_id)
    }
}

/// A draw captured by [`MockRenderPass`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub pipeline_id: Option<usize>,
    pub bind_group_id: Option<usize>,
    pub vertex_buffer_id: Option<usize>,
    pub index_buffer_id: Option<usize>,
    pub indirect_buffer_id: Option<usize>,
    pub indirect_offset: u64,
    pub bounds: DrawBounds,
}

/// Mock draw target that records every submitted draw.
#[derive(Debug, Default)]
pub struct MockRenderPass {
    draws: Vec<RecordedDraw>,
}

impl MockRenderPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// All draws recorded so far.
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl DrawTarget for MockRenderPass {
    fn draw_indexed_indirect(&mut self, draw: &IndexedIndirectDraw<'_>) {
        self.draws.push(RecordedDraw {
            pipeline_id: draw.pipeline.mock_id(),
            bind_group_id: draw.bind_group.mock_id(),
            vertex_buffer_id: draw.vertex_buffer.mock_id(),
            index_buffer_id: draw.index_buffer.mock_id(),
            indirect_buffer_id: draw.indirect_buffer.mock_id(),
            indirect_offset: draw.indirect_offset,
            bounds: draw.bounds,
        });
    }
}
