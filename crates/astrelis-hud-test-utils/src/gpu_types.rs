//! GPU resource wrappers that can be real or mock.
//!
//! Each wrapper hides whether it holds a real `wgpu` object or a mock id.
//! Real `wgpu` handles are reference counted, so cloning a wrapper is cheap.

/// Wrapper around a GPU buffer that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock { id: usize, size: u64 },
}

impl GpuBuffer {
    /// Create from a real wgpu buffer.
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            inner: GpuBufferInner::Real(buffer),
        }
    }

    /// Create a mock buffer (for testing).
    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: u64) -> Self {
        Self {
            inner: GpuBufferInner::Mock { id, size },
        }
    }

    /// Size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer.size(),
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { size, .. } => *size,
        }
    }

    /// Get the underlying wgpu::Buffer.
    ///
    /// # Panics
    /// Panics if this is a mock buffer.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer,
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Buffer from mock buffer - this is a test-only buffer")
            }
        }
    }

    /// Check if this is a mock.
    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock { .. })
    }

    /// Get the mock id (for test assertions).
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuBufferInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Wrapper around a GPU texture that can be real or mock.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    inner: GpuTextureInner,
}

#[derive(Clone, Debug)]
enum GpuTextureInner {
    Real(wgpu::Texture),
    #[cfg(feature = "mock")]
    Mock {
        id: usize,
        size: wgpu::Extent3d,
        format: wgpu::TextureFormat,
    },
}

impl GpuTexture {
    /// Create from a real wgpu texture.
    pub fn from_wgpu(texture: wgpu::Texture) -> Self {
        Self {
            inner: GpuTextureInner::Real(texture),
        }
    }

    /// Create a mock texture (for testing).
    #[cfg(feature = "mock")]
    pub fn mock(id: usize, size: wgpu::Extent3d, format: wgpu::TextureFormat) -> Self {
        Self {
            inner: GpuTextureInner::Mock { id, size, format },
        }
    }

    /// Width, height and layer count of the texture.
    pub fn size(&self) -> wgpu::Extent3d {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.size(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { size, .. } => *size,
        }
    }

    /// Texel format of the texture.
    pub fn format(&self) -> wgpu::TextureFormat {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture.format(),
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { format, .. } => *format,
        }
    }

    /// Get the underlying wgpu::Texture.
    ///
    /// # Panics
    /// Panics if this is a mock texture.
    pub fn as_wgpu(&self) -> &wgpu::Texture {
        match &self.inner {
            GpuTextureInner::Real(texture) => texture,
            #[cfg(feature = "mock")]
            GpuTextureInner::Mock { .. } => {
                panic!("Attempted to get wgpu::Texture from mock texture")
            }
        }
    }

    /// Check if this is a mock.
    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuTextureInner::Mock { .. })
    }

    /// Get the mock id (for test assertions).
    #[cfg(feature = "mock")]
    pub fn mock_id(&self) -> Option<usize> {
        match &self.inner {
            GpuTextureInner::Mock { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Generates a wrapper for GPU objects that carry no inspectable state.
macro_rules! opaque_gpu_wrapper {
    ($(#[$doc:meta])* $name:ident, $inner:ident, $wgpu:ty) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            inner: $inner,
        }

        #[derive(Clone, Debug)]
        enum $inner {
            Real($wgpu),
            #[cfg(feature = "mock")]
            Mock { id: usize },
        }

        impl $name {
            /// Create from the real wgpu object.
            pub fn from_wgpu(value: $wgpu) -> Self {
                Self {
                    inner: $inner::Real(value),
                }
            }

            /// Create a mock object (for testing).
            #[cfg(feature = "mock")]
            pub fn mock(id: usize) -> Self {
                Self {
                    inner: $inner::Mock { id },
                }
            }

            /// Get the underlying wgpu object.
            ///
            /// # Panics
            /// Panics if this is a mock.
            pub fn as_wgpu(&self) -> &$wgpu {
                match &self.inner {
                    $inner::Real(value) => value,
                    #[cfg(feature = "mock")]
                    $inner::Mock { .. } => panic!(
                        "Attempted to get {} from mock",
                        stringify!($wgpu)
                    ),
                }
            }

            /// Check if this is a mock.
            #[cfg(feature = "mock")]
            pub fn is_mock(&self) -> bool {
                matches!(self.inner, $inner::Mock { .. })
            }

            /// Get the mock id (for test assertions).
            #[cfg(feature = "mock")]
            pub fn mock_id(&self) -> Option<usize> {
                match &self.inner {
                    $inner::Mock { id } => Some(*id),
                    _ => None,
                }
            }
        }
    };
}

opaque_gpu_wrapper!(
    /// Wrapper around a texture view that can be real or mock.
    GpuTextureView,
    GpuTextureViewInner,
    wgpu::TextureView
);
opaque_gpu_wrapper!(
    /// Wrapper around a shader module that can be real or mock.
    GpuShaderModule,
    GpuShaderModuleInner,
    wgpu::ShaderModule
);
opaque_gpu_wrapper!(
    /// Wrapper around a render pipeline that can be real or mock.
    GpuRenderPipeline,
    GpuRenderPipelineInner,
    wgpu::RenderPipeline
);
opaque_gpu_wrapper!(
    /// Wrapper around a bind group layout that can be real or mock.
    GpuBindGroupLayout,
    GpuBindGroupLayoutInner,
    wgpu::BindGroupLayout
);
opaque_gpu_wrapper!(
    /// Wrapper around a bind group that can be real or mock.
    GpuBindGroup,
    GpuBindGroupInner,
    wgpu::BindGroup
);
opaque_gpu_wrapper!(
    /// Wrapper around a sampler that can be real or mock.
    GpuSampler,
    GpuSamplerInner,
    wgpu::Sampler
);

/// A resource referenced by a bind group entry.
#[derive(Clone, Copy, Debug)]
pub enum GpuBindingResource<'a> {
    /// The whole buffer is bound.
    Buffer(&'a GpuBuffer),
    TextureView(&'a GpuTextureView),
    Sampler(&'a GpuSampler),
}

/// One entry of a [`GpuBindGroupDescriptor`].
#[derive(Clone, Copy, Debug)]
pub struct GpuBindGroupEntry<'a> {
    pub binding: u32,
    pub resource: GpuBindingResource<'a>,
}

/// Bind group descriptor expressed in wrapper types.
///
/// `wgpu::BindGroupDescriptor` references concrete `wgpu` resources, which a
/// mock context cannot produce, so bind groups are described with wrappers
/// and converted at the real boundary.
#[derive(Clone, Copy, Debug)]
pub struct GpuBindGroupDescriptor<'a> {
    pub label: Option<&'a str>,
    pub layout: &'a GpuBindGroupLayout,
    pub entries: &'a [GpuBindGroupEntry<'a>],
}

/// Render pipeline descriptor expressed in wrapper types.
///
/// The pipeline layout is derived from `bind_group_layouts` (no push constants).
#[derive(Clone, Debug)]
pub struct GpuRenderPipelineDescriptor<'a> {
    pub label: Option<&'a str>,
    pub shader: &'a GpuShaderModule,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub bind_group_layouts: &'a [&'a GpuBindGroupLayout],
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_target: wgpu::ColorTargetState,
    pub primitive: wgpu::PrimitiveState,
}

/// Placement of one layer write into a 2D texture array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureLayerWrite {
    /// Array layer (slice) to overwrite.
    pub layer: u32,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: u32,
}
