//! Shader lookup for the HUD pipeline.
//!
//! The pipeline asks a [`ShaderProvider`] for [`HUD_SHADER_NAME`] at setup.
//! [`BuiltinShaders`] serves the embedded WGSL; [`ShaderLibrary`] lets a host
//! override or add sources by name.

use std::borrow::Cow;

use ahash::{HashMap, HashMapExt};

/// Name the pipeline requests at setup.
pub const HUD_SHADER_NAME: &str = "hud/gpu_instanced";

/// Resolves shader sources by name.
pub trait ShaderProvider {
    /// WGSL source for `name`, or `None` if the provider does not know it.
    fn shader_source(&self, name: &str) -> Option<Cow<'static, str>>;
}

/// The shaders compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinShaders;

impl ShaderProvider for BuiltinShaders {
    fn shader_source(&self, name: &str) -> Option<Cow<'static, str>> {
        match name {
            HUD_SHADER_NAME => Some(Cow::Borrowed(HUD_SHADER)),
            _ => None,
        }
    }
}

/// Name-keyed shader sources, optionally backed by the builtins.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    sources: HashMap<String, Cow<'static, str>>,
    fallback_to_builtins: bool,
}

impl ShaderLibrary {
    /// An empty library. Lookups of unregistered names fail.
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            fallback_to_builtins: false,
        }
    }

    /// A library that falls back to [`BuiltinShaders`] for unregistered names.
    pub fn with_builtins() -> Self {
        Self {
            sources: HashMap::new(),
            fallback_to_builtins: true,
        }
    }

    /// Register `source` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<Cow<'static, str>>) {
        self.sources.insert(name.into(), source.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ShaderProvider for ShaderLibrary {
    fn shader_source(&self, name: &str) -> Option<Cow<'static, str>> {
        match self.sources.get(name) {
            Some(source) => Some(source.clone()),
            None if self.fallback_to_builtins => BuiltinShaders.shader_source(name),
            None => None,
        }
    }
}

/// WGSL for the single-draw HUD pass.
///
/// Binding layout (group 0):
/// 0 instances, 1 floating-text records, 2 params, 3 atlas,
/// 4 avatar array, 5 sampler.
const HUD_SHADER: &str = r#"
// Mirrors HudInstance (64 bytes). Scalars only so the array stride stays 64.
struct HudInstance {
    pos_x: f32,
    pos_y: f32,
    pos_z: f32,
    offset_x: f32,
    offset_y: f32,
    size_x: f32,
    size_y: f32,
    uv_x: f32,
    uv_y: f32,
    uv_w: f32,
    uv_h: f32,
    r: f32,
    g: f32,
    b: f32,
    a: f32,
    flags: u32,
}

struct FloatingText {
    start_time: f32,
    duration: f32,
    value: f32,
    style_flags: u32,
}

struct Params {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    time: f32,
    sdf_threshold: f32,
    sdf_softness: f32,
    rise_height: f32,
    bounce_scale: f32,
    _pad: f32,
}

@group(0) @binding(0)
var<storage, read> instances: array<HudInstance>;
@group(0) @binding(1)
var<storage, read> float_texts: array<FloatingText>;
@group(0) @binding(2)
var<uniform> params: Params;
@group(0) @binding(3)
var atlas: texture_2d<f32>;
@group(0) @binding(4)
var avatars: texture_2d_array<f32>;
@group(0) @binding(5)
var hud_sampler: sampler;

const KIND_AVATAR: u32 = 0u;
const KIND_ICON: u32 = 1u;
const KIND_HEALTH_BAR: u32 = 2u;
const KIND_TEXT: u32 = 3u;
const KIND_FLOATING_TEXT: u32 = 4u;

const CRITICAL_BIT: u32 = 4u;
const PI: f32 = 3.14159265;

struct VertexInput {
    @location(0) position: vec2<f32>, // -0.5..0.5 unit quad
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) local_x: f32,
    @location(3) @interpolate(flat) kind: u32,
    @location(4) @interpolate(flat) slice: u32,
}

fn culled() -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(2.0, 2.0, 2.0, 1.0);
    out.uv = vec2<f32>(0.0);
    out.color = vec4<f32>(0.0);
    out.local_x = 0.0;
    out.kind = 0u;
    out.slice = 0u;
    return out;
}

@vertex
fn vs_main(vertex: VertexInput, @builtin(instance_index) index: u32) -> VertexOutput {
    let inst = instances[index];
    let kind = inst.flags & 7u;
    let visible = (inst.flags >> 3u) & 1u;
    if (visible == 0u) {
        return culled();
    }

    let clip = params.view_proj * vec4<f32>(inst.pos_x, inst.pos_y, inst.pos_z, 1.0);
    if (clip.w <= 0.0) {
        return culled();
    }

    var size = vec2<f32>(inst.size_x, inst.size_y);
    var offset = vec2<f32>(inst.offset_x, inst.offset_y);
    var color = vec4<f32>(inst.r, inst.g, inst.b, inst.a);

    if (kind == KIND_FLOATING_TEXT) {
        let record = float_texts[inst.flags >> 12u];
        // Digits carry their spawn time in alpha.
        let t = (params.time - inst.a) / max(record.duration, 0.0001);
        if (t < 0.0 || t >= 1.0) {
            return culled();
        }
        var bounce = params.bounce_scale * sin(t * PI) * (1.0 - t);
        if ((record.style_flags & CRITICAL_BIT) != 0u) {
            bounce = bounce * 2.0;
        }
        size = size * (1.0 + bounce);
        offset.y = offset.y + params.rise_height * params.viewport.y * t;
        color.a = 1.0 - t * t;
    }

    let pixel = offset + vertex.position * size;
    let ndc = clip.xy / clip.w + pixel * 2.0 / params.viewport;

    var out: VertexOutput;
    out.position = vec4<f32>(ndc, clip.z / clip.w, 1.0);
    out.uv = vec2<f32>(inst.uv_x, inst.uv_y) + vertex.uv * vec2<f32>(inst.uv_w, inst.uv_h);
    out.color = color;
    out.local_x = vertex.position.x + 0.5;
    out.kind = kind;
    out.slice = (inst.flags >> 4u) & 255u;
    return out;
}

fn sdf_alpha(uv: vec2<f32>) -> f32 {
    let distance = textureSampleLevel(atlas, hud_sampler, uv, 0.0).a;
    return smoothstep(
        params.sdf_threshold - params.sdf_softness,
        params.sdf_threshold + params.sdf_softness,
        distance,
    );
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    switch input.kind {
        case KIND_AVATAR: {
            let texel = textureSampleLevel(avatars, hud_sampler, input.uv, i32(input.slice), 0.0);
            return texel * input.color;
        }
        case KIND_ICON: {
            return textureSampleLevel(atlas, hud_sampler, input.uv, 0.0) * input.color;
        }
        case KIND_HEALTH_BAR: {
            // Alpha is the health fraction; clip the bar width to it.
            if (input.local_x > input.color.a) {
                discard;
            }
            return vec4<f32>(input.color.rgb, 1.0);
        }
        case KIND_TEXT, KIND_FLOATING_TEXT: {
            let alpha = sdf_alpha(input.uv) * input.color.a;
            if (alpha <= 0.001) {
                discard;
            }
            return vec4<f32>(input.color.rgb, alpha);
        }
        default: {
            discard;
        }
    }
    return vec4<f32>(0.0);
}
"#;
