//! Astrelis HUD - GPU-instanced overlay widgets in a single draw call.
//!
//! Health bars, name labels, class icons, avatars and floating combat numbers
//! for tens of thousands of entities are stored as fixed-stride
//! [`HudInstance`] records in one storage buffer and drawn with one indirect
//! instanced draw per frame. The CPU only writes records that change and
//! uploads them in dirty chunks; billboarding, text rendering and animation
//! run in the shader.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use astrelis_hud::{AvatarId, FloatingTextStyle, HudDescriptor, HudSystem};
//! use astrelis_hud_test_utils::{MockRenderContext, MockRenderPass};
//! use glam::Vec3;
//!
//! let ctx = Arc::new(MockRenderContext::new());
//! let mut hud = HudSystem::new(ctx, HudDescriptor::default()).unwrap();
//!
//! let orc = hud
//!     .register_entity(Vec3::new(0.0, 1.0, 0.0), "Orc", 1.0, AvatarId(7))
//!     .unwrap();
//! hud.update_health(orc, 0.4).unwrap();
//! hud.spawn_floating_text(Vec3::new(0.0, 2.0, 0.0), 120.0, FloatingTextStyle::Damage);
//!
//! let mut pass = MockRenderPass::new();
//! let stats = hud.frame(&mut pass);
//! assert_eq!(stats.draws, 1);
//! ```
//!
//! # Components
//!
//! - [`GlyphTable`]: sorted character to atlas rectangle lookup.
//! - [`AvatarCache`]: round-robin texture-array cache with throttled async fills.
//! - [`InstanceStore`]: CPU mirror of the instance buffer with chunked upload.
//! - [`AnimationPool`]: ring buffer of floating-text records.
//! - [`FloatingTextAnimator`]: writes digit records for a floating number.
//! - [`HudRenderer`]: quad geometry, bindings and the single indirect draw.
//! - [`HudSystem`]: owns all of the above and drives the frame.

pub mod animation_pool;
pub mod animator;
pub mod avatar_cache;
pub mod clock;
pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod glyph;
pub mod instance;
pub mod instance_store;
pub mod logging;
pub mod pipeline;
pub mod profiling;
pub mod shader;
pub mod system;

pub use animation_pool::{AnimationPool, FloatingTextRecord};
pub use animator::{
    DigitBuffer, FloatingTextAnimator, FloatingTextFlags, FloatingTextStyle, decompose_digits,
};
pub use avatar_cache::{
    AvatarCache, AvatarId, AvatarImage, AvatarSource, CompletionOutcome, FetchCompletion,
    FetchFuture, FetchJob, NoAvatarSource, PumpStats,
};
pub use clock::{HudClock, ManualClock, MonotonicClock};
pub use color::{Color, health_color};
pub use config::{
    AvatarConfig, FloatingTextConfig, HudCapacity, HudConfig, HudLayout, ShaderParams,
};
pub use context::{GraphicsContext, GraphicsContextDescriptor};
pub use error::{CapacityKind, HudError, HudResult};
pub use glyph::{GlyphRecord, GlyphTable, UvRect};
pub use instance::{ElementKind, HudInstance, InstanceFlags};
pub use instance_store::{InstanceStore, UploadStats};
pub use pipeline::{DRAW_BOUNDS_SIZE, DrawIndexedIndirect, HudParams, HudRenderer};
pub use shader::{BuiltinShaders, HUD_SHADER_NAME, ShaderLibrary, ShaderProvider};
pub use system::{EntityId, EntitySpawn, HudDescriptor, HudFrameStats, HudSystem};

// Re-export the GPU seams so hosts need only this crate.
pub use astrelis_hud_test_utils::{DrawBounds, DrawTarget, IndexedIndirectDraw, RenderContext};
