//! Construction-time configuration for the HUD system.
//!
//! Every capacity, pixel offset and animation constant lives here instead of
//! in compile-time constants. The defaults reproduce the stock layout: 10,000
//! entities with 16 widget slots each, 256-record upload chunks, a 512-entry
//! floating-text pool of up to 6 digits, and a 256-slice avatar array.

use crate::{
    color::Color,
    error::{HudError, HudResult},
    glyph::UvRect,
    instance::InstanceFlags,
};

/// Fixed capacities of the instance store, animation pool and entity spans.
#[derive(Debug, Clone, PartialEq)]
pub struct HudCapacity {
    pub max_entities: usize,
    /// Records per dirty-tracking chunk.
    pub chunk_size: usize,
    pub floating_text_pool: usize,
    /// Digit slots reserved per floating text.
    pub max_digits: usize,
    pub max_label_len: usize,
    pub icon_slots: usize,
}

impl HudCapacity {
    /// Avatar, health-bar background and health-bar foreground.
    pub const FIXED_SLOTS: usize = 3;

    /// Widget slots owned by one entity.
    pub fn instances_per_entity(&self) -> usize {
        Self::FIXED_SLOTS + self.max_label_len + self.icon_slots
    }

    /// Records reserved for floating-text digits.
    pub fn floating_text_instances(&self) -> usize {
        self.floating_text_pool * self.max_digits
    }

    /// Total records in the instance store.
    pub fn total_instances(&self) -> usize {
        self.max_entities * self.instances_per_entity() + self.floating_text_instances()
    }
}

impl Default for HudCapacity {
    fn default() -> Self {
        Self {
            max_entities: 10_000,
            chunk_size: 256,
            floating_text_pool: 512,
            max_digits: 6,
            max_label_len: 10,
            icon_slots: 3,
        }
    }
}

/// Pixel layout of an entity's widgets around its anchor point.
#[derive(Debug, Clone, PartialEq)]
pub struct HudLayout {
    pub avatar_offset_y: f32,
    pub avatar_size: f32,
    pub health_bar_offset_y: f32,
    pub health_bar_width: f32,
    pub health_bar_height: f32,
    pub label_offset_y: f32,
    pub label_char_size: f32,
    pub icon_offset_y: f32,
    pub icon_size: f32,
    /// Horizontal gap between the health bar and the avatar or first icon.
    pub side_gap: f32,
    /// Fixed glyph advance as a fraction of the glyph size.
    pub glyph_width_ratio: f32,
    pub floating_text_offset_y: f32,
    /// Atlas region holding the default digit glyphs.
    pub digit_glyph_region: UvRect,
    /// Atlas rectangle of the default class icon.
    pub default_icon_uv: UvRect,
}

impl Default for HudLayout {
    fn default() -> Self {
        Self {
            avatar_offset_y: 60.0,
            avatar_size: 48.0,
            health_bar_offset_y: 30.0,
            health_bar_width: 64.0,
            health_bar_height: 8.0,
            label_offset_y: 12.0,
            label_char_size: 20.0,
            icon_offset_y: 80.0,
            icon_size: 24.0,
            side_gap: 4.0,
            glyph_width_ratio: 0.6,
            floating_text_offset_y: 50.0,
            digit_glyph_region: UvRect::new(0.0, 0.9375, 0.75, 0.0625),
            default_icon_uv: UvRect::new(0.0, 0.0, 0.05, 0.05),
        }
    }
}

/// Floating combat text animation and palette.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingTextConfig {
    /// Seconds from spawn until fully faded.
    pub duration: f32,
    /// Rise over the lifetime, as a fraction of the viewport height.
    pub rise_height: f32,
    pub bounce_scale: f32,
    pub char_size: f32,
    /// Glyph size multiplier for critical hits.
    pub crit_scale: f32,
    pub damage_color: Color,
    pub heal_color: Color,
    pub crit_color: Color,
}

impl Default for FloatingTextConfig {
    fn default() -> Self {
        Self {
            duration: 0.8,
            rise_height: 0.05,
            bounce_scale: 0.3,
            char_size: 28.0,
            crit_scale: 1.5,
            damage_color: Color::rgb(1.0, 0.2, 0.1),
            heal_color: Color::rgb(0.2, 1.0, 0.3),
            crit_color: Color::rgb(1.0, 0.6, 0.1),
        }
    }
}

/// Avatar texture array and streaming budget.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarConfig {
    /// Width and height of one slice in pixels.
    pub slice_size: u32,
    pub slice_count: u32,
    /// Fetches launched per frame at most.
    pub loads_per_frame: usize,
    pub cdn_base_url: String,
}

impl AvatarConfig {
    /// Location of an avatar image on the CDN.
    pub fn url_for(&self, avatar_id: u64) -> String {
        format!(
            "{}/avatars/{}.png",
            self.cdn_base_url.trim_end_matches('/'),
            avatar_id
        )
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            slice_size: 128,
            slice_count: 256,
            loads_per_frame: 2,
            cdn_base_url: "https://cdn.example.com".to_string(),
        }
    }
}

/// Appearance parameters uploaded with the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParams {
    pub sdf_threshold: f32,
    pub sdf_softness: f32,
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            sdf_threshold: 0.5,
            sdf_softness: 0.05,
        }
    }
}

/// Configuration for [`HudSystem`](crate::HudSystem).
///
/// # Example
///
/// ```
/// use astrelis_hud::{HudCapacity, HudConfig};
///
/// let config = HudConfig::default().with_capacity(HudCapacity {
///     max_entities: 100,
///     ..Default::default()
/// });
/// assert!(config.validate().is_ok());
/// assert_eq!(config.capacity.total_instances(), 100 * 16 + 512 * 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudConfig {
    pub capacity: HudCapacity,
    pub layout: HudLayout,
    pub floating_text: FloatingTextConfig,
    pub avatars: AvatarConfig,
    pub shader: ShaderParams,
}

impl HudConfig {
    pub fn with_capacity(mut self, capacity: HudCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_layout(mut self, layout: HudLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_floating_text(mut self, floating_text: FloatingTextConfig) -> Self {
        self.floating_text = floating_text;
        self
    }

    pub fn with_avatars(mut self, avatars: AvatarConfig) -> Self {
        self.avatars = avatars;
        self
    }

    pub fn with_shader_params(mut self, shader: ShaderParams) -> Self {
        self.shader = shader;
        self
    }

    /// Reject configurations the fixed layouts cannot represent.
    pub fn validate(&self) -> HudResult<()> {
        let invalid = |reason: String| Err(HudError::InvalidConfig { reason });
        let cap = &self.capacity;

        if cap.max_entities == 0 {
            return invalid("max_entities must be non-zero".into());
        }
        if cap.chunk_size == 0 {
            return invalid("chunk_size must be non-zero".into());
        }
        if cap.floating_text_pool == 0 || cap.max_digits == 0 {
            return invalid("floating text pool and digit count must be non-zero".into());
        }
        if cap.floating_text_pool > InstanceFlags::RESERVED_MAX as usize + 1 {
            return invalid(format!(
                "floating_text_pool {} does not fit the {}-bit reserved field",
                cap.floating_text_pool,
                InstanceFlags::RESERVED_BITS
            ));
        }
        if cap.total_instances() > u32::MAX as usize {
            return invalid(format!(
                "{} instances exceed the indirect draw instance count",
                cap.total_instances()
            ));
        }

        let avatars = &self.avatars;
        if avatars.slice_count == 0 || avatars.slice_size == 0 {
            return invalid("avatar slice size and count must be non-zero".into());
        }
        if avatars.slice_count > InstanceFlags::CACHE_SLOT_MAX + 1 {
            return invalid(format!(
                "slice_count {} does not fit the {}-bit cache slot field",
                avatars.slice_count,
                InstanceFlags::CACHE_SLOT_BITS
            ));
        }
        if avatars.loads_per_frame == 0 {
            return invalid("loads_per_frame must be non-zero".into());
        }

        if self.floating_text.duration <= 0.0 {
            return invalid("floating text duration must be positive".into());
        }

        Ok(())
    }
}
