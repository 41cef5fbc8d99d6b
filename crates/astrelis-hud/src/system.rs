//! The HUD orchestrator.
//!
//! [`HudSystem`] owns every component and exposes the entity API used by game
//! logic. Each entity owns a fixed span of instance records:
//!
//! | offset                  | record                         |
//! |-------------------------|--------------------------------|
//! | 0                       | avatar                         |
//! | 1                       | health bar background          |
//! | 2                       | health bar foreground          |
//! | 3..3 + max_label_len    | label glyphs                   |
//! | ..instances_per_entity  | icons                          |
//!
//! Floating-text digit records follow the last entity span. A frame is
//! [`HudSystem::prepare`] (avatar pump, dirty upload, pool upload, time) then
//! [`HudSystem::render`] (one indirect draw).

use std::ops::Range;
use std::sync::Arc;

use astrelis_hud_test_utils::{DrawTarget, GpuTextureView, RenderContext};
use glam::{Mat4, Vec2, Vec3};

use crate::{
    animation_pool::AnimationPool,
    animator::{FloatingTextAnimator, FloatingTextStyle},
    avatar_cache::{AvatarCache, AvatarId, AvatarSource, NoAvatarSource},
    clock::{HudClock, MonotonicClock},
    color::{Color, health_color},
    config::{HudCapacity, HudConfig, ShaderParams},
    error::{CapacityKind, HudError, HudResult},
    glyph::{GlyphTable, UvRect},
    instance::{ElementKind, HudInstance, InstanceFlags},
    instance_store::InstanceStore,
    pipeline::{HudParams, HudRenderer},
    profiling::{profile_function, profile_scope},
    shader::{BuiltinShaders, ShaderProvider},
};

const AVATAR: usize = 0;
const HEALTH_BACKGROUND: usize = 1;
const HEALTH_FOREGROUND: usize = 2;
const LABEL_START: usize = HudCapacity::FIXED_SLOTS;

const HEALTH_BACKGROUND_COLOR: Color = Color::rgba(0.1, 0.1, 0.1, 0.8);

/// Handle to a registered entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    /// Registration order, starting at zero.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Initial state of an entity for [`HudSystem::register_entities`].
#[derive(Debug, Clone, Copy)]
pub struct EntitySpawn<'a> {
    pub position: Vec3,
    pub label: &'a str,
    pub health: f32,
    pub avatar: AvatarId,
}

/// Work done by one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HudFrameStats {
    pub chunks_uploaded: usize,
    pub instances_uploaded: usize,
    pub pool_uploaded: bool,
    pub fetches_launched: usize,
    pub fetches_completed: usize,
    /// 0 or 1.
    pub draws: usize,
    /// Instance count submitted with the draw.
    pub instance_count: usize,
}

/// Everything [`HudSystem::new`] needs besides the render context.
pub struct HudDescriptor {
    pub config: HudConfig,
    pub target_format: wgpu::TextureFormat,
    /// Defaults to digit cells laid out over
    /// [`HudLayout::digit_glyph_region`](crate::HudLayout::digit_glyph_region).
    pub glyphs: Option<GlyphTable>,
    pub avatar_source: Arc<dyn AvatarSource>,
    pub shaders: Box<dyn ShaderProvider>,
    pub clock: Arc<dyn HudClock>,
}

impl Default for HudDescriptor {
    fn default() -> Self {
        Self {
            config: HudConfig::default(),
            target_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            glyphs: None,
            avatar_source: Arc::new(NoAvatarSource),
            shaders: Box::new(BuiltinShaders),
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

impl HudDescriptor {
    pub fn with_config(mut self, config: HudConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_target_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.target_format = format;
        self
    }

    pub fn with_glyphs(mut self, glyphs: GlyphTable) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    pub fn with_avatar_source(mut self, source: Arc<dyn AvatarSource>) -> Self {
        self.avatar_source = source;
        self
    }

    pub fn with_shaders(mut self, shaders: impl ShaderProvider + 'static) -> Self {
        self.shaders = Box::new(shaders);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn HudClock>) -> Self {
        self.clock = clock;
        self
    }
}

pub struct HudSystem {
    config: HudConfig,
    store: InstanceStore,
    pool: AnimationPool,
    avatars: AvatarCache,
    animator: FloatingTextAnimator,
    renderer: HudRenderer,
    glyphs: GlyphTable,
    clock: Arc<dyn HudClock>,
    span_len: usize,
    entity_count: usize,
    last_stats: HudFrameStats,
}

impl HudSystem {
    /// Validate the configuration and build every component.
    ///
    /// The renderer is built first, so a missing shader fails before any
    /// buffer or texture is allocated.
    pub fn new(ctx: Arc<dyn RenderContext>, descriptor: HudDescriptor) -> HudResult<Self> {
        let HudDescriptor {
            config,
            target_format,
            glyphs,
            avatar_source,
            shaders,
            clock,
        } = descriptor;

        config.validate()?;

        let renderer = HudRenderer::new(
            ctx.clone(),
            shaders.as_ref(),
            target_format,
            HudParams::new(&config.shader, &config.floating_text),
        )
        .inspect_err(|err| tracing::warn!("HUD system left uninitialized: {}", err))?;

        let capacity = &config.capacity;
        let store =
            InstanceStore::new(ctx.clone(), capacity.total_instances(), capacity.chunk_size);
        let pool = AnimationPool::new(ctx.clone(), capacity.floating_text_pool);
        let avatars = AvatarCache::new(ctx, avatar_source, config.avatars.clone());
        let animator = FloatingTextAnimator::new(
            config.floating_text.clone(),
            &config.layout,
            capacity.max_digits,
        );
        let glyphs = glyphs
            .unwrap_or_else(|| GlyphTable::with_digit_defaults(config.layout.digit_glyph_region));

        let mut system = Self {
            span_len: capacity.instances_per_entity(),
            config,
            store,
            pool,
            avatars,
            animator,
            renderer,
            glyphs,
            clock,
            entity_count: 0,
            last_stats: HudFrameStats::default(),
        };
        system
            .renderer
            .bind(system.store.buffer(), system.pool.buffer(), system.avatars.view());
        system.update_active_count();

        tracing::info!(
            "HUD system initialized: {} entities x {} slots, {} instances",
            system.config.capacity.max_entities,
            system.span_len,
            system.store.capacity()
        );
        Ok(system)
    }

    // Entities

    /// Register an entity and return its handle.
    ///
    /// Labels longer than `max_label_len` characters are truncated. Fails
    /// with [`HudError::CapacityExceeded`] when every entity span is taken.
    pub fn register_entity(
        &mut self,
        position: Vec3,
        label: &str,
        health: f32,
        avatar: AvatarId,
    ) -> HudResult<EntityId> {
        self.ensure_room(1)?;

        let index = self.entity_count;
        self.shift_floating_region(1);
        self.write_entity(
            index,
            &EntitySpawn {
                position,
                label,
                health,
                avatar,
            },
        );
        self.entity_count += 1;
        self.update_active_count();

        let span = self.span(index);
        self.store.mark_range_dirty(span.start, span.len());
        Ok(EntityId(index))
    }

    /// Register every spawn in order, or none if they do not all fit.
    ///
    /// The whole store is marked dirty once instead of per entity.
    pub fn register_entities(&mut self, spawns: &[EntitySpawn<'_>]) -> HudResult<Vec<EntityId>> {
        profile_function!();

        self.ensure_room(spawns.len())?;
        if spawns.is_empty() {
            return Ok(Vec::new());
        }

        let first = self.entity_count;
        self.shift_floating_region(spawns.len());
        for (offset, spawn) in spawns.iter().enumerate() {
            self.write_entity(first + offset, spawn);
        }
        self.entity_count += spawns.len();
        self.update_active_count();
        self.store.mark_all_dirty();

        tracing::debug!("Registered {} HUD entities", spawns.len());
        Ok((first..self.entity_count).map(EntityId).collect())
    }

    /// Move every record of the entity to `position`.
    pub fn update_position(&mut self, entity: EntityId, position: Vec3) -> HudResult<()> {
        let span = self.checked_span(entity)?;
        let position = position.to_array();
        for record in self.store.slice_mut(span.clone()) {
            record.world_position = position;
        }
        self.store.mark_range_dirty(span.start, span.len());
        Ok(())
    }

    /// Recolor the health bar and clip it to `fraction` (clamped to 0..=1).
    pub fn update_health(&mut self, entity: EntityId, fraction: f32) -> HudResult<()> {
        let span = self.checked_span(entity)?;
        let index = span.start + HEALTH_FOREGROUND;
        self.store.get_mut(index).color = health_color(fraction).to_array();
        self.store.mark_chunk_dirty(self.store.chunk_of(index));
        Ok(())
    }

    /// Replace the label, truncated to `max_label_len` characters.
    pub fn set_label(&mut self, entity: EntityId, label: &str) -> HudResult<()> {
        let span = self.checked_span(entity)?;
        let position = self.store.get(span.start).world_position;
        self.write_label(span.start, position, label);
        self.store
            .mark_range_dirty(span.start + LABEL_START, self.config.capacity.max_label_len);
        Ok(())
    }

    /// Show atlas rectangle `uv` in icon slot `slot`, or hide the slot.
    pub fn set_icon(&mut self, entity: EntityId, slot: usize, uv: Option<UvRect>) -> HudResult<()> {
        let span = self.checked_span(entity)?;
        let icon_slots = self.config.capacity.icon_slots;
        if slot >= icon_slots {
            return Err(HudError::CapacityExceeded {
                kind: CapacityKind::Icons,
                capacity: icon_slots,
            });
        }

        let position = self.store.get(span.start).world_position;
        let index = span.start + LABEL_START + self.config.capacity.max_label_len + slot;
        let record = match uv {
            Some(uv) => self.icon_record(position, slot, uv),
            None => HudInstance::EMPTY,
        };
        self.store.write(index, record);
        self.store.mark_chunk_dirty(self.store.chunk_of(index));
        Ok(())
    }

    /// Point the entity's avatar at `avatar`, queueing a fetch on a miss.
    pub fn set_avatar(&mut self, entity: EntityId, avatar: AvatarId) -> HudResult<()> {
        let span = self.checked_span(entity)?;
        let slot = self.avatars.get_or_assign(avatar);
        let index = span.start + AVATAR;
        self.store.get_mut(index).flags.set_cache_slot(slot as u32);
        self.store.mark_chunk_dirty(self.store.chunk_of(index));
        Ok(())
    }

    /// Start a floating number at `position` and return its pool slot.
    ///
    /// When the pool is full the oldest animation is replaced.
    pub fn spawn_floating_text(
        &mut self,
        position: Vec3,
        value: f32,
        style: FloatingTextStyle,
    ) -> usize {
        let now = self.clock.now();
        self.animator.spawn(
            &mut self.pool,
            &mut self.store,
            &self.glyphs,
            position,
            value,
            style,
            now,
        )
    }

    // Frame

    /// Camera supplied by the host scene.
    pub fn set_camera(&mut self, view_proj: Mat4, viewport: Vec2) {
        self.renderer.set_camera(view_proj, viewport);
    }

    /// SDF threshold and softness for labels and digits.
    pub fn set_shader_params(&mut self, shader: ShaderParams) {
        self.renderer.set_shader_params(&shader);
        self.config.shader = shader;
    }

    /// Replace the static atlas and the glyph table that indexes it.
    ///
    /// Existing label and digit records keep their old rectangles until
    /// rewritten.
    pub fn set_atlas(&mut self, atlas: GpuTextureView, glyphs: GlyphTable) {
        self.renderer.set_atlas(atlas);
        self.glyphs = glyphs;
    }

    /// Pump avatar fetches, upload dirty chunks and the pool, and advance the
    /// shader clock. Call once per frame after all mutations.
    pub fn prepare(&mut self) -> HudFrameStats {
        profile_function!();

        let pump = {
            profile_scope!("avatar_pump");
            self.avatars.pump(self.config.avatars.loads_per_frame)
        };
        let upload = self.store.upload_dirty();
        let pool_uploaded = self.pool.upload();
        self.renderer.set_time(self.clock.now());

        self.last_stats = HudFrameStats {
            chunks_uploaded: upload.chunks_uploaded,
            instances_uploaded: upload.instances_uploaded,
            pool_uploaded,
            fetches_launched: pump.launched,
            fetches_completed: pump.completed(),
            draws: 0,
            instance_count: self.store.active_count(),
        };
        self.last_stats
    }

    /// Issue the single HUD draw. Returns whether a draw was submitted.
    pub fn render(&mut self, target: &mut dyn DrawTarget) -> bool {
        let drawn = self.renderer.render(target, self.store.active_count());
        if drawn {
            self.last_stats.draws = 1;
        }
        drawn
    }

    /// [`prepare`](Self::prepare) followed by [`render`](Self::render).
    pub fn frame(&mut self, target: &mut dyn DrawTarget) -> HudFrameStats {
        self.prepare();
        self.render(target);
        self.last_stats
    }

    /// Statistics of the most recent frame.
    pub fn stats(&self) -> HudFrameStats {
        self.last_stats
    }

    // Accessors

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Entity spans plus the floating-text region.
    pub fn total_instance_count(&self) -> usize {
        self.store.active_count()
    }

    pub fn instances_per_entity(&self) -> usize {
        self.span_len
    }

    /// Instance range owned by `entity`.
    pub fn entity_span(&self, entity: EntityId) -> HudResult<Range<usize>> {
        self.checked_span(entity)
    }

    pub fn config(&self) -> &HudConfig {
        &self.config
    }

    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    pub fn pool(&self) -> &AnimationPool {
        &self.pool
    }

    pub fn avatars(&self) -> &AvatarCache {
        &self.avatars
    }

    pub fn avatars_mut(&mut self) -> &mut AvatarCache {
        &mut self.avatars
    }

    pub fn animator(&self) -> &FloatingTextAnimator {
        &self.animator
    }

    pub fn renderer(&self) -> &HudRenderer {
        &self.renderer
    }

    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    // Internals

    fn span(&self, index: usize) -> Range<usize> {
        let start = index * self.span_len;
        start..start + self.span_len
    }

    fn checked_span(&self, entity: EntityId) -> HudResult<Range<usize>> {
        if entity.0 >= self.entity_count {
            return Err(HudError::UnknownEntity { index: entity.0 });
        }
        Ok(self.span(entity.0))
    }

    fn ensure_room(&self, additional: usize) -> HudResult<()> {
        let max = self.config.capacity.max_entities;
        if self.entity_count + additional > max {
            tracing::warn!(
                "HUD entity capacity reached ({} registered, {} requested)",
                self.entity_count,
                additional
            );
            return Err(HudError::CapacityExceeded {
                kind: CapacityKind::Entities,
                capacity: max,
            });
        }
        Ok(())
    }

    /// Move the floating-text region past `new_entities` more spans, carrying
    /// the digits of animations that are still running.
    ///
    /// Digits left behind are never shown again: they keep their own spawn
    /// time in alpha, which the shader compares against the pool duration.
    /// Source ranges are cleared so a moved animation is not drawn twice.
    fn shift_floating_region(&mut self, new_entities: usize) {
        let old_start = self.animator.region_start();
        let shift = new_entities * self.span_len;
        self.animator.set_region_start(old_start + shift);

        let now = self.clock.now();
        if self.pool.is_idle(now) {
            return;
        }

        let digits = self.animator.max_digits();
        // Highest slot first: destinations lie above their sources.
        for slot in (0..self.pool.capacity()).rev() {
            if !self.pool.is_live(slot, now) {
                continue;
            }
            let src = old_start + slot * digits;
            let dest = src + shift;
            self.store.copy_within(src..src + digits, dest);
            self.store.mark_range_dirty(dest, digits);

            let stale = src..src + digits.min(shift);
            self.store.slice_mut(stale.clone()).fill(HudInstance::EMPTY);
            self.store.mark_range_dirty(stale.start, stale.len());
        }
    }

    fn update_active_count(&mut self) {
        let count =
            self.entity_count * self.span_len + self.config.capacity.floating_text_instances();
        self.store.set_active_count(count);
    }

    fn write_entity(&mut self, index: usize, spawn: &EntitySpawn<'_>) {
        let layout = &self.config.layout;
        let base = index * self.span_len;
        let position = spawn.position.to_array();
        let slot = self.avatars.get_or_assign(spawn.avatar);

        let avatar = HudInstance::new(ElementKind::Avatar, position)
            .with_offset(
                -layout.health_bar_width * 0.5 - layout.avatar_size * 0.5 - layout.side_gap,
                layout.avatar_offset_y,
            )
            .with_size(layout.avatar_size, layout.avatar_size)
            .with_uv(UvRect::FULL)
            .with_color(Color::WHITE)
            .with_flags(InstanceFlags::visible(ElementKind::Avatar).with_cache_slot(slot as u32));

        let background = HudInstance::new(ElementKind::Icon, position)
            .with_offset(0.0, layout.health_bar_offset_y)
            .with_size(layout.health_bar_width + 2.0, layout.health_bar_height + 2.0)
            .with_uv(UvRect::SOLID)
            .with_color(HEALTH_BACKGROUND_COLOR);

        let foreground = HudInstance::new(ElementKind::HealthBar, position)
            .with_offset(0.0, layout.health_bar_offset_y)
            .with_size(layout.health_bar_width, layout.health_bar_height)
            .with_uv(UvRect::SOLID)
            .with_color(health_color(spawn.health));

        let default_icon = layout.default_icon_uv;
        self.store.write(base + AVATAR, avatar);
        self.store.write(base + HEALTH_BACKGROUND, background);
        self.store.write(base + HEALTH_FOREGROUND, foreground);
        self.write_label(base, position, spawn.label);

        let icons_start = base + LABEL_START + self.config.capacity.max_label_len;
        for slot in 0..self.config.capacity.icon_slots {
            // The first icon is the class icon and starts visible.
            let record = if slot == 0 {
                self.icon_record(position, slot, default_icon)
            } else {
                HudInstance::EMPTY
            };
            self.store.write(icons_start + slot, record);
        }
    }

    /// Rewrite the label slots of the span starting at `base`.
    fn write_label(&mut self, base: usize, position: [f32; 3], label: &str) {
        let layout = &self.config.layout;
        let max_len = self.config.capacity.max_label_len;
        let char_size = layout.label_char_size;
        let advance = char_size * layout.glyph_width_ratio;
        let offset_y = layout.label_offset_y;

        let len = label.chars().take(max_len).count();
        let start_x = -(len as f32 * advance) * 0.5;

        let slots = self
            .store
            .slice_mut(base + LABEL_START..base + LABEL_START + max_len);
        let mut chars = label.chars();
        for (i, record) in slots.iter_mut().enumerate() {
            *record = match chars.next() {
                Some(code) => HudInstance::new(ElementKind::Text, position)
                    .with_offset(start_x + advance * (i as f32 + 0.5), offset_y)
                    .with_size(char_size, char_size)
                    .with_uv(self.glyphs.lookup(code))
                    .with_color(Color::WHITE),
                None => HudInstance::EMPTY,
            };
        }
    }

    fn icon_record(&self, position: [f32; 3], slot: usize, uv: UvRect) -> HudInstance {
        let layout = &self.config.layout;
        let stride = layout.icon_size + layout.side_gap;
        let x = layout.health_bar_width * 0.5 + layout.icon_size * 0.5 + layout.side_gap;
        HudInstance::new(ElementKind::Icon, position)
            .with_offset(x + slot as f32 * stride, layout.icon_offset_y)
            .with_size(layout.icon_size, layout.icon_size)
            .with_uv(uv)
            .with_color(Color::WHITE)
    }
}
