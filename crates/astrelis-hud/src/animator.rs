//! Floating combat text spawning.
//!
//! A spawn writes one pool record and a fixed span of digit records. All
//! motion and fading happens in the shader, driven by the spawn time stored
//! in each digit's alpha channel.

use std::ops::Range;

use bitflags::bitflags;
use glam::Vec3;

use crate::{
    animation_pool::{AnimationPool, FloatingTextRecord},
    color::Color,
    config::{FloatingTextConfig, HudLayout},
    glyph::GlyphTable,
    instance::{ElementKind, HudInstance, InstanceFlags},
    instance_store::InstanceStore,
    profiling::profile_function,
};

/// Palette selection for floating text.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FloatingTextStyle {
    #[default]
    Damage = 0,
    Heal = 1,
    Critical = 2,
}

impl FloatingTextStyle {
    /// Decode a raw style value; anything unknown is [`Damage`](Self::Damage).
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => FloatingTextStyle::Heal,
            2 => FloatingTextStyle::Critical,
            _ => FloatingTextStyle::Damage,
        }
    }
}

bitflags! {
    /// Style bits stored in [`FloatingTextRecord::style_flags`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FloatingTextFlags: u32 {
        /// Bits 0-1: [`FloatingTextStyle`] discriminant.
        const STYLE_MASK = 0b011;
        /// Bit 2: critical hit marker (larger glyphs, stronger bounce).
        const CRITICAL   = 0b100;
    }
}

impl FloatingTextFlags {
    pub fn for_style(style: FloatingTextStyle) -> Self {
        let mut flags = Self::from_bits_retain(style as u32 & Self::STYLE_MASK.bits());
        if style == FloatingTextStyle::Critical {
            flags |= Self::CRITICAL;
        }
        flags
    }

    pub fn style(self) -> FloatingTextStyle {
        FloatingTextStyle::from_raw(self.bits() & Self::STYLE_MASK.bits())
    }
}

/// Decimal digits of a `u64`, most significant first, on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitBuffer {
    digits: [u8; DigitBuffer::CAPACITY],
    len: usize,
}

impl DigitBuffer {
    /// Digits in `u64::MAX`.
    pub const CAPACITY: usize = 20;

    pub fn as_slice(&self) -> &[u8] {
        &self.digits[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Split `value` into at most `max_digits` decimal digits.
///
/// Zero yields a single `0`. When the value has more digits than allowed,
/// only the least significant `max_digits` are kept, so `12345678` with a
/// limit of 6 yields `345678`.
pub fn decompose_digits(mut value: u64, max_digits: usize) -> DigitBuffer {
    let max_digits = max_digits.clamp(1, DigitBuffer::CAPACITY);
    let mut reversed = [0u8; DigitBuffer::CAPACITY];
    let mut len = 0;

    if value == 0 {
        len = 1;
    }
    while value > 0 && len < max_digits {
        reversed[len] = (value % 10) as u8;
        value /= 10;
        len += 1;
    }

    let mut digits = [0u8; DigitBuffer::CAPACITY];
    for i in 0..len {
        digits[i] = reversed[len - 1 - i];
    }
    DigitBuffer { digits, len }
}

/// Writes floating-text records and their digit instances.
///
/// Digit spans live in a region of the instance store that starts right after
/// the entity spans; pool slot `s` owns records
/// `region_start + s * max_digits..region_start + (s + 1) * max_digits`.
#[derive(Debug, Clone)]
pub struct FloatingTextAnimator {
    config: FloatingTextConfig,
    max_digits: usize,
    glyph_width_ratio: f32,
    offset_y: f32,
    region_start: usize,
}

impl FloatingTextAnimator {
    pub fn new(config: FloatingTextConfig, layout: &HudLayout, max_digits: usize) -> Self {
        Self {
            config,
            max_digits,
            glyph_width_ratio: layout.glyph_width_ratio,
            offset_y: layout.floating_text_offset_y,
            region_start: 0,
        }
    }

    pub fn max_digits(&self) -> usize {
        self.max_digits
    }

    pub fn region_start(&self) -> usize {
        self.region_start
    }

    /// Move the digit region. Existing digit records are not moved.
    pub fn set_region_start(&mut self, start: usize) {
        self.region_start = start;
    }

    /// Instance range owned by pool slot `slot`.
    pub fn digit_span(&self, slot: usize) -> Range<usize> {
        let start = self.region_start + slot * self.max_digits;
        start..start + self.max_digits
    }

    /// Base color and glyph size for `style`.
    pub fn appearance(&self, style: FloatingTextStyle) -> (Color, f32) {
        let cfg = &self.config;
        match style {
            FloatingTextStyle::Damage => (cfg.damage_color, cfg.char_size),
            FloatingTextStyle::Heal => (cfg.heal_color, cfg.char_size),
            FloatingTextStyle::Critical => (cfg.crit_color, cfg.char_size * cfg.crit_scale),
        }
    }

    /// Start a floating text at `position` and return its pool slot.
    ///
    /// `now` becomes the record's start time and is stored in the alpha
    /// channel of every digit. The sign of `value` is not shown.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &self,
        pool: &mut AnimationPool,
        store: &mut InstanceStore,
        glyphs: &GlyphTable,
        position: Vec3,
        value: f32,
        style: FloatingTextStyle,
        now: f32,
    ) -> usize {
        profile_function!();

        let slot = pool.write(FloatingTextRecord {
            start_time: now,
            duration: self.config.duration,
            value,
            style_flags: FloatingTextFlags::for_style(style).bits(),
        });

        let (color, char_size) = self.appearance(style);
        let digits = decompose_digits(value.round().abs() as u64, self.max_digits);
        let advance = char_size * self.glyph_width_ratio;
        let start_x = -(digits.len() as f32 * advance) * 0.5;
        let flags = InstanceFlags::visible(ElementKind::FloatingText).with_reserved(slot as u32);

        let span = self.digit_span(slot);
        for (i, record) in store.slice_mut(span.clone()).iter_mut().enumerate() {
            *record = match digits.as_slice().get(i) {
                Some(&digit) => HudInstance::new(ElementKind::FloatingText, position.to_array())
                    .with_offset(start_x + advance * (i as f32 + 0.5), self.offset_y)
                    .with_size(char_size, char_size)
                    .with_uv(glyphs.lookup(char::from(b'0' + digit)))
                    .with_color(color.with_alpha(now))
                    .with_flags(flags),
                None => HudInstance::EMPTY,
            };
        }
        store.mark_range_dirty(span.start, span.len());

        slot
    }
}
