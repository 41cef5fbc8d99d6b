//! The GPU-visible widget record and its packed flag word.

use bytemuck::{Pod, Zeroable};

use crate::{color::Color, glyph::UvRect};

/// Element kind discriminant, stored in the low three flag bits.
///
/// The kind selects how the shader interprets a record; every kind shares the
/// same record shape.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Avatar slice sampled from the texture array.
    Avatar = 0,
    /// Atlas sprite (also used for solid fills).
    Icon = 1,
    /// Health bar, width clipped by `color.a`.
    HealthBar = 2,
    /// SDF glyph.
    Text = 3,
    /// Animated SDF digit; `color.a` carries the spawn time.
    FloatingText = 4,
}

impl ElementKind {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(ElementKind::Avatar),
            1 => Some(ElementKind::Icon),
            2 => Some(ElementKind::HealthBar),
            3 => Some(ElementKind::Text),
            4 => Some(ElementKind::FloatingText),
            _ => None,
        }
    }
}

/// Packed per-record state.
///
/// | bits   | field                         |
/// |--------|-------------------------------|
/// | 0..3   | [`ElementKind`]               |
/// | 3      | visible                       |
/// | 4..12  | avatar cache slot             |
/// | 12..32 | reserved (floating-text pool slot for digit records) |
///
/// Setters mask their input to the field width and leave the other fields
/// untouched.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct InstanceFlags(u32);

impl InstanceFlags {
    pub const KIND_BITS: u32 = 3;
    const KIND_MASK: u32 = (1 << Self::KIND_BITS) - 1;

    const VISIBLE_BIT: u32 = 3;

    pub const CACHE_SLOT_SHIFT: u32 = 4;
    pub const CACHE_SLOT_BITS: u32 = 8;
    pub const CACHE_SLOT_MAX: u32 = (1 << Self::CACHE_SLOT_BITS) - 1;

    pub const RESERVED_SHIFT: u32 = 12;
    pub const RESERVED_BITS: u32 = 20;
    pub const RESERVED_MAX: u32 = (1 << Self::RESERVED_BITS) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Decoded kind; `None` for the three unassigned encodings.
    pub const fn kind(self) -> Option<ElementKind> {
        ElementKind::from_raw(self.0 & Self::KIND_MASK)
    }

    pub fn set_kind(&mut self, kind: ElementKind) {
        self.0 = (self.0 & !Self::KIND_MASK) | (kind as u32 & Self::KIND_MASK);
    }

    pub const fn is_visible(self) -> bool {
        self.0 & (1 << Self::VISIBLE_BIT) != 0
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            self.0 |= 1 << Self::VISIBLE_BIT;
        } else {
            self.0 &= !(1 << Self::VISIBLE_BIT);
        }
    }

    pub const fn cache_slot(self) -> u32 {
        (self.0 >> Self::CACHE_SLOT_SHIFT) & Self::CACHE_SLOT_MAX
    }

    pub fn set_cache_slot(&mut self, slot: u32) {
        let mask = Self::CACHE_SLOT_MAX << Self::CACHE_SLOT_SHIFT;
        self.0 = (self.0 & !mask) | ((slot & Self::CACHE_SLOT_MAX) << Self::CACHE_SLOT_SHIFT);
    }

    pub const fn reserved(self) -> u32 {
        (self.0 >> Self::RESERVED_SHIFT) & Self::RESERVED_MAX
    }

    pub fn set_reserved(&mut self, value: u32) {
        let mask = Self::RESERVED_MAX << Self::RESERVED_SHIFT;
        self.0 = (self.0 & !mask) | ((value & Self::RESERVED_MAX) << Self::RESERVED_SHIFT);
    }

    /// Visible flags of the given kind.
    pub fn visible(kind: ElementKind) -> Self {
        let mut flags = Self::empty();
        flags.set_kind(kind);
        flags.set_visible(true);
        flags
    }

    pub fn with_cache_slot(mut self, slot: u32) -> Self {
        self.set_cache_slot(slot);
        self
    }

    pub fn with_reserved(mut self, value: u32) -> Self {
        self.set_reserved(value);
        self
    }
}

/// One drawable HUD element as laid out in the instance storage buffer.
///
/// 64 bytes, identical for every kind.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudInstance {
    pub world_position: [f32; 3],
    /// Pixel offset from the projected anchor.
    pub screen_offset: [f32; 2],
    /// Pixel size.
    pub size: [f32; 2],
    pub uv_rect: [f32; 4],
    /// RGBA; alpha is opacity, health fraction or spawn time depending on kind.
    pub color: [f32; 4],
    pub flags: InstanceFlags,
}

// SAFETY: HudInstance is repr(C) with only f32 and u32 fields, no padding holes
unsafe impl Pod for HudInstance {}
unsafe impl Zeroable for HudInstance {}

static_assertions::const_assert_eq!(std::mem::size_of::<HudInstance>(), 64);

impl HudInstance {
    /// An invisible, zeroed record.
    pub const EMPTY: HudInstance = HudInstance {
        world_position: [0.0; 3],
        screen_offset: [0.0; 2],
        size: [0.0; 2],
        uv_rect: [0.0; 4],
        color: [0.0; 4],
        flags: InstanceFlags::empty(),
    };

    /// Size of the record in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// A visible record of `kind` anchored at `world_position`.
    pub fn new(kind: ElementKind, world_position: [f32; 3]) -> Self {
        Self {
            world_position,
            flags: InstanceFlags::visible(kind),
            ..Self::EMPTY
        }
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.screen_offset = [x, y];
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = [width, height];
        self
    }

    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv_rect = uv.to_array();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color.to_array();
        self
    }

    pub fn with_flags(mut self, flags: InstanceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.flags.is_visible()
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.flags.kind()
    }
}

impl Default for HudInstance {
    fn default() -> Self {
        Self::EMPTY
    }
}
