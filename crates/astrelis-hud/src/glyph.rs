//! Immutable character-code to atlas-rectangle lookup.
//!
//! Glyphs are pre-rasterized SDF cells in the static atlas. The table is built
//! once and only read afterwards; lookups are a binary search over a boxed
//! slice and never allocate.

use crate::error::{HudError, HudResult};

/// A normalized atlas rectangle: origin plus extent, all in UV space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UvRect {
    pub u: f32,
    pub v: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);

    /// A tiny corner of the atlas, sampled as a solid color.
    pub const SOLID: UvRect = UvRect::new(0.0, 0.0, 0.01, 0.01);

    pub const fn new(u: f32, v: f32, width: f32, height: f32) -> Self {
        Self {
            u,
            v,
            width,
            height,
        }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.u, self.v, self.width, self.height]
    }
}

/// One glyph cell in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphRecord {
    pub code: char,
    pub uv_rect: UvRect,
    /// Horizontal advance in pixels.
    pub advance: f32,
    pub baseline_offset: f32,
}

impl GlyphRecord {
    pub const fn new(code: char, uv_rect: UvRect, advance: f32, baseline_offset: f32) -> Self {
        Self {
            code,
            uv_rect,
            advance,
            baseline_offset,
        }
    }
}

/// Sorted glyph table with binary-search lookup.
///
/// # Example
///
/// ```
/// use astrelis_hud::{GlyphTable, UvRect};
///
/// let table = GlyphTable::with_digit_defaults(UvRect::new(0.0, 0.9375, 0.75, 0.0625));
/// assert_eq!(table.lookup('0'), UvRect::new(0.0, 0.9375, 0.0625, 0.0625));
/// assert_eq!(table.lookup('?'), GlyphTable::FALLBACK_UV);
/// ```
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: Box<[GlyphRecord]>,
}

impl GlyphTable {
    /// Rectangle returned for characters missing from the table.
    pub const FALLBACK_UV: UvRect = UvRect::SOLID;

    /// Advance returned for characters missing from the table.
    pub const DEFAULT_ADVANCE: f32 = 8.0;

    /// Atlas width the default digit advances are expressed against.
    const DEFAULT_ATLAS_PX: f32 = 512.0;

    /// Build a table from records sorted strictly ascending by code.
    ///
    /// Returns [`HudError::InvalidGlyphTable`] at the first record that is
    /// not greater than its predecessor.
    pub fn new(glyphs: Vec<GlyphRecord>) -> HudResult<Self> {
        if let Some(position) = glyphs.windows(2).position(|w| w[0].code >= w[1].code) {
            return Err(HudError::InvalidGlyphTable {
                position: position + 1,
                previous: glyphs[position].code,
                current: glyphs[position + 1].code,
            });
        }
        Ok(Self {
            glyphs: glyphs.into_boxed_slice(),
        })
    }

    /// Lay out '0'..'9', '+' and '-' as twelve equal cells across `region`.
    pub fn with_digit_defaults(region: UvRect) -> Self {
        const CODES: [char; 12] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '-'];

        let cell_width = region.width / CODES.len() as f32;
        let mut glyphs: Vec<GlyphRecord> = CODES
            .iter()
            .enumerate()
            .map(|(i, &code)| {
                GlyphRecord::new(
                    code,
                    UvRect::new(
                        region.u + i as f32 * cell_width,
                        region.v,
                        cell_width,
                        region.height,
                    ),
                    cell_width * Self::DEFAULT_ATLAS_PX,
                    0.0,
                )
            })
            .collect();
        glyphs.sort_by_key(|g| g.code);

        Self {
            glyphs: glyphs.into_boxed_slice(),
        }
    }

    /// The record for `code`, if present.
    pub fn get(&self, code: char) -> Option<&GlyphRecord> {
        self.glyphs
            .binary_search_by_key(&code, |g| g.code)
            .ok()
            .map(|i| &self.glyphs[i])
    }

    /// Atlas rectangle for `code`, or [`Self::FALLBACK_UV`].
    #[inline]
    pub fn lookup(&self, code: char) -> UvRect {
        self.get(code).map_or(Self::FALLBACK_UV, |g| g.uv_rect)
    }

    /// Advance width for `code`, or [`Self::DEFAULT_ADVANCE`].
    #[inline]
    pub fn advance(&self, code: char) -> f32 {
        self.get(code).map_or(Self::DEFAULT_ADVANCE, |g| g.advance)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(code: char, u: f32) -> GlyphRecord {
        GlyphRecord::new(code, UvRect::new(u, 0.5, 0.1, 0.1), 10.0 + u, 1.0)
    }

    #[test]
    fn test_lookup_present_codes() {
        let table = GlyphTable::new(vec![glyph('A', 0.1), glyph('B', 0.2), glyph('z', 0.3)])
            .unwrap();

        assert_eq!(table.lookup('A'), UvRect::new(0.1, 0.5, 0.1, 0.1));
        assert_eq!(table.lookup('B'), UvRect::new(0.2, 0.5, 0.1, 0.1));
        assert_eq!(table.lookup('z'), UvRect::new(0.3, 0.5, 0.1, 0.1));
        assert_eq!(table.advance('z'), 10.3);
    }

    #[test]
    fn test_lookup_missing_codes_fall_back() {
        let table = GlyphTable::new(vec![glyph('A', 0.1), glyph('C', 0.2)]).unwrap();

        for code in ['B', '@', 'D', '\u{4e2d}'] {
            assert_eq!(table.lookup(code), GlyphTable::FALLBACK_UV);
            assert_eq!(table.advance(code), GlyphTable::DEFAULT_ADVANCE);
        }
    }

    #[test]
    fn test_empty_table() {
        let table = GlyphTable::new(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.lookup('0'), GlyphTable::FALLBACK_UV);
    }

    #[test]
    fn test_unsorted_rejected() {
        let err = GlyphTable::new(vec![glyph('B', 0.1), glyph('A', 0.2)]).unwrap_err();
        assert!(matches!(
            err,
            HudError::InvalidGlyphTable {
                position: 1,
                previous: 'B',
                current: 'A'
            }
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = GlyphTable::new(vec![glyph('A', 0.1), glyph('A', 0.2)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_digit_defaults_layout() {
        let table = GlyphTable::with_digit_defaults(UvRect::new(0.0, 0.9375, 0.75, 0.0625));

        assert_eq!(table.len(), 12);
        assert_eq!(table.lookup('5'), UvRect::new(0.3125, 0.9375, 0.0625, 0.0625));
        assert_eq!(table.lookup('+'), UvRect::new(0.625, 0.9375, 0.0625, 0.0625));
        assert_eq!(table.lookup('-'), UvRect::new(0.6875, 0.9375, 0.0625, 0.0625));
        assert_eq!(table.advance('7'), 32.0);
    }
}
