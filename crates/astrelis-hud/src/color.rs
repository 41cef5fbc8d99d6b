/// An RGBA color with `f32` components in the `0.0..=1.0` range.
///
/// The struct is `#[repr(C)]` and implements `bytemuck::Pod`, so it can be
/// written directly into instance records.
///
/// ```
/// use astrelis_hud::Color;
///
/// let heal = Color::rgb(0.2, 1.0, 0.3);
/// let faded = heal.with_alpha(0.25);
/// assert_eq!(faded.to_array(), [0.2, 1.0, 0.3, 0.25]);
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from RGB components with full opacity (alpha = 1.0).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Return a copy with the alpha channel replaced.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linearly interpolate all four channels.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// Health bar fill color for a health fraction.
///
/// Green at full health, yellow at half, red at zero. The alpha channel
/// carries the clamped fraction, which the shader uses to clip the bar width.
/// NaN is treated as zero health.
pub fn health_color(fraction: f32) -> Color {
    let t = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let rgb = if t > 0.5 {
        Color::YELLOW.lerp(Color::GREEN, (t - 0.5) * 2.0)
    } else {
        Color::RED.lerp(Color::YELLOW, t * 2.0)
    };
    rgb.with_alpha(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_color_endpoints() {
        assert_eq!(health_color(1.0), Color::rgba(0.0, 1.0, 0.0, 1.0));
        assert_eq!(health_color(0.5), Color::rgba(1.0, 1.0, 0.0, 0.5));
        assert_eq!(health_color(0.0), Color::rgba(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_health_color_clamps() {
        assert_eq!(health_color(3.0), health_color(1.0));
        assert_eq!(health_color(-2.0), health_color(0.0));
        assert_eq!(health_color(0.25).a, 0.25);
    }

    #[test]
    fn test_health_color_nan_is_empty() {
        let c = health_color(f32::NAN);
        assert_eq!(c, health_color(0.0));
        assert!(c.to_array().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_health_color_quarter() {
        let c = health_color(0.25);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }
}
