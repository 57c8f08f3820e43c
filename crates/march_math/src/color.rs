//! Color helpers.
//!
//! Colors are linear RGB in `Vec3`. Anything handed to a display is RGBA
//! with alpha pinned to 1.

use crate::{Vec3, Vec4};

/// Color type alias (RGB values, 0-1 after clamping)
pub type Color = Vec3;

/// RGBA color handed to display layers.
pub type Rgba = Vec4;

/// Clamp a color channel-wise to [0, 1].
///
/// NaN maps to 0 and infinities saturate, so no non-finite value can leave
/// the renderer.
#[inline]
pub fn clamp_color(color: Color) -> Color {
    Color::new(clamp_channel(color.x), clamp_channel(color.y), clamp_channel(color.z))
}

#[inline]
fn clamp_channel(c: f32) -> f32 {
    if c.is_nan() {
        0.0
    } else {
        c.clamp(0.0, 1.0)
    }
}

/// Clamp a color and extend it with alpha = 1.
#[inline]
pub fn to_rgba(color: Color) -> Rgba {
    clamp_color(color).extend(1.0)
}

/// Convert a color to 8-bit RGBA with alpha 255.
pub fn color_to_rgba8(color: Color) -> [u8; 4] {
    let c = clamp_color(color);
    [
        (255.0 * c.x).round() as u8,
        (255.0 * c.y).round() as u8,
        (255.0 * c.z).round() as u8,
        255,
    ]
}
