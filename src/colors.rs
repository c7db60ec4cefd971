//! Packed ARGB8888 colors and the helpers used to interpolate them.

/// Clear color of the foreground surface.
pub const BACKGROUND: u32 = 0xFFFFFFFF;
/// Outline color used by wireframe mode.
pub const OUTLINE: u32 = 0xFF000000;
/// Fill color used by filled mode with flat shading.
pub const FILL: u32 = 0xFF00008B;
/// Vertex color used when a mesh carries no color stream.
pub const WHITE: u32 = 0xFFFFFFFF;

pub type Rgb = (f32, f32, f32);

/// Packs normalized channels into ARGB8888. Channels are clamped to [0, 1].
#[inline]
pub fn pack_color(r: f32, g: f32, b: f32, a: f32) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (to_byte(a) << 24) | (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

/// Unpacks the RGB channels of an ARGB8888 color to [0, 1].
#[inline]
pub fn unpack_color(color: u32) -> Rgb {
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    (channel(16), channel(8), channel(0))
}

#[inline]
pub fn lerp_color(a: Rgb, b: Rgb, t: f32) -> Rgb {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Interpolates two packed colors; the result is opaque.
#[inline]
pub fn lerp_packed(a: u32, b: u32, t: f32) -> u32 {
    let (r, g, b) = lerp_color(unpack_color(a), unpack_color(b), t);
    pack_color(r, g, b, 1.0)
}
