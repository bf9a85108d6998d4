//! Paint commands and the source-over compositing used to apply them

/// Straight (non-premultiplied) 8-bit color with alpha.
pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
}

impl PaintCommand {
    /// White rectangle with the given opacity in [0, 1].
    pub fn white_rect(x: i32, y: i32, size: u32, opacity: f32) -> Self {
        PaintCommand::SolidRect {
            x,
            y,
            width: size,
            height: size,
            rgba: (255, 255, 255, alpha_byte(opacity)),
        }
    }
}

pub(crate) fn alpha_byte(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Intersect a rectangle with a `width` x `height` surface.
///
/// Returns the half-open pixel range `(x0, y0, x1, y1)`, or `None` when nothing
/// of the rectangle lands on the surface.
pub(crate) fn clip_rect(x: i32, y: i32, w: u32, h: u32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = (x as i64).max(0);
    let y0 = (y as i64).max(0);
    let x1 = (x as i64 + w as i64).min(width as i64);
    let y1 = (y as i64 + h as i64).min(height as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
}

/// Source-over blend of `src` onto an opaque destination pixel.
pub(crate) fn composite(dst: &mut [u8], src: Rgba) {
    let (r, g, b, a) = src;
    if a == 255 {
        dst[..3].copy_from_slice(&[r, g, b]);
        return;
    }
    let alpha = a as f32 / 255.0;
    for (d, s) in dst[..3].iter_mut().zip([r, g, b]) {
        *d = (s as f32 * alpha + *d as f32 * (1.0 - alpha)).round() as u8;
    }
}
