//! Rendering: the drawing surface, paint commands, and the grid rasterizer

pub mod paint;
pub mod raster;

use sha2::{Digest, Sha256};

pub use paint::{PaintCommand, Rgba};
pub use raster::{snap_to_grid, GridPoint, InputTensor, Rasterizer, StrokeState};

/// Opaque black; the value a fresh or cleared surface holds everywhere.
pub const BACKGROUND: Rgba = (0, 0, 0, 255);

/// An opaque RGBA pixel buffer that the rasterizer paints into.
///
/// The surface is the single source of truth for what has been drawn: strokes
/// mutate it and tensor extraction reads it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut s = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        };
        s.fill(BACKGROUND);
        s
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Overwrite every pixel with `rgba`, ignoring blending.
    pub fn fill(&mut self, rgba: Rgba) {
        let (r, g, b, a) = rgba;
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, a]);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let p = &self.pixels[i..i + 4];
        Some((p[0], p[1], p[2], p[3]))
    }

    /// Paint a command onto the surface. Out-of-bounds parts are clipped.
    pub fn apply(&mut self, cmd: &PaintCommand) {
        let PaintCommand::SolidRect { x, y, width, height, rgba } = *cmd;
        let Some((x0, y0, x1, y1)) = paint::clip_rect(x, y, width, height, self.width, self.height) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let i = self.offset(px, py);
                paint::composite(&mut self.pixels[i..i + 4], rgba);
            }
        }
    }

    /// Mean of the R, G and B channels over a rectangle, in [0, 255].
    pub fn mean_gray(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        let x1 = (x + width).min(self.width);
        let y1 = (y + height).min(self.height);
        let mut sum = 0u64;
        let mut count = 0u64;
        for py in y.min(y1)..y1 {
            for px in x.min(x1)..x1 {
                let i = self.offset(px, py);
                sum += self.pixels[i] as u64 + self.pixels[i + 1] as u64 + self.pixels[i + 2] as u64;
                count += 3;
            }
        }
        if count == 0 {
            return 0.0;
        }
        sum as f64 / count as f64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Hex SHA-256 of the raw RGBA bytes; stable across runs for golden tests.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}
