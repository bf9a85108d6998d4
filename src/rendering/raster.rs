//! Grid rasterizer: turns pointer positions into soft splats on a 28x28 grid

use log::debug;

use crate::rendering::{PaintCommand, Surface, BACKGROUND};
use crate::{Error, PadConfig, Result, GRID_SIZE, TENSOR_LEN};

/// Top-left corner of a grid cell, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

/// Map a continuous coordinate to the top-left corner of its containing cell.
///
/// Uses floor division, so negative coordinates snap to the cell left of/above
/// zero. Results beyond the `i32` range saturate; the rasterizer pulls them
/// back to the edge of the surface before painting.
pub fn snap_to_grid(x: f64, y: f64, cell_size: u32) -> GridPoint {
    let c = cell_size as f64;
    GridPoint {
        x: ((x / c).floor() * c) as i32,
        y: ((y / c).floor() * c) as i32,
    }
}

/// Pointer-path state of the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeState {
    Idle,
    /// `last` is the previous snapped point, `None` until the first splat.
    Drawing { last: Option<GridPoint> },
}

/// 784 normalized intensities in [0, 1], row-major over the 28x28 grid.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Vec<f64>);

impl InputTensor {
    pub fn zeros() -> Self {
        InputTensor(vec![0.0; TENSOR_LEN])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Intensity of the cell at grid column `gx`, row `gy`.
    pub fn at(&self, gx: usize, gy: usize) -> f64 {
        self.0[gy * GRID_SIZE + gx]
    }
}

impl TryFrom<Vec<f64>> for InputTensor {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        if values.len() != TENSOR_LEN {
            return Err(Error::Shape { expected: TENSOR_LEN, actual: values.len() });
        }
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(Error::Inference("tensor values must lie in [0, 1]".into()));
        }
        Ok(InputTensor(values))
    }
}

/// Owns the drawing surface and the pointer-path state.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    surface: Surface,
    cell_size: u32,
    neighbor_alpha: f32,
    diagonal_alpha: f32,
    state: StrokeState,
}

impl Rasterizer {
    pub fn new(config: &PadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            surface: Surface::new(config.canvas_size, config.canvas_size),
            cell_size: config.cell_size,
            neighbor_alpha: config.neighbor_alpha,
            diagonal_alpha: config.diagonal_alpha,
            state: StrokeState::Idle,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    pub fn snap_to_grid(&self, x: f64, y: f64) -> GridPoint {
        snap_to_grid(x, y, self.cell_size)
    }

    /// Start a stroke at `(x, y)`: the first splat has no interpolation partner.
    ///
    /// A non-finite point still starts the stroke but paints nothing.
    pub fn begin_stroke(&mut self, x: f64, y: f64) {
        self.state = StrokeState::Drawing { last: None };
        self.stroke_to(x, y);
    }

    /// Extend the active stroke. Returns `false` (and paints nothing) when
    /// idle or when the point is not finite.
    pub fn continue_stroke(&mut self, x: f64, y: f64) -> bool {
        if !self.is_drawing() {
            return false;
        }
        self.stroke_to(x, y)
    }

    pub fn end_stroke(&mut self) {
        self.state = StrokeState::Idle;
    }

    fn stroke_to(&mut self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            debug!("ignoring non-finite pointer position ({}, {})", x, y);
            return false;
        }
        let curr = self.confine(self.snap_to_grid(x, y));
        let prev = match self.state {
            StrokeState::Drawing { last } => last,
            StrokeState::Idle => None,
        };
        self.draw_stroke(prev, curr);
        self.state = StrokeState::Drawing { last: Some(curr) };
        true
    }

    /// Pull a snapped point into a two-cell margin around the surface.
    ///
    /// A splat centered in the margin reaches no surface pixel, so confined
    /// points paint exactly what the original ones would.
    fn confine(&self, p: GridPoint) -> GridPoint {
        let c = self.cell_size as i32;
        let lo = -2 * c;
        GridPoint {
            x: p.x.clamp(lo, self.surface.width() as i32 + c),
            y: p.y.clamp(lo, self.surface.height() as i32 + c),
        }
    }

    /// Paint from `prev` to `curr` (both snapped).
    ///
    /// Without a previous point a single splat lands on `curr`. Otherwise
    /// splats are placed every cell-length along the segment, starting at
    /// `prev` and stopping short of `curr`, which the next segment starts from.
    ///
    /// Points far outside the surface are confined to its margin first.
    pub fn draw_stroke(&mut self, prev: Option<GridPoint>, curr: GridPoint) {
        let curr = self.confine(curr);
        let Some(prev) = prev.map(|p| self.confine(p)) else {
            self.splat(curr.x, curr.y);
            return;
        };

        let dx = (curr.x - prev.x) as f64;
        let dy = (curr.y - prev.y) as f64;
        let distance = (dx * dx + dy * dy).sqrt();
        let steps = ((distance / self.cell_size as f64).floor() as usize).max(1);

        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let ix = round_half_up(prev.x as f64 + dx * t);
            let iy = round_half_up(prev.y as f64 + dy * t);
            self.splat(ix, iy);
        }
    }

    /// The nine rectangles of one splat, in paint order.
    ///
    /// Diagonals first, then orthogonal neighbors, then the full-intensity
    /// center so nothing from the same splat covers it.
    pub fn splat_commands(&self, x: i32, y: i32) -> [PaintCommand; 9] {
        let c = self.cell_size as i32;
        let size = self.cell_size;
        let diag = self.diagonal_alpha;
        let near = self.neighbor_alpha;
        let (l, r) = (x.saturating_sub(c), x.saturating_add(c));
        let (u, d) = (y.saturating_sub(c), y.saturating_add(c));
        [
            PaintCommand::white_rect(l, u, size, diag),
            PaintCommand::white_rect(r, u, size, diag),
            PaintCommand::white_rect(l, d, size, diag),
            PaintCommand::white_rect(r, d, size, diag),
            PaintCommand::white_rect(l, y, size, near),
            PaintCommand::white_rect(r, y, size, near),
            PaintCommand::white_rect(x, u, size, near),
            PaintCommand::white_rect(x, d, size, near),
            PaintCommand::white_rect(x, y, size, 1.0),
        ]
    }

    fn splat(&mut self, x: i32, y: i32) {
        for cmd in self.splat_commands(x, y) {
            self.surface.apply(&cmd);
        }
    }

    /// Reset the surface to background. The stroke state is left alone.
    pub fn clear(&mut self) {
        self.surface.fill(BACKGROUND);
    }

    /// Box-average each cell and normalize the channel mean to [0, 1].
    pub fn extract_tensor(&self) -> InputTensor {
        let c = self.cell_size;
        let mut values = Vec::with_capacity(TENSOR_LEN);
        for gy in 0..GRID_SIZE as u32 {
            for gx in 0..GRID_SIZE as u32 {
                let gray = self.surface.mean_gray(gx * c, gy * c, c, c);
                values.push((gray / 255.0).clamp(0.0, 1.0));
            }
        }
        InputTensor(values)
    }
}

// Ties round toward positive infinity: 2.5 -> 3, -2.5 -> -2.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster() -> Rasterizer {
        Rasterizer::new(&PadConfig::default()).unwrap()
    }

    #[test]
    fn snap_floors_to_cell_corner() {
        assert_eq!(snap_to_grid(0.0, 0.0, 10), GridPoint { x: 0, y: 0 });
        assert_eq!(snap_to_grid(19.9, 10.0, 10), GridPoint { x: 10, y: 10 });
        assert_eq!(snap_to_grid(-3.0, 279.5, 10), GridPoint { x: -10, y: 270 });
    }

    #[test]
    fn round_half_up_breaks_ties_upward() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(7.49), 7);
    }

    #[test]
    fn splat_paints_center_last() {
        let r = raster();
        let cmds = r.splat_commands(100, 100);
        match cmds[8] {
            PaintCommand::SolidRect { x, y, rgba, .. } => {
                assert_eq!((x, y), (100, 100));
                assert_eq!(rgba.3, 255);
            }
        }
    }

    #[test]
    fn state_machine_transitions() {
        let mut r = raster();
        assert_eq!(r.state(), StrokeState::Idle);
        assert!(!r.continue_stroke(50.0, 50.0));
        assert_eq!(r.extract_tensor(), InputTensor::zeros());

        r.begin_stroke(55.0, 42.0);
        assert_eq!(r.state(), StrokeState::Drawing { last: Some(GridPoint { x: 50, y: 40 }) });
        assert!(r.continue_stroke(81.0, 40.0));
        assert_eq!(r.state(), StrokeState::Drawing { last: Some(GridPoint { x: 80, y: 40 }) });

        r.end_stroke();
        assert_eq!(r.state(), StrokeState::Idle);
    }

    #[test]
    fn begin_stroke_forgets_previous_point() {
        let mut r = raster();
        r.begin_stroke(10.0, 10.0);
        r.end_stroke();
        r.begin_stroke(200.0, 200.0);
        let t = r.extract_tensor();
        // nothing interpolated between the two strokes
        assert_eq!(t.at(10, 10), 0.0);
    }

    #[test]
    fn far_points_are_confined_without_overflow() {
        let mut r = raster();
        r.begin_stroke(3.0e9, 10.0);
        assert_eq!(r.state(), StrokeState::Drawing { last: Some(GridPoint { x: 290, y: 10 }) });
        assert_eq!(r.extract_tensor(), InputTensor::zeros());

        r.draw_stroke(Some(GridPoint { x: i32::MIN, y: i32::MIN }), GridPoint { x: i32::MAX, y: i32::MAX });
        let cmds = r.splat_commands(i32::MAX, i32::MIN);
        assert!(matches!(cmds[1], PaintCommand::SolidRect { x: i32::MAX, y, .. } if y == i32::MIN));
    }

    #[test]
    fn non_finite_points_paint_nothing() {
        let mut r = raster();
        r.begin_stroke(f64::NAN, 10.0);
        assert_eq!(r.state(), StrokeState::Drawing { last: None });
        assert!(!r.continue_stroke(50.0, f64::INFINITY));
        assert_eq!(r.extract_tensor(), InputTensor::zeros());

        // the next finite point starts the path afresh
        assert!(r.continue_stroke(100.0, 100.0));
        let t = r.extract_tensor();
        assert!((t.at(10, 10) - 1.0).abs() < 0.01);
        assert_eq!(t.as_slice().iter().filter(|v| **v > 0.0).count(), 9);
    }

    #[test]
    fn tensor_try_from_checks_shape() {
        assert!(matches!(
            InputTensor::try_from(vec![0.0; 3]),
            Err(Error::Shape { expected: 784, actual: 3 })
        ));
        assert!(InputTensor::try_from(vec![0.5; 784]).is_ok());
        assert!(InputTensor::try_from(vec![1.5; 784]).is_err());
    }
}
