//! Digitpad
//!
//! A drawing pad for handwritten digits: pointer and touch strokes are painted
//! onto a 280x280 surface as soft splats on a 28x28 grid, the grid is read back
//! as a 784-element intensity tensor, and that tensor is handed to an external
//! digit classifier whose ten class probabilities are rendered as a bar chart.
//!
//! # Features
//!
//! - **Rasterizer**: grid snapping, gap-free stroke interpolation, box-averaged
//!   tensor extraction
//! - **Inference bridge**: a one-time readiness gate in front of the classifier,
//!   scoped release of every classifier-side buffer, contained failures
//! - **Worker protocol**: run the classifier in a child process over JSON lines
//!
//! # Example
//!
//! ```
//! use digitpad::{DrawingPad, InputEvent, PadConfig, UniformModel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pad = DrawingPad::new(PadConfig::default(), UniformModel::new())?;
//! pad.load_model()?;
//! pad.handle(InputEvent::MouseDown { x: 140.0, y: 60.0 });
//! pad.handle(InputEvent::MouseMove { x: 140.0, y: 220.0 });
//! pad.handle(InputEvent::MouseUp);
//! assert!(pad.display().to_html().contains("Predictions:"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod inference;
pub mod pad;
pub mod rendering;

pub use inference::display::{format, DisplayRegion, Prediction, PredictionChart, PredictionRow};
pub use inference::model::{BufferHandle, Classifier, ScopedBuffer, UniformModel};
pub use inference::process::ProcessModel;
pub use inference::{InferenceBridge, LoadSignal, Readiness, ReadinessGate};
pub use pad::{DrawingPad, EventOutcome, InputEvent};
pub use rendering::{snap_to_grid, GridPoint, InputTensor, Rasterizer, Surface};

/// Cells per side of the sampling grid.
pub const GRID_SIZE: usize = 28;
/// Elements in an input tensor.
pub const TENSOR_LEN: usize = GRID_SIZE * GRID_SIZE;
/// Digit classes, and elements in a prediction vector.
pub const CLASS_COUNT: usize = 10;

/// Configuration for a drawing pad
///
/// The defaults reproduce the classic MNIST pad: a 280x280 surface of 10x10
/// cells, neighbors painted at 70% and diagonals at 30% opacity.
///
/// # Examples
///
/// ```
/// let cfg = digitpad::PadConfig::default();
/// assert_eq!(cfg.grid_size(), 28);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// Side of the square drawing surface in pixels
    pub canvas_size: u32,
    /// Side of one grid cell in pixels
    pub cell_size: u32,
    /// Opacity of the four orthogonal neighbors of a splat
    pub neighbor_alpha: f32,
    /// Opacity of the four diagonal neighbors of a splat
    pub diagonal_alpha: f32,
    /// Identifier passed to the classifier's load step
    pub model_resource: String,
    /// Whether releasing the pointer triggers a prediction
    pub predict_on_release: bool,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            canvas_size: 280,
            cell_size: 10,
            neighbor_alpha: 0.7,
            diagonal_alpha: 0.3,
            model_resource: "flatmodel_large.bin".to_string(),
            predict_on_release: true,
        }
    }
}

impl PadConfig {
    pub fn grid_size(&self) -> u32 {
        if self.cell_size == 0 {
            return 0;
        }
        self.canvas_size / self.cell_size
    }

    /// Reject configurations the 28x28 pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 || self.canvas_size % self.cell_size != 0 {
            return Err(Error::ConfigError(format!(
                "canvas size {} is not a multiple of cell size {}",
                self.canvas_size, self.cell_size
            )));
        }
        if self.grid_size() as usize != GRID_SIZE {
            return Err(Error::ConfigError(format!(
                "grid must be {0}x{0}, got {1}x{1}",
                GRID_SIZE,
                self.grid_size()
            )));
        }
        for (name, alpha) in [("neighbor_alpha", self.neighbor_alpha), ("diagonal_alpha", self.diagonal_alpha)] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(Error::ConfigError(format!("{} must be within [0, 1], got {}", name, alpha)));
            }
        }
        Ok(())
    }
}

/// Create a pad with the given classifier and load the configured model.
///
/// Hosts that want to keep drawing after a failed load should call
/// [`DrawingPad::new`] and [`DrawingPad::load_model`] separately.
pub fn new_pad<C: Classifier>(config: PadConfig, model: C) -> Result<DrawingPad<C>> {
    let mut pad = DrawingPad::new(config, model)?;
    pad.load_model()?;
    Ok(pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PadConfig::default();
        assert_eq!(config.canvas_size, 280);
        assert_eq!(config.cell_size, 10);
        assert_eq!(config.model_resource, "flatmodel_large.bin");
        assert!(config.predict_on_release);
    }

    #[test]
    fn validate_rejects_other_resolutions() {
        let cfg = PadConfig { canvas_size: 300, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
        let cfg = PadConfig { canvas_size: 560, cell_size: 10, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = PadConfig { cell_size: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
        // a smaller surface with the same grid is fine
        let cfg = PadConfig { canvas_size: 140, cell_size: 5, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_checks_alphas() {
        let cfg = PadConfig { diagonal_alpha: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_reads_partial_json() {
        let cfg: PadConfig = serde_json::from_str(r#"{"model_resource":"tiny.bin"}"#).unwrap();
        assert_eq!(cfg.model_resource, "tiny.bin");
        assert_eq!(cfg.canvas_size, 280);
    }
}
