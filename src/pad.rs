//! The drawing pad: input events drive the rasterizer, then the bridge.

use serde::{Deserialize, Serialize};

use crate::inference::display::DisplayRegion;
use crate::inference::model::Classifier;
use crate::inference::{InferenceBridge, Readiness};
use crate::rendering::{InputTensor, Rasterizer, Surface};
use crate::{PadConfig, Result};

/// Pointer and touch input, in coordinates relative to the drawing region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    MouseDown { x: f64, y: f64 },
    MouseMove { x: f64, y: f64 },
    MouseUp,
    MouseLeave,
    TouchStart { x: f64, y: f64 },
    TouchMove { x: f64, y: f64 },
    TouchEnd,
    Clear,
}

impl InputEvent {
    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            InputEvent::TouchStart { .. } | InputEvent::TouchMove { .. } | InputEvent::TouchEnd
        )
    }
}

/// What the host should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    /// Suppress the host's default action (page scrolling for touch input).
    pub prevent_default: bool,
    /// The surface changed and should be redrawn.
    pub repaint: bool,
}

/// Rasterizer and inference bridge wired to input events.
///
/// Every handler runs to completion: paint, extract, predict, present.
/// Failures end up in the display region and never escape `handle`.
pub struct DrawingPad<C: Classifier> {
    config: PadConfig,
    raster: Rasterizer,
    bridge: InferenceBridge<C>,
    display: DisplayRegion,
}

impl<C: Classifier> DrawingPad<C> {
    pub fn new(config: PadConfig, model: C) -> Result<Self> {
        let raster = Rasterizer::new(&config)?;
        Ok(Self {
            config,
            raster,
            bridge: InferenceBridge::new(model),
            display: DisplayRegion::Empty,
        })
    }

    /// Load the configured model resource and predict once if it succeeded.
    ///
    /// A failure is logged and remembered by the gate; drawing keeps working.
    pub fn load_model(&mut self) -> Result<()> {
        let resource = self.config.model_resource.clone();
        self.bridge.load(&resource)?;
        self.predict();
        Ok(())
    }

    pub fn bridge(&self) -> &InferenceBridge<C> {
        &self.bridge
    }

    /// For hosts that complete the load elsewhere: see [`InferenceBridge::take_signal`].
    pub fn bridge_mut(&mut self) -> &mut InferenceBridge<C> {
        &mut self.bridge
    }

    /// Observe an externally completed load; predicts once when the model became ready.
    pub fn tick(&mut self) {
        if self.bridge.poll_ready() {
            self.predict();
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> EventOutcome {
        let mut outcome = EventOutcome {
            prevent_default: event.is_touch(),
            repaint: false,
        };
        // A load that completed since the last event opens the gate first.
        self.tick();

        match event {
            InputEvent::MouseDown { x, y } | InputEvent::TouchStart { x, y } => {
                self.raster.begin_stroke(x, y);
                outcome.repaint = true;
                self.predict();
            }
            InputEvent::MouseMove { x, y } | InputEvent::TouchMove { x, y } => {
                if self.raster.continue_stroke(x, y) {
                    outcome.repaint = true;
                    self.predict();
                }
            }
            InputEvent::MouseUp | InputEvent::TouchEnd => {
                self.raster.end_stroke();
                if self.config.predict_on_release {
                    self.predict();
                }
            }
            InputEvent::MouseLeave => self.raster.end_stroke(),
            InputEvent::Clear => {
                self.raster.clear();
                outcome.repaint = true;
                self.predict();
            }
        }
        outcome
    }

    fn predict(&mut self) {
        let tensor = self.raster.extract_tensor();
        if let Some(region) = self.bridge.refresh(&tensor) {
            self.display = region;
        }
    }

    pub fn display(&self) -> &DisplayRegion {
        &self.display
    }

    pub fn readiness(&self) -> &Readiness {
        self.bridge.readiness()
    }

    pub fn surface(&self) -> &Surface {
        self.raster.surface()
    }

    pub fn tensor(&self) -> InputTensor {
        self.raster.extract_tensor()
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.raster
    }

    pub fn config(&self) -> &PadConfig {
        &self.config
    }
}
