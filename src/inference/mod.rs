//! Inference bridge: the readiness gate and guarded calls into the classifier
//!
//! The classifier has to finish a one-time load before predictions are valid.
//! Whoever performs that load reports the outcome through a [`LoadSignal`];
//! the bridge observes it through its [`ReadinessGate`] on every call and
//! refuses to predict until the gate has opened.

pub mod display;
pub mod model;
pub mod process;
pub mod worker;

use log::{error, info, warn};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::rendering::InputTensor;
use crate::{Error, Result, TENSOR_LEN};
use display::{DisplayRegion, Prediction, ERROR_MESSAGE};
use model::Classifier;

type LoadOutcome = std::result::Result<(), String>;

/// State of the one-time model load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

/// One-shot completion callback for the model load.
#[derive(Debug)]
pub struct LoadSignal {
    tx: oneshot::Sender<LoadOutcome>,
}

impl LoadSignal {
    pub fn complete<E: std::fmt::Display>(self, outcome: std::result::Result<(), E>) {
        // The gate may already be gone; nothing to report to in that case.
        let _ = self.tx.send(outcome.map_err(|e| e.to_string()));
    }
}

/// Settles exactly once, from `Pending` to `Ready` or `Failed`.
///
/// Dropping the [`LoadSignal`] without completing it counts as a failure.
#[derive(Debug)]
pub struct ReadinessGate {
    state: Readiness,
    rx: Option<oneshot::Receiver<LoadOutcome>>,
}

impl ReadinessGate {
    pub fn pending() -> (Self, LoadSignal) {
        let (tx, rx) = oneshot::channel();
        let gate = Self {
            state: Readiness::Pending,
            rx: Some(rx),
        };
        (gate, LoadSignal { tx })
    }

    pub fn state(&self) -> &Readiness {
        &self.state
    }

    /// Check for a completed load without blocking.
    ///
    /// Returns `true` only on the call that settles the gate.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = self.rx.as_mut() else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err("load signal dropped before completion".to_string()),
        };
        self.rx = None;
        self.settle(outcome);
        true
    }

    /// Wait for the load to complete.
    pub async fn wait(&mut self) -> &Readiness {
        if let Some(rx) = self.rx.as_mut() {
            let outcome = rx
                .await
                .unwrap_or_else(|_| Err("load signal dropped before completion".to_string()));
            self.rx = None;
            self.settle(outcome);
        }
        &self.state
    }

    fn settle(&mut self, outcome: LoadOutcome) {
        self.state = match outcome {
            Ok(()) => {
                info!("model loaded successfully");
                Readiness::Ready
            }
            Err(e) => {
                error!("failed to load model: {}", e);
                Readiness::Failed(e)
            }
        };
    }
}

/// Mediates between rasterized tensors and the classifier.
pub struct InferenceBridge<C: Classifier> {
    model: C,
    gate: ReadinessGate,
    signal: Option<LoadSignal>,
}

impl<C: Classifier> InferenceBridge<C> {
    pub fn new(model: C) -> Self {
        let (gate, signal) = ReadinessGate::pending();
        Self {
            model,
            gate,
            signal: Some(signal),
        }
    }

    /// Hand the completion callback to a host that loads the model itself.
    ///
    /// After this, [`InferenceBridge::load`] is no longer available.
    pub fn take_signal(&mut self) -> Option<LoadSignal> {
        self.signal.take()
    }

    /// Load the classifier synchronously and settle the gate with the outcome.
    pub fn load(&mut self, resource: &str) -> Result<()> {
        let signal = self
            .signal
            .take()
            .ok_or_else(|| Error::ModelLoad("model load already started".into()))?;
        let outcome = self.model.load(resource);
        signal.complete(outcome.as_ref().map(|_| ()));
        self.gate.poll();
        outcome
    }

    pub fn readiness(&self) -> &Readiness {
        self.gate.state()
    }

    pub fn is_ready(&self) -> bool {
        *self.gate.state() == Readiness::Ready
    }

    /// Returns `true` exactly once: on the poll that finds the load succeeded.
    pub fn poll_ready(&mut self) -> bool {
        self.gate.poll() && self.is_ready()
    }

    pub async fn wait_ready(&mut self) -> &Readiness {
        self.gate.wait().await
    }

    /// Run one prediction. Every classifier buffer is released before returning.
    pub fn predict(&mut self, tensor: &InputTensor) -> Result<Prediction> {
        self.gate.poll();
        if !self.is_ready() {
            return Err(Error::NotReady);
        }
        if tensor.len() != TENSOR_LEN {
            return Err(Error::Shape { expected: TENSOR_LEN, actual: tensor.len() });
        }
        let output = model::run_prediction(&mut self.model, tensor.as_slice())?;
        Prediction::try_from(output)
    }

    /// Predict and present the result, containing any failure.
    ///
    /// Returns `None` while the gate is closed so the display is left alone.
    pub fn refresh(&mut self, tensor: &InputTensor) -> Option<DisplayRegion> {
        self.gate.poll();
        if !self.is_ready() {
            return None;
        }
        match self.predict(tensor) {
            Ok(prediction) => Some(DisplayRegion::Chart(display::format(&prediction))),
            Err(e) => {
                warn!("Prediction error: {}", e);
                Some(DisplayRegion::Error(ERROR_MESSAGE.to_string()))
            }
        }
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut C {
        &mut self.model
    }
}
