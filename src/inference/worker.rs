//! Newline-delimited JSON protocol for running a classifier in another process
//!
//! Each request line gets exactly one reply line, in order.

use std::io::{BufRead, Write};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::inference::model::{run_prediction, Classifier};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerRequest {
    Load { resource: String },
    Predict { input: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkerReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerReply {
    pub fn success(output: Option<Vec<f64>>) -> Self {
        Self { ok: true, output, error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, output: None, error: Some(error.into()) }
    }
}

fn handle<C: Classifier + ?Sized>(model: &mut C, line: &str) -> WorkerReply {
    let request = match serde_json::from_str::<WorkerRequest>(line) {
        Ok(r) => r,
        Err(e) => {
            debug!("malformed worker request: {}", e);
            return WorkerReply::failure(format!("malformed request: {}", e));
        }
    };
    let outcome = match request {
        WorkerRequest::Load { resource } => model.load(&resource).map(|_| None),
        WorkerRequest::Predict { input } => run_prediction(model, &input).map(Some),
    };
    match outcome {
        Ok(output) => WorkerReply::success(output),
        Err(e) => WorkerReply::failure(e.to_string()),
    }
}

/// Serve requests from `input` until EOF, writing one reply per request line.
pub fn serve<C, R, W>(model: &mut C, input: R, mut output: W) -> Result<()>
where
    C: Classifier + ?Sized,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle(model, &line);
        writeln!(output, "{}", serde_json::to_string(&reply)?)?;
        output.flush()?;
    }
    Ok(())
}
