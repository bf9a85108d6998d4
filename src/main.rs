use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use digitpad::inference::worker;
use digitpad::{Classifier, DrawingPad, InputEvent, InputTensor, PadConfig, PredictionChart, ProcessModel, UniformModel, GRID_SIZE};

#[derive(Parser)]
#[command(name = "digitpad", version, about = "Digit drawing pad: replay strokes and classify them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a JSON array of input events and show the grid and predictions
    Replay {
        /// File containing the events
        events: PathBuf,
        /// Pad configuration (JSON); defaults apply to missing fields
        #[arg(long)]
        config: Option<PathBuf>,
        /// Run the classifier as a child process speaking the worker protocol
        #[arg(long)]
        worker_cmd: Option<String>,
        /// Write the predictions markup fragment here
        #[arg(long)]
        html: Option<PathBuf>,
        /// Skip printing the grid
        #[arg(long)]
        no_ascii: bool,
    },
    /// Serve the worker protocol on stdin/stdout with the uniform classifier
    Worker,
}

const SHADES: &[u8] = b" .:-=+*#%@";

fn ascii_grid(tensor: &InputTensor) -> String {
    let mut out = String::with_capacity(GRID_SIZE * (GRID_SIZE + 1));
    for gy in 0..GRID_SIZE {
        for gx in 0..GRID_SIZE {
            let v = tensor.at(gx, gy);
            let idx = ((v * (SHADES.len() - 1) as f64).round() as usize).min(SHADES.len() - 1);
            out.push(SHADES[idx] as char);
        }
        out.push('\n');
    }
    out
}

/// One text bar per class; the most likely digit is marked with `<`.
fn chart_lines(chart: &PredictionChart) -> String {
    let mut out = String::new();
    for row in &chart.rows {
        let bar = "#".repeat((row.bar_width / 2.0).round() as usize);
        let mark = if row.digit == chart.best { " <" } else { "" };
        out.push_str(&format!("{}: {:<50} {}{}\n", row.digit, bar, row.percentage_label(), mark));
    }
    out
}

fn replay(
    events: PathBuf,
    config: Option<PathBuf>,
    worker_cmd: Option<String>,
    html: Option<PathBuf>,
    no_ascii: bool,
) -> Result<()> {
    let config: PadConfig = match config {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PadConfig::default(),
    };
    let raw = fs::read_to_string(&events).with_context(|| format!("reading events {}", events.display()))?;
    let events: Vec<InputEvent> = serde_json::from_str(&raw).context("parsing events")?;

    let model: Box<dyn Classifier> = match worker_cmd {
        Some(cmd) => Box::new(ProcessModel::from_command_line(&cmd).context("starting worker")?),
        None => Box::new(UniformModel::new()),
    };

    let mut pad = DrawingPad::new(config, model)?;
    // A failed load is logged by the gate; drawing still works and the display stays empty.
    let _ = pad.load_model();

    for event in events {
        pad.handle(event);
    }

    if !no_ascii {
        print!("{}", ascii_grid(&pad.tensor()));
    }
    let markup = pad.display().to_html();
    match pad.display() {
        digitpad::DisplayRegion::Empty => println!("(no predictions)"),
        digitpad::DisplayRegion::Error(msg) => println!("{}", msg),
        digitpad::DisplayRegion::Chart(chart) => print!("{}", chart_lines(chart)),
    }

    if let Some(path) = html {
        fs::write(&path, markup).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            events,
            config,
            worker_cmd,
            html,
            no_ascii,
        } => replay(events, config, worker_cmd, html, no_ascii),
        Command::Worker => {
            let mut model = UniformModel::new();
            let stdin = io::stdin();
            let stdout = io::stdout();
            worker::serve(&mut model, stdin.lock(), stdout.lock()).context("worker failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_grid_shades_extremes() {
        let blank = ascii_grid(&InputTensor::zeros());
        assert_eq!(blank.lines().count(), GRID_SIZE);
        assert!(blank.chars().all(|c| c == ' ' || c == '\n'));

        let full = InputTensor::try_from(vec![1.0; 784]).unwrap();
        assert!(ascii_grid(&full).starts_with("@@@@"));
    }

    #[test]
    fn chart_lines_mark_the_top_class() {
        let mut p = [0.05; 10];
        p[6] = 0.55;
        let text = chart_lines(&digitpad::format(&digitpad::Prediction { probabilities: p }));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert!(lines[6].starts_with("6: ") && lines[6].ends_with("55.0% <"));
        assert_eq!(text.matches('<').count(), 1);
    }
}
