//! Prediction vector and its bar-chart presentation

use serde::Serialize;

use crate::{Error, Result, CLASS_COUNT};

/// Narrowest bar drawn, in percent, so empty classes stay visible.
pub const MIN_BAR_WIDTH: f64 = 2.0;

/// Message shown in place of the chart when a prediction fails.
pub const ERROR_MESSAGE: &str = "Error making prediction";

/// One probability per digit class, index = digit. Not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub probabilities: [f64; CLASS_COUNT],
}

impl Prediction {
    /// Digit with the highest probability (first one on ties).
    pub fn best(&self) -> usize {
        let mut best = 0;
        for (digit, p) in self.probabilities.iter().enumerate() {
            if *p > self.probabilities[best] {
                best = digit;
            }
        }
        best
    }
}

impl TryFrom<Vec<f64>> for Prediction {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        let probabilities: [f64; CLASS_COUNT] = values
            .try_into()
            .map_err(|v: Vec<f64>| Error::Shape { expected: CLASS_COUNT, actual: v.len() })?;
        Ok(Prediction { probabilities })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub digit: u8,
    /// Probability x 100, rounded to one decimal.
    pub percentage: f64,
    /// Bar width in percent, never below [`MIN_BAR_WIDTH`].
    pub bar_width: f64,
}

impl PredictionRow {
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

/// Display-ready chart, rows in class order 0-9.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionChart {
    pub rows: Vec<PredictionRow>,
    /// Most likely digit.
    pub best: u8,
}

/// Turn a prediction into chart rows without reordering the classes.
pub fn format(prediction: &Prediction) -> PredictionChart {
    let rows = prediction
        .probabilities
        .iter()
        .enumerate()
        .map(|(digit, p)| {
            let percentage = (p * 1000.0).round() / 10.0;
            PredictionRow {
                digit: digit as u8,
                percentage,
                bar_width: percentage.max(MIN_BAR_WIDTH),
            }
        })
        .collect();
    PredictionChart {
        rows,
        best: prediction.best() as u8,
    }
}

impl PredictionChart {
    /// Markup fragment: a heading followed by one label/bar/percentage row per class.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<h2>Predictions:</h2><div class=\"predictions-container\">");
        for row in &self.rows {
            html.push_str(&format!(
                "<div class=\"prediction-row\"><span class=\"digit-label\">{}:</span>\
                 <div class=\"prediction-bar\" style=\"width: {}%\"></div>\
                 <span class=\"percentage-label\">{}</span></div>",
                row.digit,
                row.bar_width,
                row.percentage_label()
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// What the predictions area currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayRegion {
    /// Nothing yet; the model has not produced a prediction.
    #[default]
    Empty,
    Chart(PredictionChart),
    Error(String),
}

impl DisplayRegion {
    pub fn to_html(&self) -> String {
        match self {
            DisplayRegion::Empty => String::new(),
            DisplayRegion::Chart(chart) => chart.to_html(),
            DisplayRegion::Error(msg) => msg.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DisplayRegion::Error(_))
    }
}
