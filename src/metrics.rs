//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop). They
//! score a validation set at the end of each epoch for the reporting hook.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Matrix, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Supported evaluation metrics. Lower is better for both.
pub enum Metric {
    /// Fraction of samples whose prediction differs from the target.
    ///
    /// Compared against post-processed (thresholded) predictions.
    Classification,
    /// Mean Euclidean distance between target and prediction rows.
    Euclidean,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Classification => "classification",
            Metric::Euclidean => "euclidean",
        }
    }

    /// Score `preds` against `targets`. Both must have the same shape.
    pub fn score(self, targets: &Matrix, preds: &Matrix) -> f64 {
        debug_assert_eq!(targets.shape(), preds.shape());
        match self {
            Metric::Classification => classification_error(targets, preds),
            Metric::Euclidean => mean_euclidean_error(targets, preds),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "classification" => Ok(Metric::Classification),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(Error::Configuration(format!(
                "metric {other:?} is not implemented"
            ))),
        }
    }
}

/// Fraction of mismatching elements.
pub fn classification_error(targets: &Matrix, preds: &Matrix) -> f64 {
    if targets.rows() == 0 {
        return 0.0;
    }
    let wrong = targets
        .as_slice()
        .iter()
        .zip(preds.as_slice())
        .filter(|(t, p)| t != p)
        .count();
    wrong as f64 / targets.rows() as f64
}

/// Mean over samples of `‖t - p‖₂`.
pub fn mean_euclidean_error(targets: &Matrix, preds: &Matrix) -> f64 {
    if targets.rows() == 0 {
        return 0.0;
    }
    let total: f64 = targets
        .iter_rows()
        .zip(preds.iter_rows())
        .map(|(t, p)| {
            t.iter()
                .zip(p)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt()
        })
        .sum();
    total / targets.rows() as f64
}
