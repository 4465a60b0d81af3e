//! Loss functions.
//!
//! Losses are element-wise over `(targets, predictions)` pairs. The loss of a
//! sample is the sum over its output columns; the loss reported for a dataset
//! is the mean of the per-sample losses.
//!
//! The derivatives are taken with respect to the prediction and feed straight
//! into the output layer's error signal during backprop.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Matrix, Result};

/// Clamp applied to predicted probabilities before a logarithm or reciprocal.
pub const LOG_LOSS_EPS: f64 = 1e-6;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Supported loss functions.
pub enum Loss {
    /// `½ (t - p)²`.
    Squared,
    /// Binary log-loss for `t ∈ {0, 1}` and `p ∈ [0, 1]`, clamped by [`LOG_LOSS_EPS`].
    LogLoss,
}

impl Loss {
    pub const ALL: [Loss; 2] = [Loss::Squared, Loss::LogLoss];

    /// Registry name of this loss.
    pub fn name(self) -> &'static str {
        match self {
            Loss::Squared => "squared",
            Loss::LogLoss => "log_loss",
        }
    }

    /// Loss for a single `(target, prediction)` pair.
    #[inline]
    pub fn value(self, target: f64, pred: f64) -> f64 {
        match self {
            Loss::Squared => {
                let diff = target - pred;
                0.5 * diff * diff
            }
            Loss::LogLoss => {
                if target > 0.5 {
                    -pred.max(LOG_LOSS_EPS).ln()
                } else {
                    -(1.0 - pred).max(LOG_LOSS_EPS).ln()
                }
            }
        }
    }

    /// Derivative of [`Loss::value`] with respect to `pred`.
    #[inline]
    pub fn derivative(self, target: f64, pred: f64) -> f64 {
        match self {
            Loss::Squared => pred - target,
            Loss::LogLoss => {
                if target > 0.5 {
                    -1.0 / pred.max(LOG_LOSS_EPS)
                } else {
                    1.0 / (1.0 - pred).max(LOG_LOSS_EPS)
                }
            }
        }
    }

    /// Element-wise loss values; shape of `targets`.
    pub fn values(self, targets: &Matrix, preds: &Matrix) -> Matrix {
        targets.zip_map(preds, |t, p| self.value(t, p))
    }

    /// Element-wise loss derivatives; shape of `targets`.
    pub fn derivative_matrix(self, targets: &Matrix, preds: &Matrix) -> Matrix {
        targets.zip_map(preds, |t, p| self.derivative(t, p))
    }

    /// Per-sample loss: the sum over output columns of each row.
    pub fn sample_losses(self, targets: &Matrix, preds: &Matrix) -> Vec<f64> {
        debug_assert_eq!(targets.shape(), preds.shape());
        targets
            .iter_rows()
            .zip(preds.iter_rows())
            .map(|(t, p)| t.iter().zip(p).map(|(&t, &p)| self.value(t, p)).sum())
            .collect()
    }

    /// Mean per-sample loss over a batch.
    pub fn mean(self, targets: &Matrix, preds: &Matrix) -> f64 {
        if targets.rows() == 0 {
            return 0.0;
        }
        let losses = self.sample_losses(targets, preds);
        losses.iter().sum::<f64>() / losses.len() as f64
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Loss {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Loss::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| Error::Configuration(format!("loss function {s:?} is not implemented")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_loss_and_gradient() {
        assert_eq!(Loss::Squared.value(1.0, 1.0), 0.0);
        assert!((Loss::Squared.value(2.0, 1.0) - 0.5).abs() < 1e-12);
        assert_eq!(Loss::Squared.derivative(2.0, 1.0), -1.0);
        assert_eq!(Loss::Squared.derivative(1.0, 3.0), 2.0);
    }

    #[test]
    fn log_loss_is_clamped_at_the_extremes() {
        let worst = -LOG_LOSS_EPS.ln();
        assert!((Loss::LogLoss.value(1.0, 0.0) - worst).abs() < 1e-12);
        assert!((Loss::LogLoss.value(0.0, 1.0) - worst).abs() < 1e-12);
        assert_eq!(Loss::LogLoss.value(1.0, 1.0), 0.0);
        assert_eq!(Loss::LogLoss.value(0.0, 0.0), 0.0);

        assert!((Loss::LogLoss.derivative(1.0, 0.0) + 1e6).abs() < 1e-6);
        assert!((Loss::LogLoss.derivative(0.0, 1.0) - 1e6).abs() < 1e-6);
        assert_eq!(Loss::LogLoss.derivative(1.0, 1.0), -1.0);
        assert_eq!(Loss::LogLoss.derivative(0.0, 0.0), 1.0);
    }

    #[test]
    fn log_loss_matches_cross_entropy_inside_the_clamp() {
        let p = 0.8_f64;
        assert!((Loss::LogLoss.value(1.0, p) + p.ln()).abs() < 1e-12);
        assert!((Loss::LogLoss.value(0.0, p) + (1.0 - p).ln()).abs() < 1e-12);
        assert!((Loss::LogLoss.derivative(0.0, p) - 1.0 / (1.0 - p)).abs() < 1e-9);
    }

    #[test]
    fn per_sample_losses_sum_over_outputs() {
        let t = Matrix::from_rows(&[[0.0, 1.0], [2.0, 2.0]]).unwrap();
        let p = Matrix::from_rows(&[[1.0, 1.0], [0.0, 4.0]]).unwrap();
        assert_eq!(Loss::Squared.sample_losses(&t, &p), vec![0.5, 4.0]);
        assert!((Loss::Squared.mean(&t, &p) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn unknown_loss_name_is_a_configuration_error() {
        assert_eq!("log_loss".parse::<Loss>().unwrap(), Loss::LogLoss);
        assert!(matches!(
            "hinge".parse::<Loss>(),
            Err(Error::Configuration(_))
        ));
    }
}
