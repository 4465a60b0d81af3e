//! Task descriptors.
//!
//! A [`Task`] fixes what the last layer computes and how raw network output is
//! turned into predictions. The training loop itself is task-agnostic.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Loss, Matrix, Result};

/// Decision boundary for binary classification.
pub const CLASSIFICATION_THRESHOLD: f64 = 0.5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    /// Output activation and loss are taken from the configuration.
    #[default]
    Custom,
    /// `identity` output, `squared` loss.
    Regression,
    /// Binary classification: `zero_one_tanh` output, `log_loss`, labels in `{0, 1}`.
    Classification,
}

impl Task {
    /// The output activation this task forces, if any.
    pub fn output_activation(self) -> Option<Activation> {
        match self {
            Task::Custom => None,
            Task::Regression => Some(Activation::Identity),
            Task::Classification => Some(Activation::ZeroOneTanh),
        }
    }

    /// The loss this task forces, if any.
    pub fn loss(self) -> Option<Loss> {
        match self {
            Task::Custom => None,
            Task::Regression => Some(Loss::Squared),
            Task::Classification => Some(Loss::LogLoss),
        }
    }

    /// Validate training targets for this task.
    pub fn validate_targets(self, targets: &Matrix) -> Result<()> {
        if self != Task::Classification {
            return Ok(());
        }
        if targets.cols() != 1 {
            return Err(Error::InvalidLabel(format!(
                "multilabel output is not supported for classification, got {} target columns",
                targets.cols()
            )));
        }
        if let Some((i, label)) = targets
            .as_slice()
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != 0.0 && v != 1.0)
        {
            return Err(Error::InvalidLabel(format!(
                "labels for classification must be either 0 or 1, sample {i} has {label}"
            )));
        }
        Ok(())
    }

    /// Turn raw network output into predictions.
    pub fn postprocess(self, raw: Matrix) -> Matrix {
        match self {
            Task::Custom | Task::Regression => raw,
            Task::Classification => raw.map(|p| {
                if p >= CLASSIFICATION_THRESHOLD {
                    1.0
                } else {
                    0.0
                }
            }),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Task::Custom => "custom",
            Task::Regression => "regression",
            Task::Classification => "classification",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_rejects_non_binary_labels() {
        let ok = Matrix::column(&[0.0, 1.0, 1.0]);
        assert!(Task::Classification.validate_targets(&ok).is_ok());

        let two = Matrix::column(&[0.0, 2.0]);
        assert!(matches!(
            Task::Classification.validate_targets(&two),
            Err(Error::InvalidLabel(_))
        ));

        let wide = Matrix::from_rows(&[[0.0, 1.0]]).unwrap();
        assert!(matches!(
            Task::Classification.validate_targets(&wide),
            Err(Error::InvalidLabel(_))
        ));

        // Other tasks accept anything.
        assert!(Task::Regression.validate_targets(&wide).is_ok());
    }

    #[test]
    fn classification_thresholds_at_one_half() {
        let raw = Matrix::column(&[0.1, 0.5, 0.49999, 0.93]);
        let out = Task::Classification.postprocess(raw.clone());
        assert_eq!(out.as_slice(), &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(Task::Regression.postprocess(raw.clone()), raw);
    }
}
