//! Per-epoch reporting hook.
//!
//! The training loop knows nothing about report files. A caller that wants a
//! training curve registers a [`Reporter`]; at the end of every epoch, in order
//! and on the training thread, its [`EpochHook`] receives an [`EpochReport`].

use std::fmt;

use crate::{Error, Matrix, Metric, Result};

/// Values handed to the hook once per epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch index within the current `fit` call.
    pub epoch: usize,
    /// Mean per-sample loss on the training set after the epoch.
    pub train_loss: f64,
    /// Mean per-sample loss on the validation set, when one is configured.
    pub validation_loss: Option<f64>,
    /// Validation [`Metric`] score, when a validation set is configured.
    pub validation_metric: Option<f64>,
}

/// Receives one [`EpochReport`] per epoch.
pub trait EpochHook: Send {
    fn on_epoch(&mut self, report: &EpochReport);
}

impl<F> EpochHook for F
where
    F: FnMut(&EpochReport) + Send,
{
    fn on_epoch(&mut self, report: &EpochReport) {
        self(report)
    }
}

pub(crate) struct Validation {
    pub(crate) inputs: Matrix,
    pub(crate) targets: Matrix,
    pub(crate) metric: Metric,
}

/// A labelled hook plus an optional validation set.
pub struct Reporter {
    label: String,
    validation: Option<Validation>,
    hook: Box<dyn EpochHook>,
}

impl Reporter {
    pub fn new(label: impl Into<String>, hook: impl EpochHook + 'static) -> Self {
        Self {
            label: label.into(),
            validation: None,
            hook: Box::new(hook),
        }
    }

    /// Score `inputs`/`targets` with `metric` after every epoch.
    pub fn with_validation(
        mut self,
        inputs: Matrix,
        targets: Matrix,
        metric: Metric,
    ) -> Result<Self> {
        if inputs.rows() != targets.rows() {
            return Err(Error::DimensionMismatch {
                inputs: inputs.rows(),
                targets: targets.rows(),
            });
        }
        if inputs.is_empty() {
            return Err(Error::InvalidData(
                "validation set must not be empty".to_owned(),
            ));
        }
        self.validation = Some(Validation {
            inputs,
            targets,
            metric,
        });
        Ok(self)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn metric(&self) -> Option<Metric> {
        self.validation.as_ref().map(|v| v.metric)
    }

    #[inline]
    pub(crate) fn validation(&self) -> Option<&Validation> {
        self.validation.as_ref()
    }

    #[inline]
    pub(crate) fn emit(&mut self, report: &EpochReport) {
        self.hook.on_epoch(report);
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("label", &self.label)
            .field("metric", &self.metric())
            .finish_non_exhaustive()
    }
}
