//! Hyperparameter configuration.
//!
//! [`Config`] is a plain struct with public fields and sensible defaults. It is
//! validated once, when an [`crate::Estimator`] is built or its parameters are
//! changed, so nothing inside the training loop can fail on a bad setting.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Init, Loss, Result};

/// Upper bound used by [`BatchSize::Auto`].
pub const AUTO_BATCH_SIZE: usize = 200;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Minibatch size policy.
pub enum BatchSize {
    /// `min(200, n_samples)`.
    #[default]
    Auto,
    /// A fixed size, clamped to `[1, n_samples]`.
    Fixed(usize),
}

impl BatchSize {
    /// Resolve the policy against a dataset of `n_samples` samples.
    pub fn resolve(self, n_samples: usize) -> usize {
        match self {
            BatchSize::Auto => AUTO_BATCH_SIZE.min(n_samples),
            BatchSize::Fixed(size) => size.min(n_samples).max(1),
        }
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::Auto => f.write_str("auto"),
            BatchSize::Fixed(size) => write!(f, "{size}"),
        }
    }
}

impl FromStr for BatchSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "auto" {
            return Ok(BatchSize::Auto);
        }
        s.parse().map(BatchSize::Fixed).map_err(|_| {
            Error::Configuration(format!("batch size must be \"auto\" or an integer, got {s:?}"))
        })
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Optimization algorithm. Only minibatch SGD with momentum is implemented.
pub enum Solver {
    #[default]
    Sgd,
}

impl Solver {
    pub fn name(self) -> &'static str {
        match self {
            Solver::Sgd => "sgd",
        }
    }
}

impl FromStr for Solver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sgd" => Ok(Solver::Sgd),
            other => Err(Error::Configuration(format!(
                "solver {other:?} is not supported: only stochastic gradient descent (\"sgd\") is implemented"
            ))),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Learning-rate schedule name. Accepted and reflected; training always uses
/// `learning_rate_init` unchanged.
pub enum LearningRate {
    #[default]
    Constant,
    InvScaling,
    Adaptive,
}

impl LearningRate {
    pub fn name(self) -> &'static str {
        match self {
            LearningRate::Constant => "constant",
            LearningRate::InvScaling => "invscaling",
            LearningRate::Adaptive => "adaptive",
        }
    }
}

impl FromStr for LearningRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "constant" => Ok(LearningRate::Constant),
            "invscaling" => Ok(LearningRate::InvScaling),
            "adaptive" => Ok(LearningRate::Adaptive),
            other => Err(Error::Configuration(format!(
                "learning rate schedule {other:?} is not recognized"
            ))),
        }
    }
}

/// Hyperparameters of one estimator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Width of each hidden layer, input side first. May be empty.
    pub hidden_layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    /// Ignored by regression and classification estimators, which fix it.
    pub output_activation: Activation,
    /// Ignored by regression and classification estimators, which fix it.
    pub loss: Loss,
    pub solver: Solver,
    /// L2 coefficient.
    pub alpha: f64,
    pub batch_size: BatchSize,
    pub learning_rate_init: f64,
    pub momentum: f64,
    pub max_iter: usize,
    pub shuffle: bool,
    pub random_state: Option<u64>,
    /// Keep the current weights and momentum across `fit` calls.
    pub warm_start: bool,
    pub weights_init: Init,
    pub weights_init_value: f64,
    /// Log per-epoch progress at `info` instead of `debug`.
    pub verbose: bool,

    // Accepted for interface compatibility; training does not read them.
    pub learning_rate: LearningRate,
    pub power_t: f64,
    pub tol: f64,
    pub nesterovs_momentum: bool,
    pub early_stopping: bool,
    pub validation_fraction: f64,
    pub n_iter_no_change: usize,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    pub max_fun: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![100],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Identity,
            loss: Loss::Squared,
            solver: Solver::Sgd,
            alpha: 1e-4,
            batch_size: BatchSize::Auto,
            learning_rate_init: 1e-3,
            momentum: 0.9,
            max_iter: 200,
            shuffle: true,
            random_state: None,
            warm_start: false,
            weights_init: Init::Normal,
            weights_init_value: 0.7,
            verbose: false,
            learning_rate: LearningRate::Constant,
            power_t: 0.5,
            tol: 1e-4,
            nesterovs_momentum: true,
            early_stopping: false,
            validation_fraction: 0.1,
            n_iter_no_change: 10,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
            max_fun: 15_000,
        }
    }
}

impl Config {
    /// Check every field training reads.
    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self.hidden_layer_sizes.iter().position(|&w| w == 0) {
            return Err(Error::Configuration(format!(
                "hidden layer {i} has width 0; all widths must be > 0"
            )));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(Error::Configuration(format!(
                "alpha must be finite and >= 0, got {}",
                self.alpha
            )));
        }
        if !(self.learning_rate_init.is_finite() && self.learning_rate_init > 0.0) {
            return Err(Error::Configuration(format!(
                "learning_rate_init must be finite and > 0, got {}",
                self.learning_rate_init
            )));
        }
        if !(self.momentum.is_finite() && (0.0..1.0).contains(&self.momentum)) {
            return Err(Error::Configuration(format!(
                "momentum must be finite and in [0,1), got {}",
                self.momentum
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::Configuration("max_iter must be > 0".to_owned()));
        }
        if !(self.weights_init_value.is_finite() && self.weights_init_value >= 0.0) {
            return Err(Error::Configuration(format!(
                "weights_init_value must be finite and >= 0, got {}",
                self.weights_init_value
            )));
        }
        Ok(())
    }
}
