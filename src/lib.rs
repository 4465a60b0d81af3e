//! A multilayer-perceptron training engine.
//!
//! `mlp-sgd` fits dense feed-forward networks with minibatch stochastic
//! gradient descent, momentum and L2 weight decay. Gradients are computed by
//! hand-coded backpropagation over a small row-major `f64` matrix type.
//!
//! # Layout
//!
//! - [`Matrix`]: row-major `f64` storage, one sample per row.
//! - [`Activation`], [`Loss`], [`Init`]: closed function registries.
//! - [`Mlp`]: the weight store. Each weight matrix has shape
//!   `(in_dim + 1, out_dim)` with the bias row last, and
//!   `weights[i].cols() + 1 == weights[i + 1].rows()` always holds.
//! - [`MomentumState`]: the optimizer state, owned outside the network.
//! - [`Estimator`]: the facade. A [`Task`] fixes the output activation, the
//!   loss and prediction post-processing.
//!
//! # Errors
//!
//! Everything that can be checked is checked before the first epoch runs and
//! reported as an [`Error`]. Numerical saturation in the log loss is clamped,
//! never an error.
//!
//! # Logging
//!
//! The crate logs through `tracing` and never installs a subscriber.
//! Training setup and per-epoch losses go to `debug` (or `info` with
//! `Config::verbose`); per-layer shapes go to `trace`.
//!
//! # Quick start
//!
//! ```rust
//! use mlp_sgd::{Activation, BatchSize, Config, Estimator, Matrix};
//!
//! # fn main() -> mlp_sgd::Result<()> {
//! let x = Matrix::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
//! let y = Matrix::column(&[0.0, 1.0, 1.0, 0.0]);
//!
//! let mut clf = Estimator::classifier(Config {
//!     hidden_layer_sizes: vec![8],
//!     hidden_activation: Activation::Tanh,
//!     learning_rate_init: 0.1,
//!     batch_size: BatchSize::Fixed(4),
//!     max_iter: 50,
//!     random_state: Some(0),
//!     ..Config::default()
//! })?;
//!
//! let report = clf.fit(&x, &y)?;
//! assert_eq!(report.n_iter, 50);
//!
//! let labels = clf.predict(&x)?;
//! assert_eq!(labels.shape(), (4, 1));
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod error;
pub mod estimator;
pub mod layer;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod mlp;
pub mod optim;
pub mod params;
pub mod report;
pub mod task;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use config::{AUTO_BATCH_SIZE, BatchSize, Config, LearningRate, Solver};
pub use error::{Error, Result};
pub use estimator::Estimator;
pub use layer::{Init, Layer};
pub use loss::Loss;
pub use matrix::Matrix;
pub use metrics::Metric;
pub use mlp::{ForwardCache, Gradients, Mlp};
pub use optim::{MomentumState, StepParams};
pub use params::ParamValue;
pub use report::{EpochHook, EpochReport, Reporter};
pub use task::Task;
pub use train::FitReport;
