use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, debug_span, info};

use crate::optim::StepParams;
use crate::report::EpochReport;
use crate::{Activation, Error, Estimator, Loss, Matrix, Metric, Mlp, MomentumState, Result};

/// Derived model state, recomputed by every `fit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    /// Epochs actually run.
    pub n_iter: usize,
    /// Mean per-sample training loss after the last epoch.
    pub loss: f64,
    /// Number of hidden layers.
    pub n_layers: usize,
    /// Number of output units.
    pub n_outputs: usize,
}

/// Everything one epoch needs besides the data and the mutable state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpochSettings {
    pub(crate) hidden: Activation,
    pub(crate) output: Activation,
    pub(crate) loss: Loss,
    pub(crate) batch_size: usize,
    pub(crate) shuffle: bool,
    pub(crate) step: StepParams,
}

/// Contiguous minibatch ranges covering `0..n_samples`; the last one may be short.
pub fn batch_ranges(n_samples: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..n_samples)
        .step_by(batch_size)
        .map(move |start| start..(start + batch_size).min(n_samples))
}

/// One pass of minibatch updates over `(inputs, targets)`.
pub(crate) fn run_epoch<R: Rng + ?Sized>(
    mlp: &mut Mlp,
    state: &mut MomentumState,
    inputs: &Matrix,
    targets: &Matrix,
    settings: &EpochSettings,
    rng: &mut R,
) -> Result<()> {
    let shuffled;
    let (inputs, targets) = if settings.shuffle {
        let mut order: Vec<usize> = (0..inputs.rows()).collect();
        order.shuffle(rng);
        shuffled = (inputs.select_rows(&order), targets.select_rows(&order));
        (&shuffled.0, &shuffled.1)
    } else {
        (inputs, targets)
    };

    for range in batch_ranges(inputs.rows(), settings.batch_size) {
        let x = inputs.slice_rows(range.clone());
        let y = targets.slice_rows(range);

        let cache = mlp.forward(&x, settings.hidden, settings.output)?;
        let grads = mlp.backward(&cache, &y, settings.hidden, settings.output, settings.loss)?;
        state.step(mlp, &grads, settings.step);
    }
    Ok(())
}

impl Estimator {
    /// Train on `inputs` (`n_samples x n_features`) and `targets`
    /// (`n_samples x n_outputs`) for exactly `max_iter` epochs.
    ///
    /// Weights and momentum are regenerated unless `warm_start` is set and
    /// weights already exist. All validation happens before the first epoch.
    pub fn fit(&mut self, inputs: &Matrix, targets: &Matrix) -> Result<FitReport> {
        self.check_training_data(inputs, targets)?;

        let cfg = &self.config;
        let batch_size = cfg.batch_size.resolve(inputs.rows());
        let settings = EpochSettings {
            hidden: cfg.hidden_activation,
            output: cfg.output_activation,
            loss: cfg.loss,
            batch_size,
            shuffle: cfg.shuffle,
            step: StepParams {
                lr: cfg.learning_rate_init,
                momentum: cfg.momentum,
                alpha: cfg.alpha,
                // The decay term always uses the configured size, short last batch included.
                batch_fraction: batch_size as f64 / inputs.rows() as f64,
            },
        };
        settings.step.validate()?;

        let max_iter = cfg.max_iter;
        let verbose = cfg.verbose;
        let task = self.task;

        let reuse = cfg.warm_start && self.mlp.is_some();
        if let Some(mlp) = self.mlp.as_ref().filter(|_| reuse) {
            check_network_fits(mlp.input_dim(), mlp.output_dim(), inputs, targets)?;
        }
        if let Some(v) = self.reporter.as_ref().and_then(|r| r.validation()) {
            check_network_fits(inputs.cols(), targets.cols(), &v.inputs, &v.targets)?;
        }

        if !reuse {
            if let Some(seed) = cfg.random_state {
                self.rng = StdRng::seed_from_u64(seed);
            }
            let mlp = Mlp::new_with_rng(
                inputs.cols(),
                &cfg.hidden_layer_sizes,
                targets.cols(),
                cfg.weights_init,
                cfg.weights_init_value,
                &mut self.rng,
            )?;
            self.mlp = Some(mlp);
            self.momentum = None;
        }

        let Some(mlp) = self.mlp.as_mut() else {
            return Err(Error::NotFitted);
        };
        let state = self.momentum.get_or_insert_with(|| MomentumState::new(mlp));

        let label = self.reporter.as_ref().map(|r| r.label().to_owned());
        let span = debug_span!("fit", %task, label = label.as_deref());
        let _enter = span.enter();
        debug!(
            n_samples = inputs.rows(),
            batch_size = settings.batch_size,
            n_batches = inputs.rows().div_ceil(settings.batch_size),
            max_iter,
            "starting training"
        );

        let mut train_loss = f64::NAN;
        for epoch in 0..max_iter {
            run_epoch(mlp, state, inputs, targets, &settings, &mut self.rng)?;

            let preds = mlp.predict(inputs, settings.hidden, settings.output)?;
            train_loss = settings.loss.mean(targets, &preds);

            let (validation_loss, validation_metric) =
                match self.reporter.as_ref().and_then(|r| r.validation()) {
                    Some(v) => {
                        let raw = mlp.predict(&v.inputs, settings.hidden, settings.output)?;
                        let loss = settings.loss.mean(&v.targets, &raw);
                        let preds = match v.metric {
                            Metric::Classification => task.postprocess(raw),
                            Metric::Euclidean => raw,
                        };
                        (Some(loss), Some(v.metric.score(&v.targets, &preds)))
                    }
                    None => (None, None),
                };

            if verbose {
                info!(epoch, train_loss, ?validation_loss, ?validation_metric, "epoch finished");
            } else {
                debug!(epoch, train_loss, ?validation_loss, ?validation_metric, "epoch finished");
            }

            if let Some(reporter) = self.reporter.as_mut() {
                reporter.emit(&EpochReport {
                    epoch,
                    train_loss,
                    validation_loss,
                    validation_metric,
                });
            }
        }

        let report = FitReport {
            n_iter: max_iter,
            loss: train_loss,
            n_layers: mlp.num_layers() - 1,
            n_outputs: mlp.output_dim(),
        };
        self.last_fit = Some(report);
        Ok(report)
    }

    /// [`Estimator::fit`] with a flat target vector, reshaped to one column.
    pub fn fit_column(&mut self, inputs: &Matrix, targets: &[f64]) -> Result<FitReport> {
        self.fit(inputs, &Matrix::column(targets))
    }

    fn check_training_data(&self, inputs: &Matrix, targets: &Matrix) -> Result<()> {
        if inputs.rows() != targets.rows() {
            return Err(Error::DimensionMismatch {
                inputs: inputs.rows(),
                targets: targets.rows(),
            });
        }
        if inputs.rows() == 0 {
            return Err(Error::InvalidData(
                "training set must not be empty".to_owned(),
            ));
        }
        if inputs.cols() == 0 || targets.cols() == 0 {
            return Err(Error::InvalidData(format!(
                "training set needs at least one feature and one output, got {} and {}",
                inputs.cols(),
                targets.cols()
            )));
        }
        self.task.validate_targets(targets)
    }
}

fn check_network_fits(
    n_inputs: usize,
    n_outputs: usize,
    inputs: &Matrix,
    targets: &Matrix,
) -> Result<()> {
    if inputs.cols() != n_inputs {
        return Err(Error::ShapeMismatch(format!(
            "data has {} features but the network expects {n_inputs}",
            inputs.cols()
        )));
    }
    if targets.cols() != n_outputs {
        return Err(Error::ShapeMismatch(format!(
            "data has {} outputs but the network produces {n_outputs}",
            targets.cols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{BatchSize, Config, Init};

    #[test]
    fn batch_ranges_cover_every_sample_once() {
        let ranges: Vec<_> = batch_ranges(10, 4).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
        assert_eq!(batch_ranges(6, 3).count(), 2);
        assert_eq!(batch_ranges(3, 200).collect::<Vec<_>>(), vec![0..3]);
    }

    #[test]
    fn epoch_without_shuffle_is_deterministic() {
        let x = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]]).unwrap();
        let y = Matrix::column(&[1.0, -1.0, 0.0]);
        let base = Mlp::new_with_rng(2, &[3], 1, Init::Normal, 0.7, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let settings = EpochSettings {
            hidden: Activation::Tanh,
            output: Activation::Identity,
            loss: Loss::Squared,
            batch_size: 2,
            shuffle: false,
            step: StepParams {
                lr: 0.1,
                momentum: 0.5,
                alpha: 0.01,
                batch_fraction: 2.0 / 3.0,
            },
        };

        let run = |seed: u64| {
            let mut mlp = base.clone();
            let mut state = MomentumState::new(&mlp);
            let mut rng = StdRng::seed_from_u64(seed);
            run_epoch(&mut mlp, &mut state, &x, &y, &settings, &mut rng).unwrap();
            mlp
        };

        // Without shuffling the RNG is never consulted.
        assert_eq!(run(1), run(2));
        assert_ne!(run(1), base);
    }

    #[test]
    fn fit_reports_derived_state() {
        let mut est = Estimator::regressor(Config {
            hidden_layer_sizes: vec![4, 3],
            max_iter: 5,
            batch_size: BatchSize::Fixed(2),
            random_state: Some(0),
            ..Config::default()
        })
        .unwrap();
        let x = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]]).unwrap();
        let report = est.fit_column(&x, &[1.0, -1.0, 0.0]).unwrap();

        assert_eq!(report.n_iter, 5);
        assert_eq!(report.n_layers, 2);
        assert_eq!(report.n_outputs, 1);
        assert!(report.loss.is_finite());
        assert_eq!(est.last_fit(), Some(&report));
    }
}
