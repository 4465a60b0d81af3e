//! Momentum SGD with L2 weight decay.
//!
//! Design notes:
//! - Optimizer *state* (the momentum accumulators) lives outside the network.
//! - The estimator owns the state and reuses it across epochs and across
//!   warm-started `fit` calls; it is dropped whenever the weights are replaced.

use crate::{Error, Gradients, Matrix, Mlp, Result};

/// Hyperparameters of one update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    /// Learning rate `η`.
    pub lr: f64,
    /// Momentum coefficient `μ ∈ [0, 1)`.
    pub momentum: f64,
    /// L2 coefficient `α`.
    pub alpha: f64,
    /// Share of the dataset covered by one minibatch (`batch_size / n_samples`).
    pub batch_fraction: f64,
}

impl StepParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::Configuration(format!(
                "learning rate must be finite and > 0, got {}",
                self.lr
            )));
        }
        if !(self.momentum.is_finite() && (0.0..1.0).contains(&self.momentum)) {
            return Err(Error::Configuration(format!(
                "momentum must be finite and in [0,1), got {}",
                self.momentum
            )));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(Error::Configuration(format!(
                "alpha must be finite and >= 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Momentum accumulators, one per weight matrix and with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumState {
    velocities: Vec<Matrix>,
}

impl MomentumState {
    /// Zero accumulators shaped like `model`'s weights.
    pub fn new(model: &Mlp) -> Self {
        let velocities = model
            .layers()
            .iter()
            .map(|l| {
                let (rows, cols) = l.weights().shape();
                Matrix::zeros(rows, cols)
            })
            .collect();
        Self { velocities }
    }

    #[inline]
    pub fn velocities(&self) -> &[Matrix] {
        &self.velocities
    }

    /// Apply one update to every layer:
    ///
    /// - `m = μ m + (1 - μ) dW`
    /// - `W -= η m + 2 α (batch_size / n_samples) W`
    pub fn step(&mut self, model: &mut Mlp, grads: &Gradients, params: StepParams) {
        debug_assert_eq!(self.velocities.len(), model.num_layers());
        debug_assert_eq!(grads.len(), model.num_layers());

        let StepParams {
            lr,
            momentum,
            alpha,
            batch_fraction,
        } = params;
        let decay = 2.0 * alpha * batch_fraction;

        for (layer_idx, m) in self.velocities.iter_mut().enumerate() {
            let dw = grads.d_weights(layer_idx);
            debug_assert_eq!(m.shape(), dw.shape());

            for (v, &g) in m.as_mut_slice().iter_mut().zip(dw.as_slice()) {
                *v = momentum * *v + (1.0 - momentum) * g;
            }

            let Some(layer) = model.layer_mut(layer_idx) else {
                continue;
            };
            let w = layer.weights_mut().as_mut_slice();
            for (w, &v) in w.iter_mut().zip(m.as_slice()) {
                *w -= lr * v + decay * *w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{Activation, Loss};

    fn single_weight_model(w: f64, b: f64) -> Mlp {
        Mlp::from_weights(vec![Matrix::from_rows(&[[w], [b]]).unwrap()]).unwrap()
    }

    fn grads_for(model: &Mlp, x: f64, t: f64) -> Gradients {
        let x = Matrix::from_rows(&[[x]]).unwrap();
        let y = Matrix::from_rows(&[[t]]).unwrap();
        let cache = model
            .forward(&x, Activation::Identity, Activation::Identity)
            .unwrap();
        model
            .backward(&cache, &y, Activation::Identity, Activation::Identity, Loss::Squared)
            .unwrap()
    }

    #[test]
    fn step_params_validation() {
        let ok = StepParams {
            lr: 0.1,
            momentum: 0.9,
            alpha: 0.0,
            batch_fraction: 1.0,
        };
        assert!(ok.validate().is_ok());
        assert!(StepParams { lr: 0.0, ..ok }.validate().is_err());
        assert!(StepParams { momentum: 1.0, ..ok }.validate().is_err());
        assert!(StepParams { momentum: -0.1, ..ok }.validate().is_err());
        assert!(StepParams { alpha: f64::NAN, ..ok }.validate().is_err());
    }

    #[test]
    fn momentum_blends_gradients() {
        // y = w x + b with w = 1, b = 2; x = 1, t = 0 -> pred 3, dE = 3.
        let mut model = single_weight_model(1.0, 2.0);
        let mut state = MomentumState::new(&model);
        let params = StepParams {
            lr: 0.1,
            momentum: 0.5,
            alpha: 0.0,
            batch_fraction: 1.0,
        };

        let grads = grads_for(&model, 1.0, 0.0);
        assert_eq!(grads.d_weights(0).as_slice(), &[3.0, 3.0]);
        state.step(&mut model, &grads, params);

        // m = 0.5 * 3 = 1.5; w = 1 - 0.1 * 1.5, b = 2 - 0.1 * 1.5
        assert_eq!(state.velocities()[0].as_slice(), &[1.5, 1.5]);
        let w = model.layers()[0].weights().as_slice().to_vec();
        assert!((w[0] - 0.85).abs() < 1e-12);
        assert!((w[1] - 1.85).abs() < 1e-12);

        // Second step with a fixed gradient to see the accumulator carry over.
        state.step(&mut model, &grads, params);
        // m = 0.5 * 1.5 + 0.5 * 3 = 2.25
        assert!((state.velocities()[0].as_slice()[0] - 2.25).abs() < 1e-12);
        let w = model.layers()[0].weights().as_slice().to_vec();
        assert!((w[0] - (0.85 - 0.225)).abs() < 1e-12);
    }

    #[test]
    fn weight_decay_scales_with_batch_fraction() {
        let mut model = single_weight_model(2.0, -4.0);
        let mut state = MomentumState::new(&model);
        // Zero gradient: a target equal to the prediction.
        let grads = grads_for(&model, 1.0, -2.0);
        assert_eq!(grads.d_weights(0).as_slice(), &[0.0, 0.0]);

        state.step(
            &mut model,
            &grads,
            StepParams {
                lr: 0.1,
                momentum: 0.0,
                alpha: 0.5,
                batch_fraction: 0.25,
            },
        );

        // W -= 2 * 0.5 * 0.25 * W
        let w = model.layers()[0].weights().as_slice().to_vec();
        assert!((w[0] - 1.5).abs() < 1e-12);
        assert!((w[1] - -3.0).abs() < 1e-12);
    }
}
