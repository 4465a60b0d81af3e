//! The estimator facade.
//!
//! [`Estimator`] ties a [`Task`], a [`Config`], the weight store and the
//! optimizer state together. Training lives in `train.rs`; this file holds
//! construction, inference, weight access and named parameter access.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::params::{self, ParamValue};
use crate::{
    Config, Error, FitReport, Layer, Matrix, Mlp, MomentumState, Reporter, Result, Task,
};

/// A trainable multi-layer perceptron with a fixed [`Task`].
#[derive(Debug)]
pub struct Estimator {
    pub(crate) task: Task,
    pub(crate) config: Config,
    pub(crate) mlp: Option<Mlp>,
    pub(crate) momentum: Option<MomentumState>,
    pub(crate) rng: StdRng,
    pub(crate) reporter: Option<Reporter>,
    pub(crate) last_fit: Option<FitReport>,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

impl Estimator {
    /// Create an unfitted estimator.
    ///
    /// Regression and classification tasks overwrite `output_activation` and
    /// `loss` with the values they require.
    pub fn new(task: Task, mut config: Config) -> Result<Self> {
        if let Some(act) = task.output_activation() {
            config.output_activation = act;
        }
        if let Some(loss) = task.loss() {
            config.loss = loss;
        }
        config.validate()?;

        Ok(Self {
            task,
            rng: seeded_rng(config.random_state),
            config,
            mlp: None,
            momentum: None,
            reporter: None,
            last_fit: None,
        })
    }

    /// Identity output, squared loss.
    pub fn regressor(config: Config) -> Result<Self> {
        Self::new(Task::Regression, config)
    }

    /// Binary classifier: `zero_one_tanh` output, log loss, labels in `{0, 1}`.
    pub fn classifier(config: Config) -> Result<Self> {
        Self::new(Task::Classification, config)
    }

    #[inline]
    pub fn task(&self) -> Task {
        self.task
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        self.mlp.is_some()
    }

    /// The current network, if weights exist.
    #[inline]
    pub fn network(&self) -> Option<&Mlp> {
        self.mlp.as_ref()
    }

    /// The current weight matrices, input side first.
    pub fn weights(&self) -> Result<Vec<&Matrix>> {
        Ok(self.fitted()?.layers().iter().map(Layer::weights).collect())
    }

    /// Replace the weights. Momentum is reset; the next warm-started `fit`
    /// continues from these weights.
    pub fn set_weights(&mut self, weights: Vec<Matrix>) -> Result<()> {
        self.mlp = Some(Mlp::from_weights(weights)?);
        self.momentum = None;
        Ok(())
    }

    /// Post-processed predictions: raw output for regression, `{0, 1}` labels
    /// for classification.
    pub fn predict(&self, inputs: &Matrix) -> Result<Matrix> {
        Ok(self.task.postprocess(self.raw_output(inputs)?))
    }

    /// Probability of the positive class, one column. Classification only.
    pub fn predict_proba(&self, inputs: &Matrix) -> Result<Matrix> {
        if self.task != Task::Classification {
            return Err(Error::Configuration(format!(
                "predict_proba is only available for classification, this estimator does {}",
                self.task
            )));
        }
        self.raw_output(inputs)
    }

    /// Natural log of [`Estimator::predict_proba`].
    pub fn predict_log_proba(&self, inputs: &Matrix) -> Result<Matrix> {
        Ok(self.predict_proba(inputs)?.map(f64::ln))
    }

    /// Raw output of the last layer, before task post-processing.
    pub fn raw_output(&self, inputs: &Matrix) -> Result<Matrix> {
        self.fitted()?
            .predict(inputs, self.config.hidden_activation, self.config.output_activation)
    }

    /// Install or remove the per-epoch reporting hook.
    pub fn set_reporter(&mut self, reporter: Option<Reporter>) {
        self.reporter = reporter;
    }

    pub fn take_reporter(&mut self) -> Option<Reporter> {
        self.reporter.take()
    }

    /// Every hyperparameter by name.
    pub fn get_params(&self) -> BTreeMap<&'static str, ParamValue> {
        params::get_params(&self.config)
    }

    /// Set several hyperparameters by name.
    ///
    /// All-or-nothing: on error the configuration is left untouched. A task
    /// that fixes `output_activation` or `loss` only accepts its own value.
    pub fn set_params<I, K>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: AsRef<str>,
    {
        let mut next = self.config.clone();
        for (name, value) in values {
            params::set_param(&mut next, name.as_ref(), value)?;
        }
        if let Some(act) = self.task.output_activation().filter(|&a| a != next.output_activation) {
            return Err(Error::Configuration(format!(
                "{} estimators always use the {act} output activation",
                self.task
            )));
        }
        if let Some(loss) = self.task.loss().filter(|&l| l != next.loss) {
            return Err(Error::Configuration(format!(
                "{} estimators always use the {loss} loss",
                self.task
            )));
        }
        next.validate()?;

        if next.random_state != self.config.random_state {
            self.rng = seeded_rng(next.random_state);
        }
        self.config = next;
        Ok(())
    }

    pub fn last_fit(&self) -> Option<&FitReport> {
        self.last_fit.as_ref()
    }

    /// Epochs run by the last `fit`.
    pub fn n_iter(&self) -> Result<usize> {
        self.fit_state().map(|r| r.n_iter)
    }

    /// Mean training loss after the last epoch of the last `fit`.
    pub fn loss(&self) -> Result<f64> {
        self.fit_state().map(|r| r.loss)
    }

    /// Number of hidden layers.
    pub fn n_layers(&self) -> Result<usize> {
        self.fitted().map(|m| m.num_layers() - 1)
    }

    pub fn n_outputs(&self) -> Result<usize> {
        self.fitted().map(Mlp::output_dim)
    }

    fn fitted(&self) -> Result<&Mlp> {
        self.mlp.as_ref().ok_or(Error::NotFitted)
    }

    fn fit_state(&self) -> Result<&FitReport> {
        self.last_fit.as_ref().ok_or(Error::NotFitted)
    }
}
