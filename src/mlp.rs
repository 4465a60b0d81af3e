use rand::Rng;
use tracing::trace;

use crate::{Activation, Error, Init, Layer, Loss, Matrix, Result};

/// The weight store: one [`Layer`] per layer transition, input side first.
///
/// Invariant: for every adjacent pair, `layers[i].out_dim() == layers[i + 1].in_dim()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    layers: Vec<Layer>,
}

/// Per-layer values cached by [`Mlp::forward`] for reuse by [`Mlp::backward`].
///
/// Both sequences have one entry per layer plus the input itself:
/// `nets[0] == outputs[0] == inputs`, and `outputs[last]` is the prediction.
#[derive(Debug, Clone)]
pub struct ForwardCache {
    nets: Vec<Matrix>,
    outputs: Vec<Matrix>,
}

/// Weight gradients for an [`Mlp`], one matrix per layer with the layer's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    d_weights: Vec<Matrix>,
}

impl Mlp {
    /// Generate random weights for a `n_inputs -> hidden... -> n_outputs` network.
    pub fn new_with_rng<R: Rng + ?Sized>(
        n_inputs: usize,
        hidden: &[usize],
        n_outputs: usize,
        init: Init,
        scale: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if n_inputs == 0 {
            return Err(Error::Configuration("n_inputs must be > 0".to_owned()));
        }

        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut in_dim = n_inputs;
        for &out_dim in hidden.iter().chain(std::iter::once(&n_outputs)) {
            layers.push(Layer::new_with_rng(in_dim, out_dim, init, scale, rng)?);
            in_dim = out_dim;
        }
        Ok(Self { layers })
    }

    /// Build a network from explicit weight matrices (bias row last in each).
    ///
    /// Fails with [`Error::ShapeMismatch`] unless every adjacent pair satisfies
    /// `weights[i].cols() == weights[i + 1].rows() - 1`.
    pub fn from_weights(weights: Vec<Matrix>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::ShapeMismatch(
                "at least one weight matrix is required".to_owned(),
            ));
        }

        for (i, pair) in weights.windows(2).enumerate() {
            if pair[0].cols() + 1 != pair[1].rows() {
                let shapes: Vec<_> = weights.iter().map(Matrix::shape).collect();
                return Err(Error::ShapeMismatch(format!(
                    "weight shapes must be compatible: matrix {i} has {} outputs but matrix {} \
                     expects {} inputs plus bias (shapes {shapes:?})",
                    pair[0].cols(),
                    i + 1,
                    pair[1].rows() as isize - 1,
                )));
            }
        }

        let layers = weights
            .into_iter()
            .map(Layer::from_matrix)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    /// Copy out the weight matrices.
    pub fn to_weights(&self) -> Vec<Matrix> {
        self.layers.iter().map(|l| l.weights().clone()).collect()
    }

    /// Forward pass over a batch.
    ///
    /// Hidden layers use `hidden`; the last layer uses `output`. Returns every
    /// layer's nets and outputs, which backprop needs in full.
    pub fn forward(
        &self,
        inputs: &Matrix,
        hidden: Activation,
        output: Activation,
    ) -> Result<ForwardCache> {
        if inputs.cols() != self.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "wrong number of features {} for first layer expecting {}",
                inputs.cols(),
                self.input_dim()
            )));
        }

        let mut nets = Vec::with_capacity(self.layers.len() + 1);
        let mut outputs = Vec::with_capacity(self.layers.len() + 1);
        nets.push(inputs.clone());
        outputs.push(inputs.clone());

        let last = self.layers.len() - 1;
        for (idx, layer) in self.layers.iter().enumerate() {
            let act = if idx == last { output } else { hidden };
            let net = layer.net(&outputs[idx]);
            let out = act.apply(&net);
            trace!(layer = idx, net = ?net.shape(), %act, "forward");
            nets.push(net);
            outputs.push(out);
        }

        Ok(ForwardCache { nets, outputs })
    }

    /// Forward pass returning only the prediction.
    pub fn predict(
        &self,
        inputs: &Matrix,
        hidden: Activation,
        output: Activation,
    ) -> Result<Matrix> {
        self.forward(inputs, hidden, output).map(ForwardCache::into_prediction)
    }

    /// Backpropagation over a batch.
    ///
    /// `cache` must come from [`Mlp::forward`] on this network with the same
    /// activations, and `targets` must have the prediction's shape. Each
    /// returned gradient is averaged over the batch.
    pub fn backward(
        &self,
        cache: &ForwardCache,
        targets: &Matrix,
        hidden: Activation,
        output: Activation,
        loss: Loss,
    ) -> Result<Gradients> {
        let n_layers = self.layers.len();
        if cache.outputs.len() != n_layers + 1 || cache.nets.len() != n_layers + 1 {
            return Err(Error::ShapeMismatch(format!(
                "forward cache has {} entries, network with {n_layers} layers needs {}",
                cache.outputs.len(),
                n_layers + 1
            )));
        }

        let batch = cache.outputs[0].rows();
        for (i, layer) in self.layers.iter().enumerate() {
            let (input, net) = (&cache.outputs[i], &cache.nets[i + 1]);
            if input.shape() != (batch, layer.in_dim()) || net.shape() != (batch, layer.out_dim()) {
                return Err(Error::ShapeMismatch(format!(
                    "forward cache does not fit layer {i}: input {:?} and net {:?}, \
                     layer maps {} -> {} over {batch} rows",
                    input.shape(),
                    net.shape(),
                    layer.in_dim(),
                    layer.out_dim()
                )));
            }
        }

        let prediction = cache.prediction();
        if targets.shape() != prediction.shape() {
            return Err(Error::ShapeMismatch(format!(
                "targets shape {:?} does not match prediction shape {:?}",
                targets.shape(),
                prediction.shape()
            )));
        }

        let inv_n = 1.0 / targets.rows().max(1) as f64;
        let mut d_weights = Vec::with_capacity(n_layers);

        // Output layer.
        let d_e = loss.derivative_matrix(targets, prediction);
        let d_f = output.derivative_matrix(&cache.nets[n_layers]);
        let mut delta = d_e.zip_map(&d_f, |a, b| a * b);
        d_weights.push(batch_outer(&cache.outputs[n_layers - 1], &delta, inv_n));
        trace!(layer = n_layers - 1, delta = ?delta.shape(), "backward");

        // Hidden layers, last to first.
        for idx in (1..n_layers).rev() {
            // dE/d(output of layer idx), the bias input has no upstream parameter.
            let d_e = delta
                .matmul_transposed(self.layers[idx].weights())
                .without_last_column();
            let d_f = hidden.derivative_matrix(&cache.nets[idx]);
            delta = d_e.zip_map(&d_f, |a, b| a * b);
            d_weights.push(batch_outer(&cache.outputs[idx - 1], &delta, inv_n));
            trace!(layer = idx - 1, delta = ?delta.shape(), "backward");
        }

        d_weights.reverse();
        debug_assert_eq!(d_weights.len(), n_layers);
        Ok(Gradients { d_weights })
    }
}

/// Batch average of the outer products `[prev_output, 1]ᵀ delta`.
fn batch_outer(prev_outputs: &Matrix, delta: &Matrix, inv_n: f64) -> Matrix {
    prev_outputs.with_bias_column().transposed_matmul(delta, inv_n)
}

impl ForwardCache {
    #[inline]
    pub fn nets(&self) -> &[Matrix] {
        &self.nets
    }

    #[inline]
    pub fn outputs(&self) -> &[Matrix] {
        &self.outputs
    }

    #[inline]
    pub fn prediction(&self) -> &Matrix {
        &self.outputs[self.outputs.len() - 1]
    }

    pub fn into_prediction(mut self) -> Matrix {
        let last = self.outputs.len() - 1;
        self.outputs.swap_remove(last)
    }
}

impl Gradients {
    #[inline]
    pub fn len(&self) -> usize {
        self.d_weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.d_weights.is_empty()
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &Matrix {
        &self.d_weights[layer_idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Matrix> + '_ {
        self.d_weights.iter()
    }
}
