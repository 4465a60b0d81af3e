//! Weight persistence (feature: `serde`).
//!
//! A versioned JSON format for the weight store. Only weights are stored;
//! activations and loss belong to the estimator's [`crate::Config`].
//!
//! Design notes:
//! - Internal `Mlp`/`Layer` structs are not serialized directly, so the file
//!   format stays stable if the in-memory layout changes.
//! - Loading validates every matrix shape, the adjacency invariant, and that
//!   all weights are finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Estimator, Layer, Matrix, Mlp, Result};

pub const WEIGHTS_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedWeights {
    pub format_version: u32,
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub rows: usize,
    pub cols: usize,
    /// Row-major `(rows, cols)`, bias row last.
    pub weights: Vec<f64>,
}

impl SerializedWeights {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != WEIGHTS_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported weights format_version {}; expected {}",
                self.format_version, WEIGHTS_FORMAT_VERSION
            )));
        }
        if self.layers.is_empty() {
            return Err(Error::InvalidData(
                "serialized weights must have at least one layer".to_owned(),
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| Error::InvalidData(format!("layer {i}: {e}")))?;

            if i > 0 {
                let prev_cols = self.layers[i - 1].cols;
                if layer.rows != prev_cols + 1 {
                    return Err(Error::InvalidData(format!(
                        "layer {i} has {} rows but the previous layer has {prev_cols} outputs plus bias",
                        layer.rows
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.rows < 2 || self.cols == 0 {
            return Err(Error::InvalidData(format!(
                "a layer needs at least one input row, a bias row and one column, got {}x{}",
                self.rows, self.cols
            )));
        }
        let expected = self
            .rows
            .checked_mul(self.cols)
            .ok_or_else(|| Error::InvalidData("layer shape overflow".to_owned()))?;
        if self.weights.len() != expected {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match rows * cols ({} * {})",
                self.weights.len(),
                self.rows,
                self.cols
            )));
        }
        if self.weights.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<&Layer> for SerializedLayer {
    fn from(layer: &Layer) -> Self {
        let w = layer.weights();
        Self {
            rows: w.rows(),
            cols: w.cols(),
            weights: w.as_slice().to_vec(),
        }
    }
}

impl From<&Mlp> for SerializedWeights {
    fn from(model: &Mlp) -> Self {
        Self {
            format_version: WEIGHTS_FORMAT_VERSION,
            layers: model.layers().iter().map(SerializedLayer::from).collect(),
        }
    }
}

impl TryFrom<SerializedWeights> for Mlp {
    type Error = Error;

    fn try_from(value: SerializedWeights) -> std::result::Result<Self, Self::Error> {
        value.validate()?;
        let weights = value
            .layers
            .into_iter()
            .map(|l| Matrix::from_flat(l.weights, l.rows, l.cols))
            .collect::<Result<Vec<_>>>()?;
        Mlp::from_weights(weights)
    }
}

impl Estimator {
    /// Serialize the current weights to pretty-printed JSON.
    pub fn weights_to_json(&self) -> Result<String> {
        let mlp = self.network().ok_or(Error::NotFitted)?;
        serde_json::to_string_pretty(&SerializedWeights::from(mlp))
            .map_err(|e| Error::InvalidData(format!("failed to serialize weights: {e}")))
    }

    /// Replace the weights with ones parsed from JSON. Momentum is reset.
    pub fn set_weights_from_json(&mut self, s: &str) -> Result<()> {
        let ser: SerializedWeights = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse weights json: {e}")))?;
        let mlp = Mlp::try_from(ser)?;
        self.set_weights(mlp.to_weights())
    }

    pub fn save_weights_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.weights_to_json()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))
    }

    pub fn load_weights_json<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        self.set_weights_from_json(&s)
    }
}
