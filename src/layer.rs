use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::StandardNormal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Matrix, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Weight initialization strategy.
///
/// Both strategies are parameterized by a `scale` chosen by the caller.
pub enum Init {
    /// `scale * N(0, 1)`.
    #[default]
    Normal,
    /// Uniform over `[-scale, scale]`.
    Uniform,
}

impl Init {
    pub const ALL: [Init; 2] = [Init::Normal, Init::Uniform];

    pub fn name(self) -> &'static str {
        match self {
            Init::Normal => "random_normal",
            Init::Uniform => "random_uniform",
        }
    }

    /// Draw a `rows x cols` matrix.
    pub fn sample<R: Rng + ?Sized>(
        self,
        rows: usize,
        cols: usize,
        scale: f64,
        rng: &mut R,
    ) -> Matrix {
        let mut m = Matrix::zeros(rows, cols);
        match self {
            Init::Normal => {
                for v in m.as_mut_slice() {
                    let z: f64 = rng.sample(StandardNormal);
                    *v = scale * z;
                }
            }
            Init::Uniform => {
                for v in m.as_mut_slice() {
                    *v = rng.random_range(-scale..=scale);
                }
            }
        }
        m
    }
}

impl fmt::Display for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Init {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Init::ALL.into_iter().find(|i| i.name() == s).ok_or_else(|| {
            Error::Configuration(format!("weight initialization {s:?} is not implemented"))
        })
    }
}

/// One layer transition: a weight matrix with shape `(in_dim + 1, out_dim)`.
///
/// The last row holds the biases; it is multiplied against the constant-1
/// column that the forward pass appends to the layer input.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Matrix,
}

impl Layer {
    /// Wrap an existing weight matrix (bias row included).
    pub fn from_matrix(weights: Matrix) -> Result<Self> {
        if weights.rows() < 2 || weights.cols() < 1 {
            return Err(Error::ShapeMismatch(format!(
                "weight matrix needs an input row, a bias row and one column, got {:?}",
                weights.shape()
            )));
        }
        Ok(Self { weights })
    }

    /// A randomly initialized layer.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        init: Init,
        scale: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if out_dim == 0 {
            return Err(Error::Configuration("layer out_dim must be > 0".to_owned()));
        }
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(Error::Configuration(format!(
                "weight init scale must be finite and >= 0, got {scale}"
            )));
        }
        Self::from_matrix(init.sample(in_dim + 1, out_dim, scale, rng))
    }

    /// Number of inputs, bias excluded.
    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.rows() - 1
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.cols()
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    #[inline]
    pub fn into_matrix(self) -> Matrix {
        self.weights
    }

    /// `net = [inputs, 1] · W`.
    pub(crate) fn net(&self, inputs: &Matrix) -> Matrix {
        debug_assert_eq!(inputs.cols(), self.in_dim());
        inputs.with_bias_column().matmul(&self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_layer_has_bias_row() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Layer::new_with_rng(3, 2, Init::Normal, 0.7, &mut rng).unwrap();
        assert_eq!(layer.weights().shape(), (4, 2));
        assert_eq!(layer.in_dim(), 3);
        assert_eq!(layer.out_dim(), 2);
    }

    #[test]
    fn uniform_init_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Init::Uniform.sample(20, 20, 0.25, &mut rng);
        assert!(m.as_slice().iter().all(|v| (-0.25..=0.25).contains(v)));
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let a = Init::Normal.sample(5, 4, 0.7, &mut StdRng::seed_from_u64(42));
        let b = Init::Normal.sample(5, 4, 0.7, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn net_adds_the_bias_row() {
        let w = Matrix::from_rows(&[[1.0, 1.0], [1.0, 1.0], [-1.5, -0.5]]).unwrap();
        let layer = Layer::from_matrix(w).unwrap();
        let x = Matrix::from_rows(&[[0.0, 1.0], [1.0, 1.0]]).unwrap();
        assert_eq!(layer.net(&x).as_slice(), &[-0.5, 0.5, 0.5, 1.5]);
    }

    #[test]
    fn negative_scale_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Layer::new_with_rng(2, 2, Init::Uniform, -1.0, &mut rng).is_err());
        assert!(Layer::new_with_rng(2, 0, Init::Uniform, 1.0, &mut rng).is_err());
    }
}
