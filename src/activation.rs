//! Activation functions.
//!
//! A layer computes a pre-activation value (the "net") `net = [x, 1] W` and then
//! applies an activation function element-wise: `output = activation(net)`.
//!
//! The forward pass caches both nets and outputs. Derivatives are evaluated at
//! the cached net, which keeps every activation (including `threshold`, whose
//! output does not determine its input) on the same footing.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Matrix, Result};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Element-wise activation function.
pub enum Activation {
    Identity,
    /// Step function: `1` for positive inputs, `0` otherwise.
    Threshold,
    Relu,
    Logistic,
    Tanh,
    /// `tanh` rescaled to the `[0, 1]` range: `(1 + tanh x) / 2`.
    ZeroOneTanh,
}

impl Activation {
    pub const ALL: [Activation; 6] = [
        Activation::Identity,
        Activation::Threshold,
        Activation::Relu,
        Activation::Logistic,
        Activation::Tanh,
        Activation::ZeroOneTanh,
    ];

    /// Registry name of this activation.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Threshold => "threshold",
            Activation::Relu => "relu",
            Activation::Logistic => "logistic",
            Activation::Tanh => "tanh",
            Activation::ZeroOneTanh => "zero_one_tanh",
        }
    }

    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Threshold => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Relu => x.max(0.0),
            Activation::Logistic => logistic(x),
            Activation::Tanh => x.tanh(),
            Activation::ZeroOneTanh => (1.0 + x.tanh()) / 2.0,
        }
    }

    /// Derivative of the activation, evaluated at the pre-activation `x`.
    #[inline]
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Threshold => 0.0,
            Activation::Relu => {
                if x <= 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Activation::Logistic => {
                let y = logistic(x);
                y * (1.0 - y)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::ZeroOneTanh => {
                let t = x.tanh();
                0.5 * (1.0 - t * t)
            }
        }
    }

    /// Element-wise [`Activation::forward`] over a whole matrix.
    pub fn apply(self, nets: &Matrix) -> Matrix {
        nets.map(|x| self.forward(x))
    }

    /// Element-wise [`Activation::derivative`] over a whole matrix.
    pub fn derivative_matrix(self, nets: &Matrix) -> Matrix {
        nets.map(|x| self.derivative(x))
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Activation::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| {
                Error::Configuration(format!("activation function {s:?} is not implemented"))
            })
    }
}

#[inline]
fn logistic(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_and_unknown_names_fail() {
        for act in Activation::ALL {
            assert_eq!(act.name().parse::<Activation>().unwrap(), act);
        }
        let err = "softmax".parse::<Activation>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn threshold_and_relu_at_the_origin() {
        assert_eq!(Activation::Threshold.forward(0.0), 0.0);
        assert_eq!(Activation::Threshold.forward(1e-9), 1.0);
        assert_eq!(Activation::Threshold.derivative(3.0), 0.0);

        assert_eq!(Activation::Relu.forward(-2.0), 0.0);
        assert_eq!(Activation::Relu.forward(3.0), 3.0);
        assert_eq!(Activation::Relu.derivative(0.0), 0.0);
        assert_eq!(Activation::Relu.derivative(0.5), 1.0);
    }

    #[test]
    fn logistic_basic_values() {
        let y0 = Activation::Logistic.forward(0.0);
        assert!((y0 - 0.5).abs() < 1e-12);
        assert!((Activation::Logistic.derivative(0.0) - 0.25).abs() < 1e-12);

        assert!(Activation::Logistic.forward(40.0) > 0.999_999);
        assert!(Activation::Logistic.forward(-40.0) < 1e-6);
    }

    #[test]
    fn zero_one_tanh_range_and_slope() {
        assert!((Activation::ZeroOneTanh.forward(0.0) - 0.5).abs() < 1e-12);
        assert!(Activation::ZeroOneTanh.forward(20.0) <= 1.0);
        assert!(Activation::ZeroOneTanh.forward(-20.0) >= 0.0);
        assert!((Activation::ZeroOneTanh.derivative(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for act in [
            Activation::Identity,
            Activation::Logistic,
            Activation::Tanh,
            Activation::ZeroOneTanh,
        ] {
            for &x in &[-1.3, -0.2, 0.4, 2.1] {
                let numeric = (act.forward(x + h) - act.forward(x - h)) / (2.0 * h);
                assert!(
                    (numeric - act.derivative(x)).abs() < 1e-6,
                    "{act}: numeric={numeric} analytic={}",
                    act.derivative(x)
                );
            }
        }
    }

    #[test]
    fn apply_preserves_shape() {
        let nets = Matrix::from_rows(&[[-1.0, 0.0, 2.0]]).unwrap();
        let out = Activation::Relu.apply(&nets);
        assert_eq!(out.shape(), (1, 3));
        assert_eq!(out.as_slice(), &[0.0, 0.0, 2.0]);
    }
}
