//! Named hyperparameter access for sweep tooling.
//!
//! Search and cross-validation drivers address hyperparameters by name. Each
//! name maps to a typed getter/setter over [`Config`]; values travel as
//! [`ParamValue`]. Integers are accepted wherever a float is expected.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Activation, BatchSize, Config, Error, Init, LearningRate, Loss, Result, Solver};

/// A dynamically typed hyperparameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(usize),
    Float(f64),
    Text(String),
    Sizes(Vec<usize>),
    /// Optional seed (`random_state`).
    Seed(Option<u64>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
            ParamValue::Sizes(v) => write!(f, "{v:?}"),
            ParamValue::Seed(Some(v)) => write!(f, "{v}"),
            ParamValue::Seed(None) => f.write_str("none"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<usize>> for ParamValue {
    fn from(v: Vec<usize>) -> Self {
        ParamValue::Sizes(v)
    }
}

impl From<Option<u64>> for ParamValue {
    fn from(v: Option<u64>) -> Self {
        ParamValue::Seed(v)
    }
}

/// Every recognized parameter name.
pub const PARAM_NAMES: [&str; 27] = [
    "activation",
    "alpha",
    "batch_size",
    "beta_1",
    "beta_2",
    "early_stopping",
    "epsilon",
    "hidden_layer_sizes",
    "learning_rate",
    "learning_rate_init",
    "loss",
    "max_fun",
    "max_iter",
    "momentum",
    "n_iter_no_change",
    "nesterovs_momentum",
    "output_activation",
    "power_t",
    "random_state",
    "shuffle",
    "solver",
    "tol",
    "validation_fraction",
    "verbose",
    "warm_start",
    "weights_init",
    "weights_init_value",
];

/// Read every parameter of `cfg`.
pub fn get_params(cfg: &Config) -> BTreeMap<&'static str, ParamValue> {
    let batch_size = match cfg.batch_size {
        BatchSize::Auto => ParamValue::Text("auto".to_owned()),
        BatchSize::Fixed(n) => ParamValue::Int(n),
    };

    let params: [(&'static str, ParamValue); PARAM_NAMES.len()] = [
        ("activation", cfg.hidden_activation.name().into()),
        ("alpha", cfg.alpha.into()),
        ("batch_size", batch_size),
        ("beta_1", cfg.beta_1.into()),
        ("beta_2", cfg.beta_2.into()),
        ("early_stopping", cfg.early_stopping.into()),
        ("epsilon", cfg.epsilon.into()),
        ("hidden_layer_sizes", cfg.hidden_layer_sizes.clone().into()),
        ("learning_rate", cfg.learning_rate.name().into()),
        ("learning_rate_init", cfg.learning_rate_init.into()),
        ("loss", cfg.loss.name().into()),
        ("max_fun", cfg.max_fun.into()),
        ("max_iter", cfg.max_iter.into()),
        ("momentum", cfg.momentum.into()),
        ("n_iter_no_change", cfg.n_iter_no_change.into()),
        ("nesterovs_momentum", cfg.nesterovs_momentum.into()),
        ("output_activation", cfg.output_activation.name().into()),
        ("power_t", cfg.power_t.into()),
        ("random_state", cfg.random_state.into()),
        ("shuffle", cfg.shuffle.into()),
        ("solver", cfg.solver.name().into()),
        ("tol", cfg.tol.into()),
        ("validation_fraction", cfg.validation_fraction.into()),
        ("verbose", cfg.verbose.into()),
        ("warm_start", cfg.warm_start.into()),
        ("weights_init", cfg.weights_init.name().into()),
        ("weights_init_value", cfg.weights_init_value.into()),
    ];
    BTreeMap::from(params)
}

/// Write one parameter into `cfg`.
///
/// Does not validate the resulting configuration as a whole; see
/// [`Config::validate`].
pub fn set_param(cfg: &mut Config, name: &str, value: ParamValue) -> Result<()> {
    match name {
        "activation" => cfg.hidden_activation = text(name, value)?.parse::<Activation>()?,
        "output_activation" => cfg.output_activation = text(name, value)?.parse::<Activation>()?,
        "loss" => cfg.loss = text(name, value)?.parse::<Loss>()?,
        "solver" => cfg.solver = text(name, value)?.parse::<Solver>()?,
        "learning_rate" => cfg.learning_rate = text(name, value)?.parse::<LearningRate>()?,
        "weights_init" => cfg.weights_init = text(name, value)?.parse::<Init>()?,
        "batch_size" => {
            cfg.batch_size = match value {
                ParamValue::Int(n) => BatchSize::Fixed(n),
                ParamValue::Text(s) => s.parse()?,
                other => return Err(type_error(name, "\"auto\" or an integer", &other)),
            }
        }
        "hidden_layer_sizes" => {
            cfg.hidden_layer_sizes = match value {
                ParamValue::Sizes(v) => v,
                ParamValue::Int(n) => vec![n],
                other => return Err(type_error(name, "a list of layer widths", &other)),
            }
        }
        "random_state" => {
            cfg.random_state = match value {
                ParamValue::Seed(s) => s,
                ParamValue::Int(n) => Some(n as u64),
                other => return Err(type_error(name, "an optional seed", &other)),
            }
        }
        "alpha" => cfg.alpha = float(name, value)?,
        "learning_rate_init" => cfg.learning_rate_init = float(name, value)?,
        "momentum" => cfg.momentum = float(name, value)?,
        "weights_init_value" => cfg.weights_init_value = float(name, value)?,
        "power_t" => cfg.power_t = float(name, value)?,
        "tol" => cfg.tol = float(name, value)?,
        "validation_fraction" => cfg.validation_fraction = float(name, value)?,
        "beta_1" => cfg.beta_1 = float(name, value)?,
        "beta_2" => cfg.beta_2 = float(name, value)?,
        "epsilon" => cfg.epsilon = float(name, value)?,
        "max_iter" => cfg.max_iter = int(name, value)?,
        "n_iter_no_change" => cfg.n_iter_no_change = int(name, value)?,
        "max_fun" => cfg.max_fun = int(name, value)?,
        "shuffle" => cfg.shuffle = boolean(name, value)?,
        "warm_start" => cfg.warm_start = boolean(name, value)?,
        "verbose" => cfg.verbose = boolean(name, value)?,
        "nesterovs_momentum" => cfg.nesterovs_momentum = boolean(name, value)?,
        "early_stopping" => cfg.early_stopping = boolean(name, value)?,
        other => {
            return Err(Error::Configuration(format!(
                "unknown parameter {other:?}"
            )));
        }
    }
    Ok(())
}

fn type_error(name: &str, expected: &str, got: &ParamValue) -> Error {
    Error::Configuration(format!(
        "parameter {name:?} expects {expected}, got {got:?}"
    ))
}

fn text(name: &str, value: ParamValue) -> Result<String> {
    match value {
        ParamValue::Text(s) => Ok(s),
        other => Err(type_error(name, "a name", &other)),
    }
}

fn float(name: &str, value: ParamValue) -> Result<f64> {
    match value {
        ParamValue::Float(v) => Ok(v),
        ParamValue::Int(v) => Ok(v as f64),
        other => Err(type_error(name, "a number", &other)),
    }
}

fn int(name: &str, value: ParamValue) -> Result<usize> {
    match value {
        ParamValue::Int(v) => Ok(v),
        other => Err(type_error(name, "a non-negative integer", &other)),
    }
}

fn boolean(name: &str, value: ParamValue) -> Result<bool> {
    match value {
        ParamValue::Bool(v) => Ok(v),
        other => Err(type_error(name, "a boolean", &other)),
    }
}
