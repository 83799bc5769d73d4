//! Activation functions applied to a gene's source node value.
//!
//! Every gene carries its own [`Activation`]; during evaluation the value of the
//! gene's input node is passed through it before being weighted and accumulated
//! into the output node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Activation function types supported by genes.
///
/// Configuration files name activations the same way [`FromStr`] does, so
/// `"unit"` and `"linear"` load as [`Activation::Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Activation {
    /// Identity function: f(x) = x
    Identity,
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    #[default]
    Sigmoid,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
    /// Rectified Linear Unit: f(x) = max(0, x)
    ReLU,
    /// Step function: f(x) = 1 if x > 0 else 0
    Step,
    /// Gaussian: f(x) = e^(-x^2)
    Gaussian,
    /// Absolute value: f(x) = |x|
    Abs,
}

impl Activation {
    /// All available activation functions.
    pub const ALL: [Self; 7] = [
        Self::Identity,
        Self::Sigmoid,
        Self::Tanh,
        Self::ReLU,
        Self::Step,
        Self::Gaussian,
        Self::Abs,
    ];

    /// Apply this activation function to an input value.
    ///
    /// NaN propagates unchanged; infinities map to the function's limit where
    /// one exists.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }

        match self {
            Self::Identity => x,
            Self::Sigmoid => {
                if x == f64::INFINITY {
                    return 1.0;
                }
                if x == f64::NEG_INFINITY {
                    return 0.0;
                }
                // exp overflows past ~709
                let clamped = x.clamp(-700.0, 700.0);
                1.0 / (1.0 + (-clamped).exp())
            }
            Self::Tanh => x.tanh(),
            Self::ReLU => x.max(0.0),
            Self::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Gaussian => {
                if x.is_infinite() || x.abs() > 40.0 {
                    0.0
                } else {
                    (-x * x).exp()
                }
            }
            Self::Abs => x.abs(),
        }
    }

    /// The lowercase name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::ReLU => "relu",
            Self::Step => "step",
            Self::Gaussian => "gaussian",
            Self::Abs => "abs",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                // "unit" is the historical name of the identity function
                "unit" | "linear" => Some(Self::Identity),
                _ => None,
            })
            .ok_or_else(|| ConfigError::UnknownActivation(s.to_string()))
    }
}

impl TryFrom<String> for Activation {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Activation> for &'static str {
    fn from(activation: Activation) -> Self {
        activation.name()
    }
}
