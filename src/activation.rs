//! Squashing functions applied to a node's weighted input sum.
//!
//! The activation engine uses [`Activation::Sigmoid`] unless a network is
//! configured otherwise. Every function is guarded against infinities so a
//! runaway weight cannot poison downstream nodes with NaN.

use serde::{Deserialize, Serialize};

/// Logistic sigmoid: `1 / (1 + e^(-x))`.
///
/// Saturates to exactly `0.0` / `1.0` at the infinities and propagates NaN.
#[inline]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    if x.is_nan() {
        return f32::NAN;
    }
    if x == f32::INFINITY {
        return 1.0;
    }
    if x == f32::NEG_INFINITY {
        return 0.0;
    }
    // exp overflows f32 past ~88
    let clamped = x.clamp(-88.0, 88.0);
    1.0 / (1.0 + (-clamped).exp())
}

/// Activation function used for every non-input node of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Logistic sigmoid, range `(0, 1)`.
    #[default]
    Sigmoid,
    /// Sigmoid with the steeper slope from the NEAT paper: `sigmoid(4.9x)`.
    SteepenedSigmoid,
    /// Hyperbolic tangent, range `(-1, 1)`.
    Tanh,
    /// `max(0, x)`.
    ReLU,
    /// Pass-through.
    Identity,
}

impl Activation {
    /// Apply this function to a weighted sum.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::Sigmoid => sigmoid(x),
            Self::SteepenedSigmoid => sigmoid(4.9 * x),
            Self::Tanh => {
                if x.is_infinite() {
                    return x.signum();
                }
                x.tanh()
            }
            Self::ReLU => {
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                x.max(0.0)
            }
            Self::Identity => x,
        }
    }

    /// Value produced for an empty weighted sum.
    #[must_use]
    pub fn at_rest(self) -> f32 {
        self.apply(0.0)
    }
}
