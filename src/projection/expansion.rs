//! Random Fourier feature expansion.
use crate::data::dataset::{real, RealNumber};
use crate::trees::params::ExpansionParams;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::TAU;

/// Maps `x` to `cos(x·W + b)`, optionally prefixed by the original columns.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureExpansion<T: RealNumber> {
    /// `n_inputs × n_random_features`
    pub weights: DMatrix<T>,
    pub offsets: DVector<T>,
    pub include_original: bool,
}

impl<T: RealNumber> FeatureExpansion<T> {
    pub fn new(weights: DMatrix<T>, offsets: DVector<T>, include_original: bool) -> Self {
        Self {
            weights,
            offsets,
            include_original,
        }
    }

    /// Draws gaussian weights with standard deviation `1 / length_scale` and
    /// uniform phase offsets in `[0, 2π)`.
    pub fn random<R: Rng + ?Sized>(n_inputs: usize, params: &ExpansionParams<T>, rng: &mut R) -> Self {
        let n_features = params.n_features;
        let weights = DMatrix::from_fn(n_inputs, n_features, |_, _| {
            let w: f64 = rng.sample(StandardNormal);
            real::<T>(w) / params.length_scale
        });
        let offsets = DVector::from_fn(n_features, |_, _| real(rng.gen_range(0.0..TAU)));
        Self::new(weights, offsets, params.include_original)
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        let original = if self.include_original {
            self.n_inputs()
        } else {
            0
        };
        original + self.weights.ncols()
    }

    /// Expands every row of `x`; `x` must have `n_inputs()` columns.
    pub fn apply(&self, x: &DMatrix<T>) -> DMatrix<T> {
        let activations = x * &self.weights;
        let shift = if self.include_original {
            self.n_inputs()
        } else {
            0
        };
        DMatrix::from_fn(x.nrows(), self.n_outputs(), |i, j| {
            if j < shift {
                x[(i, j)]
            } else {
                (activations[(i, j - shift)] + self.offsets[j - shift]).cos()
            }
        })
    }
}
