//! Projections that turn a node's selected columns into candidate split directions.
//!
//! Computing good projections (canonical correlation analysis and friends) is
//! left to implementors of [`ProjectionEngine`]. [`AxisAlignedProjection`]
//! projects onto the input axes, which turns the grower into an ordinary
//! axis-aligned tree and is handy as a baseline.
use crate::data::dataset::RealNumber;
use crate::trees::params::{ProjectionMode, ProjectionOptions};
use nalgebra::DMatrix;
use rand::Rng;
use std::error::Error;

pub mod expansion;
pub mod two_point;

pub use expansion::FeatureExpansion;
pub use two_point::{MaxMarginSplitter, TwoPointSplit, TwoPointSplitter};

/// Result of projecting a bagged sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection<T: RealNumber> {
    /// One candidate direction per column, over the (expanded) inputs.
    pub matrix: DMatrix<T>,
    /// Applied to the inputs before `matrix`.
    pub expansion: Option<FeatureExpansion<T>>,
    /// Maps outputs to output components.
    pub output_matrix: Option<DMatrix<T>>,
}

impl<T: RealNumber> Projection<T> {
    pub fn linear(matrix: DMatrix<T>) -> Self {
        Self {
            matrix,
            expansion: None,
            output_matrix: None,
        }
    }

    /// Number of input columns the projection accepts.
    pub fn n_inputs(&self) -> usize {
        match &self.expansion {
            Some(expansion) => expansion.n_inputs(),
            None => self.matrix.nrows(),
        }
    }
}

pub trait ProjectionEngine<T: RealNumber> {
    /// Computes candidate directions from a bagged sample of the node.
    ///
    /// `x` holds only the columns selected at the node. Any randomness must be
    /// drawn from `rng` so growth stays reproducible.
    fn project<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<T>,
        y: &DMatrix<T>,
        options: &ProjectionOptions<T>,
        rng: &mut R,
    ) -> Result<Projection<T>, Box<dyn Error + Send + Sync>>;
}

/// Projects onto the coordinate axes of the (possibly expanded) inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AxisAlignedProjection;

impl<T: RealNumber> ProjectionEngine<T> for AxisAlignedProjection {
    fn project<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<T>,
        _y: &DMatrix<T>,
        options: &ProjectionOptions<T>,
        rng: &mut R,
    ) -> Result<Projection<T>, Box<dyn Error + Send + Sync>> {
        match &options.mode {
            ProjectionMode::Components => Ok(Projection::linear(DMatrix::identity(
                x.ncols(),
                x.ncols(),
            ))),
            ProjectionMode::FeatureExpansion(params) => {
                let expansion = FeatureExpansion::random(x.ncols(), params, rng);
                let width = expansion.n_outputs();
                Ok(Projection {
                    matrix: DMatrix::identity(width, width),
                    expansion: Some(expansion),
                    output_matrix: None,
                })
            }
        }
    }
}
