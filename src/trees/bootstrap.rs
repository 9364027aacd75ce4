//! Projection bootstrap.
use super::params::{Task, TreeConfig};
use crate::data::dataset::{count, real, Dataset, RealNumber};
use crate::data::stats::{column_sums, column_variances, columns_vary};
use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// Draws the sample the projection is computed from.
///
/// Returns `None` when the sample can't support a split and the config says
/// to stop; with `continue_on_degenerate_bag` the node's own data is used
/// instead.
pub(crate) fn draw_bag<T: RealNumber, R: Rng + ?Sized>(
    node: &Dataset<T>,
    task: Task,
    config: &TreeConfig<T>,
    baseline: &DVector<T>,
    rng: &mut R,
) -> Option<Dataset<T>> {
    let bag = if config.projection_bootstrap {
        node.bootstrap(rng)
    } else {
        node.clone()
    };
    if !is_degenerate(&bag, task, config, baseline) {
        Some(bag)
    } else if config.continue_on_degenerate_bag {
        Some(node.clone())
    } else {
        None
    }
}

pub(crate) fn is_degenerate<T: RealNumber>(
    bag: &Dataset<T>,
    task: Task,
    config: &TreeConfig<T>,
    baseline: &DVector<T>,
) -> bool {
    if !columns_vary(&bag.x, config.x_variation_tol).contains(&true) {
        return true;
    }
    match task {
        Task::Regression => below_tolerance(&bag.y, baseline, config.mse_error_tolerance),
        Task::Classification if bag.y.ncols() > 1 => {
            let present = column_sums(&bag.y)
                .iter()
                .filter(|sum| sum.abs() > real(1e-12))
                .count();
            present < 2
        }
        Task::Classification => {
            let sum = column_sums(&bag.y)[0];
            sum == T::zero() || sum == count(bag.nrows())
        }
    }
}

/// Every output variance is at most `baseline * tolerance`.
///
/// Constant outputs always qualify, even when the baseline itself is zero.
pub(crate) fn below_tolerance<T: RealNumber>(
    y: &DMatrix<T>,
    baseline: &DVector<T>,
    tolerance: T,
) -> bool {
    column_variances(y)
        .iter()
        .zip(baseline.iter())
        .all(|(&variance, &total)| variance <= total * tolerance)
}
