//! Exact splits for samples with at most two distinct rows.
use crate::data::dataset::{real, RealNumber};
use crate::data::stats::column_means;
use nalgebra::{DMatrix, DVector};

#[derive(Clone, Debug, PartialEq)]
pub struct TwoPointSplit<T: RealNumber> {
    pub projection: DVector<T>,
    pub partition_point: T,
}

pub trait TwoPointSplitter<T: RealNumber> {
    /// Separates the two distinct rows of `x`, or returns `None` when no
    /// useful separating hyperplane exists.
    fn split(&self, x: &DMatrix<T>, y: &DMatrix<T>, tol: T) -> Option<TwoPointSplit<T>>;
}

/// Splits at the perpendicular bisector of the two distinct rows, which
/// maximises the margin between them.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxMarginSplitter;

impl<T: RealNumber> TwoPointSplitter<T> for MaxMarginSplitter {
    fn split(&self, x: &DMatrix<T>, y: &DMatrix<T>, tol: T) -> Option<TwoPointSplit<T>> {
        if x.nrows() < 2 {
            return None;
        }
        let first = x.row(0).transpose();
        let other = (1..x.nrows()).find(|&i| x.row(i) != x.row(0))?;
        let second = x.row(other).transpose();

        let direction = &second - &first;
        let length = direction.dot(&direction).sqrt();
        if !(length > tol) {
            return None;
        }

        let (first_rows, second_rows): (Vec<usize>, Vec<usize>) =
            (0..x.nrows()).partition(|&i| x.row(i) == x.row(0));
        let first_mean = column_means(&select(y, &first_rows));
        let second_mean = column_means(&select(y, &second_rows));
        let outputs_differ = first_mean
            .iter()
            .zip(second_mean.iter())
            .any(|(&a, &b)| (a - b).abs() > tol);
        if !outputs_differ {
            return None;
        }

        let projection = direction / length;
        let midpoint = (&first + &second) * real::<T>(0.5);
        let partition_point = projection.dot(&midpoint);
        Some(TwoPointSplit {
            projection,
            partition_point,
        })
    }
}

fn select<T: RealNumber>(y: &DMatrix<T>, rows: &[usize]) -> DMatrix<T> {
    DMatrix::from_fn(rows.len(), y.ncols(), |i, j| y[(rows[i], j)])
}
