//! Column statistics over node data.
use super::dataset::{count, RealNumber};
use nalgebra::{DMatrix, DVector};

/// Whether each column varies by more than `tol` between consecutive rows.
pub fn columns_vary<T: RealNumber>(x: &DMatrix<T>, tol: T) -> Vec<bool> {
    x.column_iter()
        .map(|column| varies(column.iter().copied(), tol))
        .collect()
}

/// Whether any two consecutive values differ by more than `tol`.
pub fn varies<T: RealNumber, I>(values: I, tol: T) -> bool
where
    I: Iterator<Item = T> + Clone,
{
    values
        .clone()
        .zip(values.skip(1))
        .any(|(previous, next)| (next - previous).abs() > tol)
}

/// True when the rows of `x` take at most two distinct values.
pub fn has_at_most_two_unique_rows<T: RealNumber>(x: &DMatrix<T>) -> bool {
    let mut unique: Vec<usize> = Vec::with_capacity(2);
    for i in 0..x.nrows() {
        let seen = unique.iter().any(|&j| x.row(i) == x.row(j));
        if !seen {
            if unique.len() == 2 {
                return false;
            }
            unique.push(i);
        }
    }
    true
}

pub fn column_sums<T: RealNumber>(y: &DMatrix<T>) -> DVector<T> {
    DVector::from_iterator(
        y.ncols(),
        y.column_iter()
            .map(|column| column.iter().fold(T::zero(), |acc, &v| acc + v)),
    )
}

pub fn column_means<T: RealNumber>(y: &DMatrix<T>) -> DVector<T> {
    let n = count::<T>(y.nrows());
    column_sums(y).map(|sum| sum / n)
}

/// Population variance (zero degrees of freedom) of each column.
pub fn column_variances<T: RealNumber>(y: &DMatrix<T>) -> DVector<T> {
    sum_squared_deviations(y).map(|ss| ss / count::<T>(y.nrows()))
}

/// Sample standard deviation (one degree of freedom) of each column.
///
/// A single row has no spread to estimate and yields zeros.
pub fn column_std_devs<T: RealNumber>(y: &DMatrix<T>) -> DVector<T> {
    if y.nrows() < 2 {
        return DVector::from_element(y.ncols(), T::zero());
    }
    sum_squared_deviations(y).map(|ss| (ss / count::<T>(y.nrows() - 1)).sqrt())
}

fn sum_squared_deviations<T: RealNumber>(y: &DMatrix<T>) -> DVector<T> {
    let means = column_means(y);
    DVector::from_iterator(
        y.ncols(),
        y.column_iter().zip(means.iter()).map(|(column, &mean)| {
            column
                .iter()
                .fold(T::zero(), |acc, &v| acc + (v - mean) * (v - mean))
        }),
    )
}
