use nalgebra::DMatrix;
use num_traits::{Float, FromPrimitive, Num, ToPrimitive};
use rand::Rng;
use std::cmp::PartialOrd;
use std::fmt::{self, Display};
use std::fmt::{Debug, Formatter};
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

pub trait DataValue:
    Debug
    + Clone
    + Copy
    + Num
    + FromPrimitive
    + ToPrimitive
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Send
    + Sync
    + Display
    + 'static
{
}

impl<T> DataValue for T where
    T: Debug
        + Clone
        + Copy
        + Num
        + FromPrimitive
        + ToPrimitive
        + AddAssign
        + SubAssign
        + MulAssign
        + DivAssign
        + Send
        + Sync
        + Display
        + 'static
{
}

pub trait Number: DataValue + PartialOrd {}
impl<T> Number for T where T: DataValue + PartialOrd {}

pub trait RealNumber: Number + Float {}
impl<T> RealNumber for T where T: Number + Float {}

/// Converts an `f64` constant into `T`, yielding NaN if it isn't representable.
pub fn real<T: RealNumber>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Converts a count into `T`.
pub fn count<T: RealNumber>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::nan)
}

/// Features and outputs of the rows that reached a node.
///
/// Outputs are a matrix: one-hot columns for classification, one column per
/// target for regression.
#[derive(Clone, PartialEq)]
pub struct Dataset<T: RealNumber> {
    pub x: DMatrix<T>,
    pub y: DMatrix<T>,
}

impl<T: RealNumber> Debug for Dataset<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Dataset {{\n    x: [\n")?;

        for i in 0..self.x.nrows() {
            write!(f, "        [")?;
            for j in 0..self.x.ncols() {
                write!(f, "{:?}, ", self.x[(i, j)])?;
            }
            writeln!(f, "],")?;
        }

        write!(f, "    ],\n    y: [\n")?;
        for i in 0..self.y.nrows() {
            write!(f, "        [")?;
            for j in 0..self.y.ncols() {
                write!(f, "{:?}, ", self.y[(i, j)])?;
            }
            writeln!(f, "],")?;
        }
        write!(f, "    ]\n}}")
    }
}

impl<T: RealNumber> Dataset<T> {
    pub fn new(x: DMatrix<T>, y: DMatrix<T>) -> Self {
        Self { x, y }
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    /// Copies the given rows, in order and with repetition.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let x = DMatrix::from_fn(indices.len(), self.x.ncols(), |i, j| {
            self.x[(indices[i], j)]
        });
        let y = DMatrix::from_fn(indices.len(), self.y.ncols(), |i, j| {
            self.y[(indices[i], j)]
        });
        Self::new(x, y)
    }

    /// Keeps only the given feature columns; outputs are untouched.
    pub fn select_features(&self, columns: &[usize]) -> Self {
        Self::new(select_columns(&self.x, columns), self.y.clone())
    }

    /// Splits rows into `(mask == true, mask == false)`, preserving order.
    pub fn split_on_mask(&self, mask: &[bool]) -> (Self, Self) {
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            (0..self.nrows()).partition(|&index| mask[index]);

        (
            self.select_rows(&left_indices),
            self.select_rows(&right_indices),
        )
    }

    /// Draws `nrows` rows with replacement.
    pub fn bootstrap<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let nrows = self.nrows();
        let sample_indices = (0..nrows)
            .map(|_| rng.gen_range(0..nrows))
            .collect::<Vec<_>>();

        self.select_rows(&sample_indices)
    }
}

/// Copies the given columns of `matrix`, in order.
pub fn select_columns<T: RealNumber>(matrix: &DMatrix<T>, columns: &[usize]) -> DMatrix<T> {
    DMatrix::from_fn(matrix.nrows(), columns.len(), |i, j| matrix[(i, columns[j])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample_dataset() -> Dataset<f64> {
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let y = DMatrix::from_row_slice(4, 1, &[9.0, 10.0, 11.0, 12.0]);
        Dataset::new(x, y)
    }

    #[test]
    fn test_dataset_new() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let y = DMatrix::from_row_slice(2, 1, &[5.0, 6.0]);
        let dataset = Dataset::new(x.clone(), y.clone());
        assert_eq!(dataset.x, x);
        assert_eq!(dataset.y, y);
    }

    #[test]
    fn test_dataset_formatting() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let y = DMatrix::from_row_slice(2, 1, &[5.0, 6.0]);
        let dataset = Dataset::new(x, y);

        let dataset_str = format!("{:?}", dataset);

        let expected_str = "\
Dataset {
    x: [
        [1.0, 2.0, ],
        [3.0, 4.0, ],
    ],
    y: [
        [5.0, ],
        [6.0, ],
    ]
}";

        assert_eq!(dataset_str, expected_str);
    }

    #[test]
    fn test_select_rows_repeats() {
        let dataset = sample_dataset();
        let selected = dataset.select_rows(&[3, 3, 0]);
        assert_eq!(selected.nrows(), 3);
        assert_eq!(selected.x[(0, 0)], 7.0);
        assert_eq!(selected.x[(1, 1)], 8.0);
        assert_eq!(selected.y[(2, 0)], 9.0);
    }

    #[test]
    fn test_select_features() {
        let dataset = sample_dataset();
        let selected = dataset.select_features(&[1]);
        assert_eq!(selected.x.ncols(), 1);
        assert_eq!(selected.x[(2, 0)], 6.0);
        assert_eq!(selected.y, dataset.y);
    }

    #[test]
    fn test_split_on_mask() {
        let dataset = sample_dataset();
        let (left, right) = dataset.split_on_mask(&[true, false, true, false]);
        assert_eq!(left.nrows(), 2);
        assert_eq!(right.nrows(), 2);
        assert_eq!(left.y[(1, 0)], 11.0);
        assert_eq!(right.y[(0, 0)], 10.0);
    }

    #[test]
    fn test_split_on_mask_left_empty() {
        let dataset = sample_dataset();
        let (left, right) = dataset.split_on_mask(&[false; 4]);
        assert_eq!(left.nrows(), 0);
        assert_eq!(left.x.ncols(), 2);
        assert_eq!(right.nrows(), 4);
    }

    #[test]
    fn test_bootstrap_with_seed() {
        let dataset = sample_dataset();
        let first = dataset.bootstrap(&mut StdRng::seed_from_u64(1000));
        let second = dataset.bootstrap(&mut StdRng::seed_from_u64(1000));
        assert_eq!(first.nrows(), 4);
        assert_eq!(first, second);
        for i in 0..first.nrows() {
            // rows stay aligned with their outputs
            assert_eq!(first.y[(i, 0)], first.x[(i, 0)] / 2.0 + 8.5);
        }
    }
}
