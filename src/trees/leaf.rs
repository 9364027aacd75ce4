//! Terminal node statistics.
use super::node::{LeafNode, TreeNode};
use super::params::{OutputScaling, Task};
use crate::data::dataset::RealNumber;
use crate::data::stats::{column_means, column_std_devs};
use nalgebra::{DMatrix, DVector};

/// Builds leaves and node means in the original output units.
pub(crate) struct LeafFactory<'a, T: RealNumber> {
    task: Task,
    scaling: &'a OutputScaling<T>,
}

impl<'a, T: RealNumber> LeafFactory<'a, T> {
    pub fn new(task: Task, scaling: &'a OutputScaling<T>) -> Self {
        Self { task, scaling }
    }

    pub fn leaf(&self, y: &DMatrix<T>) -> TreeNode<T> {
        let std_dev = match self.task {
            Task::Regression => Some(self.rescale(column_std_devs(y))),
            Task::Classification => None,
        };
        TreeNode::Leaf(LeafNode {
            n_points: y.nrows(),
            mean: self.mean(y),
            std_dev,
        })
    }

    /// Class proportions, or the de-standardised regression mean.
    pub fn mean(&self, y: &DMatrix<T>) -> DVector<T> {
        let mean = column_means(y);
        match self.task {
            Task::Regression => {
                let mean = self.rescale(mean);
                match &self.scaling.offset {
                    Some(offset) => mean + offset,
                    None => mean,
                }
            }
            Task::Classification => mean,
        }
    }

    fn rescale(&self, values: DVector<T>) -> DVector<T> {
        match &self.scaling.scale {
            Some(scale) => values.component_mul(scale),
            None => values,
        }
    }
}
