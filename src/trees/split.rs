//! Threshold search along projected directions.
use super::params::{GainCombination, SplitCriterion, Task, TreeConfig};
use super::ties::max_with_ties;
use crate::data::dataset::{count, real, RealNumber};
use crate::data::stats::column_sums;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::ops::Range;

/// Best threshold found across all candidate directions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SplitChoice<T: RealNumber> {
    /// Index into the searched directions.
    pub direction: usize,
    /// Number of sorted points that go left.
    pub threshold: usize,
    pub gain: T,
    pub partition_point: T,
}

/// Gains of every threshold along one direction.
struct GainProfile<T: RealNumber> {
    sorted: Vec<T>,
    /// `gains[l - 1]` is the gain of sending the first `l` sorted points left.
    gains: Vec<T>,
}

pub(crate) struct SplitSearch<'a, T: RealNumber> {
    config: &'a TreeConfig<T>,
    task: Task,
}

impl<'a, T: RealNumber> SplitSearch<'a, T> {
    pub fn new(config: &'a TreeConfig<T>, task: Task) -> Self {
        Self { config, task }
    }

    /// Finds the best `(direction, threshold)` pair for outputs `y`.
    ///
    /// Each direction holds one projected value per row of `y`. Returns `None`
    /// when no threshold is valid or the best gain is negative.
    pub fn best_split<R: Rng + ?Sized>(
        &self,
        directions: &[DVector<T>],
        y: &DMatrix<T>,
        rng: &mut R,
    ) -> Option<SplitChoice<T>> {
        if y.nrows() < 2 || directions.is_empty() {
            return None;
        }

        let profiles: Vec<GainProfile<T>> = directions
            .par_iter()
            .map(|values| self.gain_profile(values, y))
            .collect();

        let epsilon = self.config.tie_epsilon;
        let best: Vec<(T, usize)> = profiles
            .iter()
            .map(|profile| match max_with_ties(&profile.gains, epsilon) {
                Some((gain, ties)) => (gain, self.config.tie_break.choose(&ties, rng) + 1),
                None => (T::nan(), 0),
            })
            .collect();

        let gains: Vec<T> = best.iter().map(|&(gain, _)| gain).collect();
        let (best_gain, ties) = max_with_ties(&gains, epsilon)?;
        if best_gain < T::zero() {
            return None;
        }
        let direction = self.config.tie_break.choose(&ties, rng);
        let (gain, threshold) = best[direction];

        let sorted = &profiles[direction].sorted;
        let lower = sorted[threshold - 1];
        let upper = sorted[threshold];
        Some(SplitChoice {
            direction,
            threshold,
            gain,
            partition_point: lower + (upper - lower) / real(2.0),
        })
    }

    fn gain_profile(&self, values: &DVector<T>, y: &DMatrix<T>) -> GainProfile<T> {
        let n = values.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let sorted: Vec<T> = order.iter().map(|&i| values[i]).collect();

        let per_task = match self.task {
            Task::Classification => self.classification_gains(&order, y),
            Task::Regression => regression_gains(&order, y),
        };
        let weights = self
            .config
            .task_weights
            .as_ref()
            .filter(|weights| weights.len() == per_task.len());

        let min_leaf = self.config.min_points_leaf;
        let gains = (1..n)
            .map(|left| {
                let separated = sorted[left] - sorted[left - 1] > self.config.x_variation_tol;
                if left < min_leaf || n - left < min_leaf || !separated {
                    return T::neg_infinity();
                }
                let task_gains = per_task.iter().enumerate().map(|(task, gains)| {
                    let gain = gains[left - 1];
                    weights.map_or(gain, |weights| gain * weights[task])
                });
                self.combine(task_gains, per_task.len())
            })
            .collect();

        GainProfile { sorted, gains }
    }

    fn combine<I: Iterator<Item = T>>(&self, gains: I, n_tasks: usize) -> T {
        match self.config.gain_combination {
            GainCombination::Mean => gains.fold(T::zero(), |acc, gain| acc + gain) / count(n_tasks),
            GainCombination::Max => gains.fold(T::neg_infinity(), T::max),
        }
    }

    /// Per-task gains of every threshold, from cumulative class counts.
    fn classification_gains(&self, order: &[usize], y: &DMatrix<T>) -> Vec<Vec<T>> {
        let n = order.len();
        let total = count::<T>(n);
        let tasks = self.task_columns(y.ncols());
        let totals = column_sums(y);
        let parent: Vec<T> = tasks
            .iter()
            .map(|columns| self.class_metric(totals.as_slice(), total, columns.clone()))
            .collect();

        let mut left_sums = vec![T::zero(); y.ncols()];
        let mut right_sums = vec![T::zero(); y.ncols()];
        let mut gains = vec![Vec::new(); tasks.len()];
        for left in 1..n {
            let row = order[left - 1];
            for column in 0..y.ncols() {
                left_sums[column] += y[(row, column)];
                right_sums[column] = totals[column] - left_sums[column];
            }
            let n_left = count::<T>(left);
            let n_right = count::<T>(n - left);
            for (task, columns) in tasks.iter().enumerate() {
                let metric_left = self.class_metric(&left_sums, n_left, columns.clone());
                let metric_right = self.class_metric(&right_sums, n_right, columns.clone());
                gains[task].push(parent[task] - (n_left * metric_left + n_right * metric_right) / total);
            }
        }
        gains
    }

    /// Output columns of each classification task.
    fn task_columns(&self, n_outputs: usize) -> Vec<Range<usize>> {
        match &self.config.task_ids {
            Some(ids) => ids
                .iter()
                .enumerate()
                .map(|(task, &start)| start..ids.get(task + 1).copied().unwrap_or(n_outputs))
                .collect(),
            None => vec![0..n_outputs],
        }
    }

    fn class_metric(&self, sums: &[T], n: T, columns: Range<usize>) -> T {
        // A lone indicator column, or separately predicted outputs, stand for
        // an absent/present pair.
        let paired = self.config.separate_outputs || sums.len() == 1;
        columns
            .map(|column| {
                let p = sums[column] / n;
                if paired {
                    self.class_term(p) + self.class_term(T::one() - p)
                } else {
                    self.class_term(p)
                }
            })
            .fold(T::zero(), |acc, term| acc + term)
    }

    fn class_term(&self, p: T) -> T {
        match self.config.split_criterion {
            SplitCriterion::Gini => -(p * p),
            SplitCriterion::Info if p > T::zero() => -(p * p.log2()),
            _ => T::zero(),
        }
    }
}

/// Per-output gains of every threshold, from running variances.
fn regression_gains<T: RealNumber>(order: &[usize], y: &DMatrix<T>) -> Vec<Vec<T>> {
    let n = order.len();
    let total = count::<T>(n);
    y.column_iter()
        .map(|column| {
            let sorted: Vec<T> = order.iter().map(|&row| column[row]).collect();
            let left = running_mse(sorted.iter().copied());
            let right = running_mse(sorted.iter().rev().copied());
            let parent = left[n - 1];
            (1..n)
                .map(|l| {
                    let n_left = count::<T>(l);
                    let n_right = count::<T>(n - l);
                    parent - (n_left * left[l - 1] + n_right * right[n - l - 1]) / total
                })
                .collect()
        })
        .collect()
}

/// `result[i]` is the population variance of the first `i + 1` values.
fn running_mse<T: RealNumber, I: Iterator<Item = T>>(values: I) -> Vec<T> {
    let mut sum = T::zero();
    let mut sum_sq = T::zero();
    values
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            sum_sq += value * value;
            let n = count::<T>(i + 1);
            let mean = sum / n;
            sum_sq / n - mean * mean
        })
        .collect()
}
