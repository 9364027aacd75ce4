//! Feature groups and per-node feature sampling.
use crate::data::dataset::{select_columns, RealNumber};
use crate::data::stats::columns_vary;
use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use rand::Rng;

/// Maps each input column to a group; columns of a group are sampled together.
///
/// Columns found constant at a node are excluded for that node's subtree.
/// The map is a plain value: every node works on its own copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureGroups {
    group_of: Vec<usize>,
    excluded: Vec<bool>,
}

impl FeatureGroups {
    pub fn new(group_of: Vec<usize>) -> Self {
        let excluded = vec![false; group_of.len()];
        Self { group_of, excluded }
    }

    /// One group per column.
    pub fn ungrouped(n_features: usize) -> Self {
        Self::new((0..n_features).collect())
    }

    pub fn n_features(&self) -> usize {
        self.group_of.len()
    }

    pub fn is_excluded(&self, column: usize) -> bool {
        self.excluded[column]
    }

    /// Groups that still have at least one usable column, in increasing order.
    pub fn eligible_groups(&self) -> Vec<usize> {
        let mut groups: Vec<usize> = self
            .group_of
            .iter()
            .zip(&self.excluded)
            .filter(|(_, &excluded)| !excluded)
            .map(|(&group, _)| group)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Usable columns belonging to any of `groups`, in increasing order.
    pub fn columns_of(&self, groups: &[usize]) -> Vec<usize> {
        (0..self.n_features())
            .filter(|&column| !self.excluded[column] && groups.contains(&self.group_of[column]))
            .collect()
    }

    pub fn exclude(&mut self, columns: &[usize]) {
        for &column in columns {
            self.excluded[column] = true;
        }
    }

    fn group_of(&self, column: usize) -> usize {
        self.group_of[column]
    }
}

/// Draws `lambda` feature groups and keeps their columns that vary on `x`.
///
/// Groups whose drawn columns are all constant are replaced by fresh draws
/// until `lambda` groups contribute a varying column or no groups remain.
/// Constant columns are excluded in `groups`. The returned columns are sorted
/// and may be empty.
pub(crate) fn sample_features<T: RealNumber, R: Rng + ?Sized>(
    x: &DMatrix<T>,
    groups: &mut FeatureGroups,
    lambda: usize,
    tol: T,
    rng: &mut R,
) -> Vec<usize> {
    let mut candidates = groups.eligible_groups();
    let mut selected: Vec<usize> = Vec::new();
    let mut satisfied = 0;
    let mut quota = lambda.min(candidates.len());

    while quota > 0 {
        let drawn: Vec<usize> = candidates.choose_multiple(rng, quota).copied().collect();
        let columns = groups.columns_of(&drawn);
        let varies = columns_vary(&select_columns(x, &columns), tol);

        let (varying, constant): (Vec<(usize, bool)>, Vec<(usize, bool)>) = columns
            .iter()
            .copied()
            .zip(varies)
            .partition(|&(_, varies)| varies);
        let varying: Vec<usize> = varying.into_iter().map(|(column, _)| column).collect();
        let constant: Vec<usize> = constant.into_iter().map(|(column, _)| column).collect();

        satisfied += drawn
            .iter()
            .filter(|&&group| varying.iter().any(|&column| groups.group_of(column) == group))
            .count();
        selected.extend(varying);

        if constant.is_empty() {
            break;
        }
        groups.exclude(&constant);
        candidates.retain(|group| !drawn.contains(group));
        quota = lambda.saturating_sub(satisfied).min(candidates.len());
    }

    selected.sort_unstable();
    selected
}
