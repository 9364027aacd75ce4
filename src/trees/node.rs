use crate::data::dataset::{select_columns, RealNumber};
use crate::projection::FeatureExpansion;
use nalgebra::{DMatrix, DVector};

/// Linear rule that maps a node's selected columns to a scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum DecisionRule<T: RealNumber> {
    Linear {
        projection: DVector<T>,
    },
    Expanded {
        expansion: FeatureExpansion<T>,
        projection: DVector<T>,
    },
}

impl<T: RealNumber> DecisionRule<T> {
    pub fn projection(&self) -> &DVector<T> {
        match self {
            DecisionRule::Linear { projection } | DecisionRule::Expanded { projection, .. } => {
                projection
            }
        }
    }

    /// Projects each row of `x`, which holds only the node's selected columns.
    pub fn project(&self, x: &DMatrix<T>) -> DVector<T> {
        match self {
            DecisionRule::Linear { projection } => x * projection,
            DecisionRule::Expanded {
                expansion,
                projection,
            } => expansion.apply(x) * projection,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode<T: RealNumber> {
    pub n_points: usize,
    pub mean: DVector<T>,
    /// Only present for regression trees.
    pub std_dev: Option<DVector<T>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InternalNode<T: RealNumber> {
    pub n_points: usize,
    pub mean: DVector<T>,
    /// Input columns the rule reads, in increasing order.
    pub features: Vec<usize>,
    pub rule: DecisionRule<T>,
    pub partition_point: T,
    /// Rows whose projection is at most `partition_point`.
    pub left: Box<TreeNode<T>>,
    pub right: Box<TreeNode<T>>,
}

impl<T: RealNumber> InternalNode<T> {
    /// `true` for rows of the full feature matrix `x` that go to the left child.
    pub fn split_mask(&self, x: &DMatrix<T>) -> Vec<bool> {
        split_mask(&self.rule, &self.features, self.partition_point, x)
    }
}

pub(crate) fn split_mask<T: RealNumber>(
    rule: &DecisionRule<T>,
    features: &[usize],
    partition_point: T,
    x: &DMatrix<T>,
) -> Vec<bool> {
    rule.project(&select_columns(x, features))
        .iter()
        .map(|&value| value <= partition_point)
        .collect()
}

/// Decision tree node
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode<T: RealNumber> {
    Leaf(LeafNode<T>),
    Internal(InternalNode<T>),
}

impl<T: RealNumber> TreeNode<T> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf(_))
    }

    pub fn n_points(&self) -> usize {
        match self {
            TreeNode::Leaf(leaf) => leaf.n_points,
            TreeNode::Internal(node) => node.n_points,
        }
    }

    pub fn mean(&self) -> &DVector<T> {
        match self {
            TreeNode::Leaf(leaf) => &leaf.mean,
            TreeNode::Internal(node) => &node.mean,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.fold(|_| 1, |left, right| 1 + left + right)
    }

    pub fn n_leaves(&self) -> usize {
        self.fold(|_| 1, |left, right| left + right)
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.fold(|_| 0, |left, right| 1 + left.max(right))
    }

    /// Visits leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<&LeafNode<T>> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                TreeNode::Leaf(leaf) => leaves.push(leaf),
                TreeNode::Internal(internal) => {
                    stack.push(&*internal.right);
                    stack.push(&*internal.left);
                }
            }
        }
        leaves
    }

    // Post-order fold without recursion, so very deep trees don't exhaust the stack.
    fn fold<F, G>(&self, leaf: F, internal: G) -> usize
    where
        F: Fn(&LeafNode<T>) -> usize,
        G: Fn(usize, usize) -> usize,
    {
        let mut results: Vec<usize> = Vec::new();
        let mut stack: Vec<(&TreeNode<T>, bool)> = vec![(self, false)];
        while let Some((node, children_done)) = stack.pop() {
            match node {
                TreeNode::Leaf(node) => results.push(leaf(node)),
                TreeNode::Internal(_) if children_done => {
                    let right = results.pop().unwrap_or(0);
                    let left = results.pop().unwrap_or(0);
                    results.push(internal(left, right));
                }
                TreeNode::Internal(internal_node) => {
                    stack.push((node, true));
                    stack.push((&*internal_node.right, false));
                    stack.push((&*internal_node.left, false));
                }
            }
        }
        results.pop().unwrap_or(0)
    }
}
