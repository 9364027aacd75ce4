//! Errors raised while configuring or growing a tree.
use thiserror::Error;

/// Invalid tree configuration.
///
/// Every variant is detected before the first node is expanded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown split criterion '{0}', expected one of 'gini', 'info' or 'mse'")]
    UnknownCriterion(String),

    #[error("unknown tie-break policy '{0}', expected 'rand' or 'first'")]
    UnknownTieBreak(String),

    #[error("unknown gain combination '{0}', expected 'mean' or 'max'")]
    UnknownGainCombination(String),

    #[error("unknown maximum depth '{0}', expected 'stack' or a non-negative integer")]
    UnknownMaxDepth(String),

    #[error("the minimum number of points to split must be at least 2, got {0}")]
    MinPointsForSplit(usize),

    #[error("the minimum number of points per leaf must be at least 1, got {0}")]
    MinPointsLeaf(usize),

    #[error("the number of features sampled per node must be at least 1")]
    FeaturesPerNode,

    #[error("{name} must be a finite, non-negative number")]
    Tolerance { name: &'static str },

    #[error("split criterion '{criterion}' cannot be used for {task}")]
    CriterionTaskMismatch {
        criterion: &'static str,
        task: &'static str,
    },

    #[error("expected {expected} task weights, got {actual}")]
    TaskWeights { expected: usize, actual: usize },

    #[error("task ids must start at 0 and be strictly increasing offsets below {n_outputs}")]
    TaskIds { n_outputs: usize },

    #[error("output scaling has {actual} entries but there are {expected} outputs")]
    OutputScaling { expected: usize, actual: usize },

    #[error("feature expansion needs at least one feature and a positive length scale")]
    FeatureExpansion,
}

/// Failure of a tree growth call.
#[derive(Debug, Error)]
pub enum GrowError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot grow a tree from an empty dataset")]
    EmptyInput,

    #[error("features have {x_rows} rows but outputs have {y_rows}")]
    RowMismatch { x_rows: usize, y_rows: usize },

    #[error("feature groups describe {groups} columns but the features have {columns}")]
    GroupMismatch { groups: usize, columns: usize },

    #[error("projection engine failed: {0}")]
    Projection(String),

    #[error("projection expects {expected} input columns but the node provides {actual}")]
    ProjectionShape { expected: usize, actual: usize },

    /// The selected split sends every row to the same side.
    #[error("selected split at depth {depth} leaves {left} rows left and {right} rows right")]
    EmptyPartition {
        depth: usize,
        left: usize,
        right: usize,
    },

    #[error("tree assembly found an unfinished node")]
    Incomplete,
}
