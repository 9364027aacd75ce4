use crate::data::dataset::{real, RealNumber};
use crate::error::ConfigError;
use nalgebra::DVector;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Whether outputs are one-hot class indicators or real-valued targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    Classification,
    Regression,
}

impl Task {
    pub fn is_regression(&self) -> bool {
        matches!(self, Task::Regression)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Task::Classification => write!(f, "classification"),
            Task::Regression => write!(f, "regression"),
        }
    }
}

/// Depth limit of a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxDepth {
    /// Nodes deeper than this become leaves.
    Limited(usize),
    /// Grow until another stopping rule fires, subject to the depth ceiling.
    Unbounded,
}

impl FromStr for MaxDepth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stack" | "unbounded" => Ok(MaxDepth::Unbounded),
            other => other
                .parse::<usize>()
                .map(MaxDepth::Limited)
                .map_err(|_| ConfigError::UnknownMaxDepth(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitCriterion {
    Gini,
    Info,
    Mse,
}

impl SplitCriterion {
    pub fn name(&self) -> &'static str {
        match self {
            SplitCriterion::Gini => "gini",
            SplitCriterion::Info => "info",
            SplitCriterion::Mse => "mse",
        }
    }

    fn supports(&self, task: Task) -> bool {
        match self {
            SplitCriterion::Gini | SplitCriterion::Info => task == Task::Classification,
            SplitCriterion::Mse => task == Task::Regression,
        }
    }
}

impl FromStr for SplitCriterion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitCriterion::Gini),
            "info" | "entropy" => Ok(SplitCriterion::Info),
            "mse" => Ok(SplitCriterion::Mse),
            _ => Err(ConfigError::UnknownCriterion(s.to_string())),
        }
    }
}

/// How to choose among candidates whose gain ties with the maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
    Random,
    First,
}

impl FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rand" | "random" => Ok(TieBreak::Random),
            "first" => Ok(TieBreak::First),
            _ => Err(ConfigError::UnknownTieBreak(s.to_string())),
        }
    }
}

/// How per-task gains are merged into one split score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainCombination {
    Mean,
    Max,
}

impl FromStr for GainCombination {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(GainCombination::Mean),
            "max" => Ok(GainCombination::Max),
            _ => Err(ConfigError::UnknownGainCombination(s.to_string())),
        }
    }
}

/// Parameters of a random Fourier feature expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpansionParams<T: RealNumber> {
    pub n_features: usize,
    pub length_scale: T,
    pub include_original: bool,
    /// Ridge penalty for engines that fit the expanded features. The
    /// built-in engines pass it through unused.
    pub reg_lambda: T,
}

impl<T: RealNumber> Default for ExpansionParams<T> {
    fn default() -> Self {
        Self {
            n_features: 50,
            length_scale: real(0.1),
            include_original: false,
            reg_lambda: real(1e-3),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProjectionMode<T: RealNumber> {
    /// Project the selected columns directly.
    Components,
    /// Expand the selected columns with random features before projecting.
    FeatureExpansion(ExpansionParams<T>),
}

/// Settings handed to the projection engine at every node.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionOptions<T: RealNumber> {
    pub mode: ProjectionMode<T>,
    /// Search regression splits in the engine's output-component space.
    pub use_output_components: bool,
    /// Regularisation for engines that estimate covariances, such as canonical
    /// correlation engines. Validated here; [`AxisAlignedProjection`] ignores it.
    ///
    /// [`AxisAlignedProjection`]: crate::projection::AxisAlignedProjection
    pub epsilon: T,
}

impl<T: RealNumber> Default for ProjectionOptions<T> {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::Components,
            use_output_components: false,
            epsilon: real(1e-4),
        }
    }
}

/// Inverse of the output standardisation applied before growth.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputScaling<T: RealNumber> {
    pub scale: Option<DVector<T>>,
    pub offset: Option<DVector<T>>,
}

impl<T: RealNumber> Default for OutputScaling<T> {
    fn default() -> Self {
        Self {
            scale: None,
            offset: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeConfig<T: RealNumber> {
    pub min_points_for_split: usize,
    pub min_points_leaf: usize,
    pub max_depth: MaxDepth,
    /// Depth at which unbounded growth is cut off.
    pub depth_ceiling: usize,
    /// Fraction of the root variance below which a regression node is a leaf.
    pub mse_error_tolerance: T,
    pub x_variation_tol: T,
    /// Feature groups drawn per node; `None` uses `ceil(log2(groups) + 1)`.
    pub features_per_node: Option<usize>,
    pub split_criterion: SplitCriterion,
    pub projection: ProjectionOptions<T>,
    pub tie_break: TieBreak,
    pub gain_combination: GainCombination,
    pub task_weights: Option<Vec<T>>,
    /// Start column of each classification task.
    pub task_ids: Option<Vec<usize>>,
    /// Treat each classification output as its own binary problem.
    pub separate_outputs: bool,
    pub projection_bootstrap: bool,
    pub continue_on_degenerate_bag: bool,
    pub output_scaling: OutputScaling<T>,
    /// Per-output variance of the root; computed from the data when unset.
    pub mse_total: Option<DVector<T>>,
    pub tie_epsilon: T,
}

impl<T: RealNumber> Default for TreeConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealNumber> TreeConfig<T> {
    pub fn new() -> Self {
        Self {
            min_points_for_split: 2,
            min_points_leaf: 1,
            max_depth: MaxDepth::Unbounded,
            depth_ceiling: 490,
            mse_error_tolerance: real(1e-6),
            x_variation_tol: real(1e-10),
            features_per_node: None,
            split_criterion: SplitCriterion::Info,
            projection: ProjectionOptions::default(),
            tie_break: TieBreak::First,
            gain_combination: GainCombination::Mean,
            task_weights: None,
            task_ids: None,
            separate_outputs: false,
            projection_bootstrap: true,
            continue_on_degenerate_bag: true,
            output_scaling: OutputScaling::default(),
            mse_total: None,
            tie_epsilon: T::epsilon() * real::<T>(10.0),
        }
    }

    /// Default settings with the criterion conventional for `task`.
    pub fn for_task(task: Task) -> Self {
        let mut config = Self::new();
        config.split_criterion = match task {
            Task::Classification => SplitCriterion::Info,
            Task::Regression => SplitCriterion::Mse,
        };
        config
    }

    pub fn set_min_points_for_split(&mut self, min_points: usize) -> Result<(), ConfigError> {
        if min_points < 2 {
            return Err(ConfigError::MinPointsForSplit(min_points));
        }
        self.min_points_for_split = min_points;
        Ok(())
    }

    pub fn set_min_points_leaf(&mut self, min_points: usize) -> Result<(), ConfigError> {
        if min_points < 1 {
            return Err(ConfigError::MinPointsLeaf(min_points));
        }
        self.min_points_leaf = min_points;
        Ok(())
    }

    pub fn set_max_depth(&mut self, max_depth: &str) -> Result<(), ConfigError> {
        self.max_depth = max_depth.parse()?;
        Ok(())
    }

    pub fn set_features_per_node(&mut self, lambda: Option<usize>) -> Result<(), ConfigError> {
        if lambda == Some(0) {
            return Err(ConfigError::FeaturesPerNode);
        }
        self.features_per_node = lambda;
        Ok(())
    }

    pub fn set_criterion(&mut self, criterion: &str) -> Result<(), ConfigError> {
        self.split_criterion = criterion.parse()?;
        Ok(())
    }

    pub fn set_tie_break(&mut self, tie_break: &str) -> Result<(), ConfigError> {
        self.tie_break = tie_break.parse()?;
        Ok(())
    }

    pub fn set_gain_combination(&mut self, combination: &str) -> Result<(), ConfigError> {
        self.gain_combination = combination.parse()?;
        Ok(())
    }

    pub fn set_mse_error_tolerance(&mut self, tolerance: T) -> Result<(), ConfigError> {
        check_tolerance("mse_error_tolerance", tolerance)?;
        self.mse_error_tolerance = tolerance;
        Ok(())
    }

    pub fn set_x_variation_tol(&mut self, tolerance: T) -> Result<(), ConfigError> {
        check_tolerance("x_variation_tol", tolerance)?;
        self.x_variation_tol = tolerance;
        Ok(())
    }

    /// Checks the settings that don't depend on the data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_points_for_split < 2 {
            return Err(ConfigError::MinPointsForSplit(self.min_points_for_split));
        }
        if self.min_points_leaf < 1 {
            return Err(ConfigError::MinPointsLeaf(self.min_points_leaf));
        }
        if self.features_per_node == Some(0) {
            return Err(ConfigError::FeaturesPerNode);
        }
        check_tolerance("mse_error_tolerance", self.mse_error_tolerance)?;
        check_tolerance("x_variation_tol", self.x_variation_tol)?;
        check_tolerance("tie_epsilon", self.tie_epsilon)?;
        check_tolerance("projection.epsilon", self.projection.epsilon)?;
        if let ProjectionMode::FeatureExpansion(params) = &self.projection.mode {
            let positive_scale = params.length_scale.is_finite() && params.length_scale > T::zero();
            if params.n_features == 0 || !positive_scale {
                return Err(ConfigError::FeatureExpansion);
            }
        }
        Ok(())
    }

    /// Checks the settings against the task and the number of output columns.
    pub fn validate_for(&self, task: Task, n_outputs: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if !self.split_criterion.supports(task) {
            return Err(ConfigError::CriterionTaskMismatch {
                criterion: self.split_criterion.name(),
                task: match task {
                    Task::Classification => "classification",
                    Task::Regression => "regression",
                },
            });
        }

        let n_tasks = match task {
            Task::Regression => n_outputs,
            Task::Classification => match &self.task_ids {
                Some(ids) => {
                    let starts_at_zero = ids.first() == Some(&0);
                    let increasing = ids.windows(2).all(|pair| pair[0] < pair[1]);
                    let in_range = ids.iter().all(|&id| id < n_outputs);
                    if !(starts_at_zero && increasing && in_range) {
                        return Err(ConfigError::TaskIds { n_outputs });
                    }
                    ids.len()
                }
                None => 1,
            },
        };
        if let Some(weights) = &self.task_weights {
            if weights.len() != n_tasks {
                return Err(ConfigError::TaskWeights {
                    expected: n_tasks,
                    actual: weights.len(),
                });
            }
        }

        if task.is_regression() {
            let scaling = [&self.output_scaling.scale, &self.output_scaling.offset];
            for vector in scaling.into_iter().flatten() {
                if vector.len() != n_outputs {
                    return Err(ConfigError::OutputScaling {
                        expected: n_outputs,
                        actual: vector.len(),
                    });
                }
            }
            if let Some(mse_total) = &self.mse_total {
                if mse_total.len() != n_outputs {
                    return Err(ConfigError::OutputScaling {
                        expected: n_outputs,
                        actual: mse_total.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of feature groups to draw at a node, given the number of groups.
    pub(crate) fn lambda(&self, n_groups: usize) -> usize {
        match self.features_per_node {
            Some(lambda) => lambda,
            None if n_groups <= 1 => 1,
            None => ((n_groups as f64).log2() + 1.0).ceil() as usize,
        }
    }
}

fn check_tolerance<T: RealNumber>(name: &'static str, value: T) -> Result<(), ConfigError> {
    if !value.is_finite() || value < T::zero() {
        return Err(ConfigError::Tolerance { name });
    }
    Ok(())
}
