use super::bootstrap::{below_tolerance, draw_bag};
use super::features::{sample_features, FeatureGroups};
use super::leaf::LeafFactory;
use super::node::{split_mask, DecisionRule, InternalNode, TreeNode};
use super::params::{MaxDepth, SplitCriterion, Task, TreeConfig};
use super::split::SplitSearch;
use crate::data::dataset::{count, Dataset, RealNumber};
use crate::data::stats::{column_sums, column_variances, has_at_most_two_unique_rows, varies};
use crate::error::{ConfigError, GrowError};
use crate::projection::{
    AxisAlignedProjection, MaxMarginSplitter, Projection, ProjectionEngine, TwoPointSplitter,
};
use log::{debug, trace, warn};
use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// Grows oblique decision trees.
///
/// Split directions come from the projection engine `P`; samples with at most
/// two distinct rows are split by the two-point solver `S` instead.
#[derive(Clone, Debug)]
pub struct TreeGrower<T: RealNumber, P, S> {
    config: TreeConfig<T>,
    projector: P,
    two_point: S,
}

impl<T: RealNumber> TreeGrower<T, AxisAlignedProjection, MaxMarginSplitter> {
    /// A grower that splits along the input axes.
    pub fn axis_aligned(config: TreeConfig<T>) -> Result<Self, ConfigError> {
        Self::new(config, AxisAlignedProjection, MaxMarginSplitter)
    }
}

/// A node waiting to be expanded.
struct PendingNode<T: RealNumber> {
    slot: usize,
    data: Dataset<T>,
    groups: FeatureGroups,
    depth: usize,
}

/// Arena entry; children always sit at higher indices than their parent.
enum Slot<T: RealNumber> {
    Pending,
    Done(TreeNode<T>),
    Split(SplitNode<T>, usize, usize),
}

struct SplitNode<T: RealNumber> {
    n_points: usize,
    mean: DVector<T>,
    features: Vec<usize>,
    rule: DecisionRule<T>,
    partition_point: T,
}

enum Expansion<T: RealNumber> {
    Leaf(&'static str),
    Split {
        node: SplitNode<T>,
        left: Dataset<T>,
        right: Dataset<T>,
    },
}

/// State shared by every node of one growth call.
struct Growth<'a, T: RealNumber> {
    task: Task,
    baseline: DVector<T>,
    lambda: usize,
    leaves: LeafFactory<'a, T>,
    search: SplitSearch<'a, T>,
}

impl<T, P, S> TreeGrower<T, P, S>
where
    T: RealNumber,
    P: ProjectionEngine<T>,
    S: TwoPointSplitter<T>,
{
    pub fn new(config: TreeConfig<T>, projector: P, two_point: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            projector,
            two_point,
        })
    }

    pub fn config(&self) -> &TreeConfig<T> {
        &self.config
    }

    /// Grows a tree on `x` (one column per feature) and `y` (one-hot classes
    /// or regression targets).
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::DMatrix;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use rusty_cct::trees::{FeatureGroups, Task, TreeConfig, TreeGrower};
    ///
    /// let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
    /// let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
    ///
    /// let mut config = TreeConfig::for_task(Task::Regression);
    /// config.projection_bootstrap = false;
    /// let grower = TreeGrower::axis_aligned(config).unwrap();
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let tree = grower
    ///     .grow(&x, &y, Task::Regression, &FeatureGroups::ungrouped(1), &mut rng)
    ///     .unwrap();
    /// assert_eq!(tree.n_leaves(), 2);
    /// ```
    pub fn grow<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<T>,
        y: &DMatrix<T>,
        task: Task,
        groups: &FeatureGroups,
        rng: &mut R,
    ) -> Result<TreeNode<T>, GrowError> {
        self.grow_at_depth(x, y, task, groups, 0, rng)
    }

    /// Like [`grow`](Self::grow), with the root placed at `depth`.
    pub fn grow_at_depth<R: Rng + ?Sized>(
        &self,
        x: &DMatrix<T>,
        y: &DMatrix<T>,
        task: Task,
        groups: &FeatureGroups,
        depth: usize,
        rng: &mut R,
    ) -> Result<TreeNode<T>, GrowError> {
        if x.nrows() == 0 || y.ncols() == 0 {
            return Err(GrowError::EmptyInput);
        }
        if x.nrows() != y.nrows() {
            return Err(GrowError::RowMismatch {
                x_rows: x.nrows(),
                y_rows: y.nrows(),
            });
        }
        if groups.n_features() != x.ncols() {
            return Err(GrowError::GroupMismatch {
                groups: groups.n_features(),
                columns: x.ncols(),
            });
        }
        self.config.validate_for(task, y.ncols())?;

        let growth = Growth {
            task,
            baseline: self
                .config
                .mse_total
                .clone()
                .unwrap_or_else(|| column_variances(y)),
            lambda: self.config.lambda(groups.eligible_groups().len()),
            leaves: LeafFactory::new(task, &self.config.output_scaling),
            search: SplitSearch::new(&self.config, task),
        };

        let mut slots: Vec<Slot<T>> = vec![Slot::Pending];
        let mut pending = vec![PendingNode {
            slot: 0,
            data: Dataset::new(x.clone(), y.clone()),
            groups: groups.clone(),
            depth,
        }];

        while let Some(PendingNode {
            slot,
            data,
            mut groups,
            depth,
        }) = pending.pop()
        {
            match self.expand(&growth, &data, &mut groups, depth, rng)? {
                Expansion::Leaf(reason) => {
                    trace!("leaf with {} points at depth {}: {}", data.nrows(), depth, reason);
                    slots[slot] = Slot::Done(growth.leaves.leaf(&data.y));
                }
                Expansion::Split { node, left, right } => {
                    let (left_slot, right_slot) = (slots.len(), slots.len() + 1);
                    slots.push(Slot::Pending);
                    slots.push(Slot::Pending);
                    slots[slot] = Slot::Split(node, left_slot, right_slot);

                    // Right first, so the left subtree is expanded (and draws
                    // from `rng`) before the right one.
                    pending.push(PendingNode {
                        slot: right_slot,
                        data: right,
                        groups: groups.clone(),
                        depth: depth + 1,
                    });
                    pending.push(PendingNode {
                        slot: left_slot,
                        data: left,
                        groups,
                        depth: depth + 1,
                    });
                }
            }
        }

        let tree = assemble(slots)?;
        debug!(
            "grew a {} tree on {} points: {} nodes, {} leaves, depth {}",
            task,
            x.nrows(),
            tree.n_nodes(),
            tree.n_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    fn expand<R: Rng + ?Sized>(
        &self,
        growth: &Growth<'_, T>,
        node: &Dataset<T>,
        groups: &mut FeatureGroups,
        depth: usize,
        rng: &mut R,
    ) -> Result<Expansion<T>, GrowError> {
        let config = &self.config;
        let n = node.nrows();

        let min_points = 2usize
            .max(config.min_points_for_split)
            .max(2 * config.min_points_leaf);
        if n < min_points {
            return Ok(Expansion::Leaf("too few points"));
        }
        match config.max_depth {
            MaxDepth::Limited(max_depth) if depth > max_depth => {
                return Ok(Expansion::Leaf("maximum depth"));
            }
            MaxDepth::Unbounded if depth > config.depth_ceiling => {
                warn!(
                    "tree depth {} exceeds the ceiling of {}, stopping growth on this branch",
                    depth, config.depth_ceiling
                );
                return Ok(Expansion::Leaf("depth ceiling"));
            }
            _ => {}
        }
        match growth.task {
            Task::Classification => {
                let n_points = count::<T>(n);
                let mixed = column_sums(&node.y)
                    .iter()
                    .any(|&sum| sum > T::zero() && sum < n_points);
                if !mixed {
                    return Ok(Expansion::Leaf("pure"));
                }
            }
            Task::Regression => {
                if below_tolerance(&node.y, &growth.baseline, config.mse_error_tolerance) {
                    return Ok(Expansion::Leaf("output variance below tolerance"));
                }
            }
        }

        let features = sample_features(&node.x, groups, growth.lambda, config.x_variation_tol, rng);
        if features.is_empty() {
            return Ok(Expansion::Leaf("no varying features"));
        }
        let selected = node.select_features(&features);
        let bag = match draw_bag(&selected, growth.task, config, &growth.baseline, rng) {
            Some(bag) => bag,
            None => return Ok(Expansion::Leaf("degenerate bag")),
        };

        let (rule, partition_point) =
            if bag.nrows() == 1 || has_at_most_two_unique_rows(&bag.x) {
                match self.two_point.split(&bag.x, &bag.y, config.x_variation_tol) {
                    Some(split) => (
                        DecisionRule::Linear {
                            projection: split.projection,
                        },
                        split.partition_point,
                    ),
                    None => return Ok(Expansion::Leaf("no two-point separation")),
                }
            } else {
                let projection = self
                    .projector
                    .project(&bag.x, &bag.y, &config.projection, rng)
                    .map_err(|err| GrowError::Projection(err.to_string()))?;
                match self.search_projection(growth, &selected, projection, rng)? {
                    Some(found) => found,
                    None => return Ok(Expansion::Leaf("no improving split")),
                }
            };

        let mask = split_mask(&rule, &features, partition_point, &node.x);
        let n_left = mask.iter().filter(|&&left| left).count();
        if n_left == 0 || n_left == n {
            return Err(GrowError::EmptyPartition {
                depth,
                left: n_left,
                right: n - n_left,
            });
        }
        if n_left < config.min_points_leaf || n - n_left < config.min_points_leaf {
            return Ok(Expansion::Leaf("split leaves too few points on one side"));
        }
        let (left, right) = node.split_on_mask(&mask);

        Ok(Expansion::Split {
            node: SplitNode {
                n_points: n,
                mean: growth.leaves.mean(&node.y),
                features,
                rule,
                partition_point,
            },
            left,
            right,
        })
    }

    /// Searches the directions of `projection` over the node's selected columns.
    fn search_projection<R: Rng + ?Sized>(
        &self,
        growth: &Growth<'_, T>,
        selected: &Dataset<T>,
        projection: Projection<T>,
        rng: &mut R,
    ) -> Result<Option<(DecisionRule<T>, T)>, GrowError> {
        if projection.n_inputs() != selected.x.ncols() {
            return Err(GrowError::ProjectionShape {
                expected: projection.n_inputs(),
                actual: selected.x.ncols(),
            });
        }
        let inputs = match &projection.expansion {
            Some(expansion) => expansion.apply(&selected.x),
            None => selected.x.clone(),
        };
        if projection.matrix.nrows() != inputs.ncols() {
            return Err(GrowError::ProjectionShape {
                expected: projection.matrix.nrows(),
                actual: inputs.ncols(),
            });
        }

        let mut columns = Vec::new();
        let mut directions = Vec::new();
        for (column, direction) in projection.matrix.column_iter().enumerate() {
            let values = &inputs * direction.into_owned();
            if varies(values.iter().copied(), self.config.x_variation_tol) {
                columns.push(column);
                directions.push(values);
            }
        }
        if directions.is_empty() {
            return Ok(None);
        }

        let outputs = self.search_outputs(growth, &selected.y, projection.output_matrix.as_ref())?;
        let choice = match growth.search.best_split(&directions, &outputs, rng) {
            Some(choice) => choice,
            None => return Ok(None),
        };

        let direction = projection.matrix.column(columns[choice.direction]).into_owned();
        let rule = match projection.expansion {
            Some(expansion) => DecisionRule::Expanded {
                expansion,
                projection: direction,
            },
            None => DecisionRule::Linear {
                projection: direction,
            },
        };
        Ok(Some((rule, choice.partition_point)))
    }

    /// Outputs the split search scores against: the node outputs, or their
    /// output components for multi-output regression.
    fn search_outputs(
        &self,
        growth: &Growth<'_, T>,
        y: &DMatrix<T>,
        output_matrix: Option<&DMatrix<T>>,
    ) -> Result<DMatrix<T>, GrowError> {
        let use_components = self.config.projection.use_output_components
            && growth.task.is_regression()
            && y.ncols() > 1
            && self.config.split_criterion == SplitCriterion::Mse;
        match output_matrix {
            Some(output_matrix) if use_components => {
                if output_matrix.nrows() != y.ncols() {
                    return Err(GrowError::ProjectionShape {
                        expected: output_matrix.nrows(),
                        actual: y.ncols(),
                    });
                }
                Ok(y * output_matrix)
            }
            _ => Ok(y.clone()),
        }
    }
}

/// Builds the tree bottom-up from the arena.
fn assemble<T: RealNumber>(mut slots: Vec<Slot<T>>) -> Result<TreeNode<T>, GrowError> {
    let mut built: Vec<Option<TreeNode<T>>> = (0..slots.len()).map(|_| None).collect();
    while let Some(slot) = slots.pop() {
        let index = slots.len();
        let node = match slot {
            Slot::Pending => return Err(GrowError::Incomplete),
            Slot::Done(node) => node,
            Slot::Split(split, left, right) => {
                let left = built[left].take().ok_or(GrowError::Incomplete)?;
                let right = built[right].take().ok_or(GrowError::Incomplete)?;
                TreeNode::Internal(InternalNode {
                    n_points: split.n_points,
                    mean: split.mean,
                    features: split.features,
                    rule: split.rule,
                    partition_point: split.partition_point,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        };
        built[index] = Some(node);
    }
    built
        .into_iter()
        .next()
        .flatten()
        .ok_or(GrowError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::FeatureExpansion;
    use crate::trees::node::LeafNode;
    use crate::trees::params::{ExpansionParams, OutputScaling, ProjectionMode, ProjectionOptions};
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::RefCell;
    use std::error::Error;

    fn regression_config() -> TreeConfig<f64> {
        let mut config = TreeConfig::for_task(Task::Regression);
        config.mse_error_tolerance = 1e-9;
        config.projection_bootstrap = false;
        config
    }

    fn grow(
        config: TreeConfig<f64>,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        task: Task,
    ) -> Result<TreeNode<f64>, GrowError> {
        let grower = TreeGrower::axis_aligned(config)?;
        let groups = FeatureGroups::ungrouped(x.ncols());
        grower.grow(x, y, task, &groups, &mut StdRng::seed_from_u64(7))
    }

    fn as_internal(node: &TreeNode<f64>) -> &InternalNode<f64> {
        match node {
            TreeNode::Internal(internal) => internal,
            TreeNode::Leaf(_) => panic!("expected an internal node"),
        }
    }

    fn as_leaf(node: &TreeNode<f64>) -> &LeafNode<f64> {
        match node {
            TreeNode::Leaf(leaf) => leaf,
            TreeNode::Internal(_) => panic!("expected a leaf"),
        }
    }

    #[test]
    fn test_regression_example() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let tree = grow(regression_config(), &x, &y, Task::Regression).unwrap();

        let root = as_internal(&tree);
        assert_eq!(root.features, vec![0]);
        assert_relative_eq!(root.partition_point, 1.5);
        assert_relative_eq!(root.mean[0], 5.0);

        let left = as_leaf(&root.left);
        let right = as_leaf(&root.right);
        assert_eq!((left.n_points, right.n_points), (2, 2));
        assert_relative_eq!(left.mean[0], 0.0);
        assert_relative_eq!(right.mean[0], 10.0);
        assert_relative_eq!(left.std_dev.as_ref().unwrap()[0], 0.0);
        assert_relative_eq!(right.std_dev.as_ref().unwrap()[0], 0.0);
    }

    #[test]
    fn test_classification_example() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
        let mut config = TreeConfig::for_task(Task::Classification);
        config.projection_bootstrap = false;
        let tree = grow(config, &x, &y, Task::Classification).unwrap();

        let root = as_internal(&tree);
        let left = as_leaf(&root.left);
        let right = as_leaf(&root.right);
        assert_eq!(left.mean, DVector::from_vec(vec![1.0, 0.0]));
        assert_eq!(right.mean, DVector::from_vec(vec![0.0, 1.0]));
        assert!(left.std_dev.is_none());
    }

    #[test]
    fn test_constant_outputs_give_a_leaf() {
        let x = DMatrix::from_fn(6, 2, |i, j| (i * (j + 1)) as f64);
        let y = DMatrix::from_element(6, 1, 3.0);
        let tree = grow(TreeConfig::for_task(Task::Regression), &x, &y, Task::Regression).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.n_points(), 6);

        let y = DMatrix::from_fn(6, 2, |_, j| if j == 0 { 1.0 } else { 0.0 });
        let tree = grow(TreeConfig::for_task(Task::Classification), &x, &y, Task::Classification)
            .unwrap();
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_too_few_points() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let mut config = regression_config();
        config.min_points_leaf = 3;
        let tree = grow(config, &x, &y, Task::Regression).unwrap();
        assert!(tree.is_leaf());

        let mut config = regression_config();
        config.min_points_for_split = 5;
        assert!(grow(config, &x, &y, Task::Regression).unwrap().is_leaf());
    }

    #[test]
    fn test_max_depth() {
        let x = DMatrix::from_fn(16, 1, |i, _| i as f64);
        let y = DMatrix::from_fn(16, 1, |i, _| (i * i) as f64);

        let mut config = regression_config();
        config.max_depth = MaxDepth::Limited(0);
        let tree = grow(config, &x, &y, Task::Regression).unwrap();
        assert_eq!(tree.depth(), 1);

        let mut config = regression_config();
        config.max_depth = MaxDepth::Limited(2);
        let tree = grow(config, &x, &y, Task::Regression).unwrap();
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_depth_ceiling() {
        let x = DMatrix::from_fn(16, 1, |i, _| i as f64);
        let y = DMatrix::from_fn(16, 1, |i, _| (i * i) as f64);
        let mut config = regression_config();
        config.depth_ceiling = 1;
        let tree = grow(config, &x, &y, Task::Regression).unwrap();
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_root_depth_counts_toward_limit() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let mut config = regression_config();
        config.max_depth = MaxDepth::Limited(3);
        let grower = TreeGrower::axis_aligned(config).unwrap();
        let tree = grower
            .grow_at_depth(
                &x,
                &y,
                Task::Regression,
                &FeatureGroups::ungrouped(1),
                4,
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_output_scaling() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[-1.0, -1.0, 1.0, 1.0]);
        let mut config = regression_config();
        config.output_scaling = OutputScaling {
            scale: Some(DVector::from_vec(vec![5.0])),
            offset: Some(DVector::from_vec(vec![5.0])),
        };
        let tree = grow(config, &x, &y, Task::Regression).unwrap();

        let root = as_internal(&tree);
        assert_relative_eq!(root.mean[0], 5.0);
        assert_relative_eq!(as_leaf(&root.left).mean[0], 0.0);
        assert_relative_eq!(as_leaf(&root.right).mean[0], 10.0);
    }

    #[test]
    fn test_shape_errors() {
        let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        let y = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        assert!(matches!(
            grow(regression_config(), &x, &y, Task::Regression),
            Err(GrowError::RowMismatch { x_rows: 3, y_rows: 2 })
        ));

        let empty = DMatrix::<f64>::zeros(0, 1);
        assert!(matches!(
            grow(regression_config(), &empty, &empty, Task::Regression),
            Err(GrowError::EmptyInput)
        ));

        let grower = TreeGrower::axis_aligned(regression_config()).unwrap();
        let y = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        let result = grower.grow(
            &x,
            &y,
            Task::Regression,
            &FeatureGroups::ungrouped(2),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(
            result,
            Err(GrowError::GroupMismatch { groups: 2, columns: 1 })
        ));
    }

    #[test]
    fn test_config_errors_are_reported_before_growth() {
        let mut config = regression_config();
        config.min_points_leaf = 0;
        assert!(matches!(
            TreeGrower::axis_aligned(config),
            Err(ConfigError::MinPointsLeaf(0))
        ));

        let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        let y = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        assert!(matches!(
            grow(regression_config(), &x, &y, Task::Classification),
            Err(GrowError::Config(ConfigError::CriterionTaskMismatch { .. }))
        ));
    }

    #[test]
    fn test_feature_expansion_rule() {
        let x = DMatrix::from_fn(12, 2, |i, j| ((i * (j + 2)) % 7) as f64);
        let y = DMatrix::from_fn(12, 1, |i, _| if i % 3 == 0 { 1.0 } else { 0.0 });
        let mut config = TreeConfig::for_task(Task::Classification);
        config.projection = ProjectionOptions {
            mode: ProjectionMode::FeatureExpansion(ExpansionParams {
                n_features: 8,
                length_scale: 1.0,
                include_original: true,
                reg_lambda: 1e-3,
            }),
            ..ProjectionOptions::default()
        };
        let tree = grow(config, &x, &y, Task::Classification).unwrap();
        let root = as_internal(&tree);
        match &root.rule {
            DecisionRule::Expanded { expansion, .. } => {
                assert_eq!(expansion.n_inputs(), root.features.len())
            }
            DecisionRule::Linear { .. } => {
                // the bag fell back to the two-point solver
                assert_eq!(root.rule.projection().len(), root.features.len())
            }
        }
        let n_left = root.split_mask(&x).iter().filter(|&&left| left).count();
        assert_eq!(n_left, root.left.n_points());
    }

    /// Hands out a fixed projection, whatever the sample.
    struct FixedProjection(Projection<f64>);

    impl ProjectionEngine<f64> for FixedProjection {
        fn project<R: Rng + ?Sized>(
            &self,
            _x: &DMatrix<f64>,
            _y: &DMatrix<f64>,
            _options: &ProjectionOptions<f64>,
            _rng: &mut R,
        ) -> Result<Projection<f64>, Box<dyn Error + Send + Sync>> {
            Ok(self.0.clone())
        }
    }

    struct FailingProjection;

    impl ProjectionEngine<f64> for FailingProjection {
        fn project<R: Rng + ?Sized>(
            &self,
            _x: &DMatrix<f64>,
            _y: &DMatrix<f64>,
            _options: &ProjectionOptions<f64>,
            _rng: &mut R,
        ) -> Result<Projection<f64>, Box<dyn Error + Send + Sync>> {
            Err("singular covariance".into())
        }
    }

    #[test]
    fn test_oblique_projection() {
        // neither column separates the outputs on its own, their sum does
        let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 2.0, -2.0, 1.0, 2.0, 3.0, 0.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let engine = FixedProjection(Projection::linear(DMatrix::from_row_slice(
            2,
            1,
            &[1.0, 1.0],
        )));
        let grower = TreeGrower::new(regression_config(), engine, MaxMarginSplitter).unwrap();
        let tree = grower
            .grow(&x, &y, Task::Regression, &FeatureGroups::new(vec![0, 0]), &mut StdRng::seed_from_u64(0))
            .unwrap();

        let root = as_internal(&tree);
        assert_eq!(root.features, vec![0, 1]);
        assert_relative_eq!(root.partition_point, 1.5);
        assert_eq!(root.split_mask(&x), vec![true, true, false, false]);
    }

    #[test]
    fn test_output_components() {
        // on the raw outputs the first column would split off the first row
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 30.0, 0.0, 30.0, 10.0, 30.0, 10.0]);
        let mut projection = Projection::linear(DMatrix::identity(1, 1));
        projection.output_matrix = Some(DMatrix::from_row_slice(2, 1, &[0.0, 1.0]));

        let mut config = regression_config();
        config.projection.use_output_components = true;
        config.max_depth = MaxDepth::Limited(0);
        let grower =
            TreeGrower::new(config, FixedProjection(projection), MaxMarginSplitter).unwrap();
        let tree = grower
            .grow(&x, &y, Task::Regression, &FeatureGroups::ungrouped(1), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_relative_eq!(as_internal(&tree).partition_point, 1.5);
    }

    #[test]
    fn test_projection_errors() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let groups = FeatureGroups::ungrouped(1);

        let grower = TreeGrower::new(regression_config(), FailingProjection, MaxMarginSplitter).unwrap();
        let result = grower.grow(&x, &y, Task::Regression, &groups, &mut StdRng::seed_from_u64(0));
        match result {
            Err(GrowError::Projection(message)) => assert_eq!(message, "singular covariance"),
            other => panic!("unexpected result {:?}", other),
        }

        let wide = FixedProjection(Projection::linear(DMatrix::identity(3, 3)));
        let grower = TreeGrower::new(regression_config(), wide, MaxMarginSplitter).unwrap();
        let result = grower.grow(&x, &y, Task::Regression, &groups, &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(GrowError::ProjectionShape { expected: 3, actual: 1 })
        ));

        let expansion = FeatureExpansion::new(
            DMatrix::from_element(1, 4, 1.0),
            DVector::from_element(4, 0.0),
            false,
        );
        let mismatched = FixedProjection(Projection {
            matrix: DMatrix::identity(2, 2),
            expansion: Some(expansion),
            output_matrix: None,
        });
        let grower = TreeGrower::new(regression_config(), mismatched, MaxMarginSplitter).unwrap();
        let result = grower.grow(&x, &y, Task::Regression, &groups, &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            result,
            Err(GrowError::ProjectionShape { expected: 2, actual: 4 })
        ));
    }

    /// Projects onto the axes and keeps the options it was handed.
    #[derive(Default)]
    struct RecordingProjection(RefCell<Vec<ProjectionOptions<f64>>>);

    impl ProjectionEngine<f64> for RecordingProjection {
        fn project<R: Rng + ?Sized>(
            &self,
            x: &DMatrix<f64>,
            _y: &DMatrix<f64>,
            options: &ProjectionOptions<f64>,
            _rng: &mut R,
        ) -> Result<Projection<f64>, Box<dyn Error + Send + Sync>> {
            self.0.borrow_mut().push(options.clone());
            Ok(Projection::linear(DMatrix::identity(x.ncols(), x.ncols())))
        }
    }

    #[test]
    fn test_engine_receives_projection_options() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 10.0, 10.0]);
        let mut config = regression_config();
        config.projection.epsilon = 0.25;

        let grower = TreeGrower::new(config, RecordingProjection::default(), MaxMarginSplitter).unwrap();
        let tree = grower
            .grow(&x, &y, Task::Regression, &FeatureGroups::ungrouped(1), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(tree.n_leaves(), 2);

        let seen = grower.projector.0.borrow();
        assert_eq!(seen.len(), 1);
        assert_relative_eq!(seen[0].epsilon, 0.25);
        assert_eq!(seen[0], grower.config().projection);
    }

    #[test]
    fn test_degenerate_node_without_bootstrap() {
        // the second class is absent, so no bag can support a projection
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        let mut config = TreeConfig::for_task(Task::Classification);
        config.projection_bootstrap = false;
        config.continue_on_degenerate_bag = false;
        let tree = grow(config.clone(), &x, &y, Task::Classification).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.n_points(), 4);

        config.continue_on_degenerate_bag = true;
        let tree = grow(config, &x, &y, Task::Classification).unwrap();
        assert!(!tree.is_leaf());
    }

    #[test]
    fn test_two_point_split_respects_min_points_leaf() {
        // the only separation puts a single row on the right
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 0.0, 4.0]);
        let y = DMatrix::from_row_slice(4, 1, &[1.0, 1.0, 1.0, 3.0]);

        let tree = grow(regression_config(), &x, &y, Task::Regression).unwrap();
        let root = as_internal(&tree);
        assert_eq!((root.left.n_points(), root.right.n_points()), (3, 1));

        let mut config = regression_config();
        config.min_points_leaf = 2;
        let tree = grow(config, &x, &y, Task::Regression).unwrap();
        assert!(tree.is_leaf());
        assert_relative_eq!(as_leaf(&tree).mean[0], 1.5);
    }

    #[test]
    fn test_two_point_path() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 0.0, 4.0, 4.0]);
        let y = DMatrix::from_row_slice(4, 1, &[1.0, 1.0, 3.0, 3.0]);
        let tree = grow(regression_config(), &x, &y, Task::Regression).unwrap();
        let root = as_internal(&tree);
        assert_relative_eq!(root.partition_point, 2.0);
        assert_relative_eq!(root.rule.projection()[0], 1.0);
        assert_eq!(root.left.n_points(), 2);
    }
}
