//! Growth of oblique decision trees.
//!
//! [`TreeGrower`] expands nodes from an explicit worklist: every node samples
//! feature groups, bags its rows, projects them and searches all thresholds of
//! every projected direction, until a stopping rule turns it into a leaf.

mod bootstrap;
mod features;
mod grower;
mod leaf;
/// Tree node data model
pub mod node;
/// Tree growth parameters
pub mod params;
mod split;
mod ties;

pub use features::FeatureGroups;
pub use grower::TreeGrower;
pub use node::{DecisionRule, InternalNode, LeafNode, TreeNode};
pub use params::{
    ExpansionParams, GainCombination, MaxDepth, OutputScaling, ProjectionMode, ProjectionOptions,
    SplitCriterion, Task, TieBreak, TreeConfig,
};
