//! # Rusty-cct
//!
//! `rusty-cct` grows the oblique decision trees of a Canonical Correlation
//! Forest. Every node samples feature groups, draws a projection bootstrap,
//! asks a [`ProjectionEngine`](projection::ProjectionEngine) for candidate
//! directions and scans all thresholds along them.
//!
//! ## Getting Started
//!
//! To use `rusty-cct`, add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! rusty-cct = "*"
//! ```
//!
//! ## Example Usage
//!
//! Growing a classification tree on one-hot outputs with the axis-aligned
//! reference engine:
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use rand::{rngs::StdRng, SeedableRng};
//! use rusty_cct::trees::{FeatureGroups, Task, TreeConfig, TreeGrower};
//!
//! let x = DMatrix::from_row_slice(4, 2, &[0.0, 1.0, 1.0, 0.0, 2.0, 1.0, 3.0, 0.0]);
//! let y = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
//!
//! let grower = TreeGrower::axis_aligned(TreeConfig::for_task(Task::Classification)).unwrap();
//! let mut rng = StdRng::seed_from_u64(0);
//! let tree = grower
//!     .grow(&x, &y, Task::Classification, &FeatureGroups::ungrouped(2), &mut rng)
//!     .unwrap();
//!
//! assert_eq!(tree.n_points(), 4);
//! for leaf in tree.leaves() {
//!     assert!(leaf.n_points >= 1);
//! }
//! ```

/// Node datasets and column statistics
pub mod data;
/// Configuration and growth errors
pub mod error;
/// Projection engines and two-point splitters
pub mod projection;
/// Oblique decision trees
pub mod trees;
