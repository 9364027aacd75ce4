/// Node datasets and numeric traits
pub mod dataset;
/// Column statistics
pub mod stats;
