// Scoring: distance metrics and within-cluster ranking.

pub mod distance;
pub mod ranking;

pub use distance::DistanceMetric;
pub use ranking::{RankedCluster, RankedMember};
