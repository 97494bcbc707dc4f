// Per-sentence distances and within-cluster ranking.
//
// Every sentence is scored by its distance to its own centroid under the
// run's metric. Members of a cluster are then ordered nearest-first, so the
// most typical titles lead, and each cluster gets a mean member distance
// (higher means a looser, lower-quality cluster).

use serde::Serialize;

use super::distance::DistanceMetric;
use crate::error::{ClusterError, Result};

/// One sentence's position within its cluster ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedMember {
    /// Index into the corpus sentence list
    pub index: usize,
    pub distance: f64,
}

/// A cluster's members in ascending distance order, plus its mean distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCluster {
    pub label: usize,
    pub members: Vec<RankedMember>,
    pub mean_distance: f64,
}

impl RankedCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Distance from each vector to the centroid of its assigned label.
pub fn member_distances(
    vectors: &[Vec<f64>],
    labels: &[usize],
    centroids: &[Vec<f64>],
    metric: DistanceMetric,
) -> Result<Vec<f64>> {
    if labels.len() != vectors.len() {
        return Err(ClusterError::LengthMismatch {
            expected: vectors.len(),
            actual: labels.len(),
        });
    }

    vectors
        .iter()
        .zip(labels)
        .map(|(vector, &label)| {
            let centroid = centroids.get(label).ok_or(ClusterError::LabelOutOfRange {
                label,
                k: centroids.len(),
            })?;
            if centroid.len() != vector.len() {
                return Err(ClusterError::DimensionMismatch {
                    expected: vector.len(),
                    actual: centroid.len(),
                });
            }
            Ok(metric.distance(vector, centroid))
        })
        .collect()
}

/// Group sentences by label, sort each group nearest-first, and average.
///
/// Returns one entry per label in `0..k`, in label order. Equal distances keep
/// the lower sentence index first. An empty label has mean distance 0.0.
pub fn rank_clusters(labels: &[usize], distances: &[f64], k: usize) -> Result<Vec<RankedCluster>> {
    if labels.len() != distances.len() {
        return Err(ClusterError::LengthMismatch {
            expected: labels.len(),
            actual: distances.len(),
        });
    }

    let mut members: Vec<Vec<RankedMember>> = vec![Vec::new(); k];
    for (index, (&label, &distance)) in labels.iter().zip(distances).enumerate() {
        let bucket = members
            .get_mut(label)
            .ok_or(ClusterError::LabelOutOfRange { label, k })?;
        bucket.push(RankedMember { index, distance });
    }

    Ok(members
        .into_iter()
        .enumerate()
        .map(|(label, mut members)| {
            // Stable sort: members were pushed in index order
            members.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            let mean_distance = if members.is_empty() {
                0.0
            } else {
                members.iter().map(|m| m.distance).sum::<f64>() / members.len() as f64
            };
            RankedCluster {
                label,
                members,
                mean_distance,
            }
        })
        .collect())
}
