// Cluster filtering and report assembly.
//
// Clusters are ranked worst-first by mean member distance and the top
// floor(k / drop_divisor) of them are removed from the report. Only whole
// clusters are dropped; survivors keep every member. Each survivor then
// contributes a short nearest-first preview of its titles.

use serde::Serialize;

use crate::scoring::{DistanceMetric, RankedCluster};
use crate::text::Sentence;

pub const DEFAULT_DROP_DIVISOR: usize = 10;
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Knobs for the filter/report stage.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Drop floor(k / drop_divisor) clusters; 0 disables dropping
    pub drop_divisor: usize,
    /// Maximum titles shown per surviving cluster
    pub preview_limit: usize,
    /// Show titles in their space-joined token form instead of concatenated
    pub keep_separators: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            drop_divisor: DEFAULT_DROP_DIVISOR,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            keep_separators: false,
        }
    }
}

/// A cluster's aggregate quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterScore {
    pub label: usize,
    pub size: usize,
    pub mean_distance: f64,
}

/// One line of a cluster preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewEntry {
    /// 1-based position in the nearest-first ordering
    pub rank: usize,
    pub text: String,
    pub distance: f64,
}

/// A surviving cluster as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPreview {
    pub label: usize,
    pub size: usize,
    pub mean_distance: f64,
    pub preview: Vec<PreviewEntry>,
}

/// Structured result of a run, ready for terminal or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Distinct non-empty sentences clustered
    pub sentence_count: usize,
    pub empty_removed: usize,
    pub duplicates_removed: usize,
    pub tokens: usize,
    pub oov_tokens: usize,
    pub cluster_count: usize,
    pub metric: DistanceMetric,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
    /// Every cluster's mean distance, worst first
    pub mean_distances: Vec<ClusterScore>,
    /// Labels removed from the report, worst first
    pub dropped: Vec<usize>,
    /// Surviving clusters in label order
    pub clusters: Vec<ClusterPreview>,
}

/// Number of clusters to drop for a given k.
pub fn clusters_to_drop(k: usize, drop_divisor: usize) -> usize {
    if drop_divisor == 0 {
        0
    } else {
        k / drop_divisor
    }
}

/// All clusters ordered by mean distance descending; ties keep the lower label first.
pub fn scores_worst_first(ranked: &[RankedCluster]) -> Vec<ClusterScore> {
    let mut scores: Vec<ClusterScore> = ranked
        .iter()
        .map(|c| ClusterScore {
            label: c.label,
            size: c.len(),
            mean_distance: c.mean_distance,
        })
        .collect();
    scores.sort_by(|a, b| {
        b.mean_distance
            .total_cmp(&a.mean_distance)
            .then(a.label.cmp(&b.label))
    });
    scores
}

/// Remove the worst floor(k / drop_divisor) clusters.
///
/// Returns the dropped labels (worst first) and the survivors in their
/// original order, untouched.
pub fn drop_worst<'a>(
    ranked: &'a [RankedCluster],
    drop_divisor: usize,
) -> (Vec<usize>, Vec<&'a RankedCluster>) {
    let n_drop = clusters_to_drop(ranked.len(), drop_divisor);
    let dropped: Vec<usize> = scores_worst_first(ranked)
        .into_iter()
        .take(n_drop)
        .map(|s| s.label)
        .collect();

    let survivors = ranked
        .iter()
        .filter(|c| !dropped.contains(&c.label))
        .collect();

    (dropped, survivors)
}

/// The first `limit` members of a ranked cluster, with display text.
pub fn preview(
    cluster: &RankedCluster,
    sentences: &[Sentence],
    limit: usize,
    keep_separators: bool,
) -> ClusterPreview {
    let preview = cluster
        .members
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, member)| {
            let text = sentences
                .get(member.index)
                .map(|s| {
                    if keep_separators {
                        s.joined()
                    } else {
                        s.display_text()
                    }
                })
                .unwrap_or_default();
            PreviewEntry {
                rank: i + 1,
                text,
                distance: member.distance,
            }
        })
        .collect();

    ClusterPreview {
        label: cluster.label,
        size: cluster.len(),
        mean_distance: cluster.mean_distance,
        preview,
    }
}
