// Seeded k-means over dense sentence vectors.
//
// Initialization is k-means++ driven by a ChaCha8 RNG seeded from the
// caller, so the same input and seed always give the same partition. The
// loop alternates nearest-centroid assignment (Euclidean, lowest label wins
// ties) with centroid recomputation until assignments stop changing or the
// iteration cap is hit.
//
// A cluster that ends up with no members is refilled with the point lying
// farthest from its own centroid, taken from a cluster that can spare it.
// This keeps every label in [0, k) populated at the end of every iteration.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ClusterError, Result};
use crate::scoring::distance::squared_euclidean;

/// Default iteration cap, matching common k-means library defaults.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Default seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Cluster count heuristic: floor(sqrt(n)).
pub fn cluster_count_for(n: usize) -> usize {
    let mut k = (n as f64).sqrt() as usize;
    // Correct float rounding on very large n
    while k * k > n {
        k -= 1;
    }
    while (k + 1) * (k + 1) <= n {
        k += 1;
    }
    k
}

/// Parameters for one clustering run.
#[derive(Debug, Clone)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: u64,
    /// Independent seeded runs; the lowest-inertia run is kept
    pub restarts: usize,
}

impl KMeansParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
            restarts: 1,
        }
    }
}

/// Output of the cluster engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    /// Label in [0, k) for every input vector
    pub labels: Vec<usize>,
    /// One centroid per label, the mean of that label's members
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    /// Sum of squared Euclidean distances to the assigned centroids
    pub inertia: f64,
    /// False if the iteration cap was reached first
    pub converged: bool,
}

impl Clustering {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Member count per label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Partition `vectors` into `params.k` clusters.
pub fn kmeans(vectors: &[Vec<f64>], params: &KMeansParams) -> Result<Clustering> {
    let n = vectors.len();
    let k = params.k;
    if k == 0 || k > n {
        return Err(ClusterError::InvalidClusterCount { k, n });
    }

    let dim = vectors[0].len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(ClusterError::DimensionMismatch {
            expected: dim,
            actual: bad.len(),
        });
    }

    let mut best = single_run(vectors, k, params.max_iterations.max(1), params.seed);
    for restart in 1..params.restarts.max(1) {
        let seed = params.seed.wrapping_add(restart as u64);
        let run = single_run(vectors, k, params.max_iterations.max(1), seed);
        debug!(
            restart,
            seed,
            inertia = run.inertia,
            iterations = run.iterations,
            "k-means restart finished"
        );
        if run.inertia < best.inertia {
            best = run;
        }
    }
    let clustering = best;

    info!(
        k,
        sentences = n,
        iterations = clustering.iterations,
        inertia = clustering.inertia,
        converged = clustering.converged,
        "Clustered sentence vectors"
    );

    Ok(clustering)
}

fn single_run(vectors: &[Vec<f64>], k: usize, max_iterations: usize, seed: u64) -> Clustering {
    let n = vectors.len();
    let dim = vectors[0].len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut centroids = init_plus_plus(vectors, k, &mut rng);
    let mut labels = vec![usize::MAX; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let mut next: Vec<usize> = vectors.iter().map(|v| nearest(v, &centroids)).collect();
        refill_empty_clusters(vectors, &mut next, &centroids, k);

        if next == labels {
            converged = true;
            break;
        }
        labels = next;
        centroids = compute_centroids(vectors, &labels, k, dim);
    }

    let inertia = vectors
        .iter()
        .zip(&labels)
        .map(|(v, &label)| squared_euclidean(v, &centroids[label]))
        .sum();

    Clustering {
        labels,
        centroids,
        iterations,
        inertia,
        converged,
    }
}

/// Index of the closest centroid. Strict `<` keeps the lowest label on ties.
fn nearest(vector: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (label, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(vector, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = label;
        }
    }
    best
}

/// k-means++ seeding: first center uniform, each next center drawn with
/// probability proportional to squared distance from the nearest chosen one.
fn init_plus_plus(vectors: &[Vec<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.random_range(0..n));

    let mut closest: Vec<f64> = vectors
        .iter()
        .map(|v| squared_euclidean(v, &vectors[chosen[0]]))
        .collect();

    while chosen.len() < k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = None;
            for (i, &weight) in closest.iter().enumerate() {
                if weight <= 0.0 {
                    continue;
                }
                cumulative += weight;
                pick = Some(i);
                if cumulative > target {
                    break;
                }
            }
            pick
        } else {
            None
        };

        // All remaining points coincide with a center: take the first unused index
        let pick = pick
            .or_else(|| (0..n).find(|i| !chosen.contains(i)))
            .unwrap_or(0);

        chosen.push(pick);
        for (dist, v) in closest.iter_mut().zip(vectors) {
            *dist = dist.min(squared_euclidean(v, &vectors[pick]));
        }
    }

    chosen.into_iter().map(|i| vectors[i].clone()).collect()
}

/// Move the farthest-from-centroid point into each empty cluster.
///
/// Donors must keep at least one member; among eligible points the largest
/// distance wins and the lowest index breaks ties.
fn refill_empty_clusters(
    vectors: &[Vec<f64>],
    labels: &mut [usize],
    centroids: &[Vec<f64>],
    k: usize,
) {
    let mut sizes = vec![0usize; k];
    for &label in labels.iter() {
        sizes[label] += 1;
    }

    for empty in 0..k {
        if sizes[empty] > 0 {
            continue;
        }

        let mut donor: Option<(usize, f64)> = None;
        for (i, v) in vectors.iter().enumerate() {
            let label = labels[i];
            if sizes[label] <= 1 {
                continue;
            }
            let dist = squared_euclidean(v, &centroids[label]);
            if donor.map_or(true, |(_, best)| dist > best) {
                donor = Some((i, dist));
            }
        }

        if let Some((i, dist)) = donor {
            debug!(
                cluster = empty,
                point = i,
                distance = dist.sqrt(),
                "Reseeding empty cluster"
            );
            sizes[labels[i]] -= 1;
            labels[i] = empty;
            sizes[empty] = 1;
        }
    }
}

/// Mean of the vectors assigned to each label.
///
/// A label with no members gets a zero vector.
pub fn compute_centroids(
    vectors: &[Vec<f64>],
    labels: &[usize],
    k: usize,
    dim: usize,
) -> Vec<Vec<f64>> {
    let mut sums = vec![vec![0.0_f64; dim]; k];
    let mut counts = vec![0usize; k];

    for (v, &label) in vectors.iter().zip(labels) {
        for (acc, &x) in sums[label].iter_mut().zip(v) {
            *acc += x;
        }
        counts[label] += 1;
    }

    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            let count = count as f64;
            for x in sum.iter_mut() {
                *x /= count;
            }
        }
    }

    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_count_heuristic() {
        assert_eq!(cluster_count_for(0), 0);
        assert_eq!(cluster_count_for(1), 1);
        assert_eq!(cluster_count_for(8), 2);
        assert_eq!(cluster_count_for(9), 3);
        assert_eq!(cluster_count_for(99), 9);
        assert_eq!(cluster_count_for(100), 10);
    }

    #[test]
    fn test_nearest_tie_goes_to_lowest_label() {
        let centroids = vec![vec![1.0], vec![-1.0], vec![1.0]];
        assert_eq!(nearest(&[0.0], &centroids), 0);
        assert_eq!(nearest(&[1.0], &centroids), 0);
    }

    #[test]
    fn test_refill_takes_farthest_point_from_shared_cluster() {
        let vectors = vec![vec![0.0], vec![1.0], vec![5.0], vec![10.0]];
        let centroids = vec![vec![0.0], vec![10.0], vec![100.0]];
        let mut labels = vec![0, 0, 0, 1];
        refill_empty_clusters(&vectors, &mut labels, &centroids, 3);
        // Point 2 is farthest from centroid 0; point 3 is a singleton and ineligible
        assert_eq!(labels, vec![0, 0, 2, 1]);
    }

    #[test]
    fn test_identical_points_still_fill_every_cluster() {
        let vectors = vec![vec![1.0, 1.0]; 4];
        let clustering = kmeans(&vectors, &KMeansParams::new(2)).unwrap();
        let sizes = clustering.cluster_sizes();
        assert!(sizes.iter().all(|&s| s > 0), "sizes: {sizes:?}");
        assert!(clustering.converged);
    }

    #[test]
    fn test_compute_centroids_means() {
        let vectors = vec![vec![0.0, 0.0], vec![2.0, 2.0], vec![10.0, 0.0]];
        let c = compute_centroids(&vectors, &[0, 0, 1], 2, 2);
        assert_eq!(c, vec![vec![1.0, 1.0], vec![10.0, 0.0]]);
    }

    #[test]
    fn test_k_out_of_range() {
        let vectors = vec![vec![0.0], vec![1.0]];
        assert_eq!(
            kmeans(&vectors, &KMeansParams::new(3)).unwrap_err(),
            ClusterError::InvalidClusterCount { k: 3, n: 2 }
        );
        assert_eq!(
            kmeans(&vectors, &KMeansParams::new(0)).unwrap_err(),
            ClusterError::InvalidClusterCount { k: 0, n: 2 }
        );
        assert_eq!(
            kmeans(&[], &KMeansParams::new(1)).unwrap_err(),
            ClusterError::InvalidClusterCount { k: 1, n: 0 }
        );
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0]];
        assert_eq!(
            kmeans(&vectors, &KMeansParams::new(1)).unwrap_err(),
            ClusterError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
