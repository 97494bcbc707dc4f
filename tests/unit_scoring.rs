// Unit tests for scoring, ranking, and cluster filtering.
//
// Exercises the ranking order, the worst-cluster drop rule, and the
// determinism of rescoring a finished clustering.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use titlecluster::cluster::{kmeans, KMeansParams};
use titlecluster::pipeline::report::{clusters_to_drop, drop_worst, scores_worst_first};
use titlecluster::scoring::ranking::{member_distances, rank_clusters};
use titlecluster::scoring::{DistanceMetric, RankedCluster, RankedMember};

fn random_points(n: usize, dim: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random_range(-5.0..5.0)).collect())
        .collect()
}

fn scored(n: usize, k: usize, metric: DistanceMetric) -> Vec<RankedCluster> {
    let points = random_points(n, 4, n as u64);
    let clustering = kmeans(&points, &KMeansParams::new(k)).unwrap();
    let distances =
        member_distances(&points, &clustering.labels, &clustering.centroids, metric).unwrap();
    rank_clusters(&clustering.labels, &distances, k).unwrap()
}

// ============================================================
// Ranking
// ============================================================

#[test]
fn ranking_is_non_decreasing_euclidean() {
    for cluster in scored(150, 12, DistanceMetric::Euclidean) {
        for pair in cluster.members.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }
}

#[test]
fn ranking_is_non_decreasing_cosine() {
    for cluster in scored(150, 12, DistanceMetric::Cosine) {
        for pair in cluster.members.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert!(cluster.members.iter().all(|m| (0.0..=2.0).contains(&m.distance)));
    }
}

#[test]
fn ranked_clusters_cover_every_sentence_once() {
    let ranked = scored(90, 9, DistanceMetric::Euclidean);
    let mut seen: Vec<usize> = ranked
        .iter()
        .flat_map(|c| c.members.iter().map(|m| m.index))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..90).collect::<Vec<_>>());
}

#[test]
fn mean_distance_is_average_of_members() {
    for cluster in scored(64, 8, DistanceMetric::Euclidean) {
        let mean = cluster.members.iter().map(|m| m.distance).sum::<f64>()
            / cluster.members.len() as f64;
        assert!((mean - cluster.mean_distance).abs() < 1e-12);
    }
}

#[test]
fn rescoring_reproduces_identical_distances() {
    let points = random_points(100, 3, 11);
    let clustering = kmeans(&points, &KMeansParams::new(10)).unwrap();
    for metric in [DistanceMetric::Euclidean, DistanceMetric::Cosine] {
        let first =
            member_distances(&points, &clustering.labels, &clustering.centroids, metric).unwrap();
        let second =
            member_distances(&points, &clustering.labels, &clustering.centroids, metric).unwrap();
        assert_eq!(first, second);
    }
}

// ============================================================
// Filtering
// ============================================================

fn synthetic(means: &[f64]) -> Vec<RankedCluster> {
    means
        .iter()
        .enumerate()
        .map(|(label, &mean)| RankedCluster {
            label,
            members: vec![RankedMember {
                index: label,
                distance: mean,
            }],
            mean_distance: mean,
        })
        .collect()
}

#[test]
fn drops_exactly_floor_k_over_ten() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    for k in [1, 3, 9, 10, 19, 20, 25, 47] {
        let means: Vec<f64> = (0..k).map(|_| rng.random_range(0.0..10.0)).collect();
        let ranked = synthetic(&means);
        let (dropped, survivors) = drop_worst(&ranked, 10);

        assert_eq!(dropped.len(), k / 10, "k = {k}");
        assert_eq!(dropped.len(), clusters_to_drop(k, 10));
        assert_eq!(survivors.len(), k - k / 10);

        // The dropped set is exactly the worst clusters by mean distance
        let worst: Vec<usize> = scores_worst_first(&ranked)
            .iter()
            .take(k / 10)
            .map(|s| s.label)
            .collect();
        assert_eq!(dropped, worst);
        let min_dropped = dropped
            .iter()
            .map(|&l| means[l])
            .fold(f64::INFINITY, f64::min);
        assert!(survivors.iter().all(|c| c.mean_distance <= min_dropped));
    }
}

#[test]
fn nothing_dropped_below_ten_clusters() {
    let ranked = synthetic(&[5.0, 1.0, 9.0]);
    let (dropped, survivors) = drop_worst(&ranked, 10);
    assert!(dropped.is_empty());
    assert_eq!(survivors.len(), 3);
}

#[test]
fn survivors_keep_label_order_and_members() {
    let ranked = synthetic(&[1.0, 8.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 0.5, 0.1, 9.5, 0.2]);
    let (dropped, survivors) = drop_worst(&ranked, 10);
    assert_eq!(dropped, vec![10]);
    let labels: Vec<usize> = survivors.iter().map(|c| c.label).collect();
    assert_eq!(labels, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 11]);
    assert!(survivors.iter().all(|c| c.members.len() == 1));
}

#[test]
fn scores_are_sorted_descending() {
    let ranked = synthetic(&[0.3, 0.9, 0.1, 0.5]);
    let means: Vec<f64> = scores_worst_first(&ranked)
        .iter()
        .map(|s| s.mean_distance)
        .collect();
    assert_eq!(means, vec![0.9, 0.5, 0.3, 0.1]);
}
