// The clustering pipeline, end to end.
//
// run() is a pure function of (corpus, embedding lookup, options): it holds
// no state between calls, so independent corpora can be processed side by
// side. Every stage runs to completion before the next starts and the first
// error aborts the whole run.

pub mod report;

use tracing::info;

use crate::cluster::kmeans::{DEFAULT_MAX_ITERATIONS, DEFAULT_SEED};
use crate::cluster::{
    cluster_count_for, kmeans, vectorize_corpus, Clustering, KMeansParams, OovPolicy,
};
use crate::embedding::EmbeddingLookup;
use crate::error::{ClusterError, Result};
use crate::scoring::ranking::{member_distances, rank_clusters};
use crate::scoring::{DistanceMetric, RankedCluster};
use crate::text::Corpus;

use report::{drop_worst, preview, scores_worst_first, Report, ReportOptions};

/// Everything that shapes a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Explicit k; `None` uses floor(sqrt(N))
    pub clusters: Option<usize>,
    pub max_iterations: usize,
    pub seed: u64,
    pub restarts: usize,
    pub metric: DistanceMetric,
    pub oov_policy: OovPolicy,
    pub report: ReportOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            clusters: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
            restarts: 1,
            metric: DistanceMetric::default(),
            oov_policy: OovPolicy::default(),
            report: ReportOptions::default(),
        }
    }
}

/// Intermediate products of a run alongside the final report.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub vectors: Vec<Vec<f64>>,
    pub clustering: Clustering,
    /// Per-sentence distance to its own centroid
    pub distances: Vec<f64>,
    /// All clusters, ranked, in label order (before filtering)
    pub ranked: Vec<RankedCluster>,
    pub report: Report,
}

/// Vectorize, cluster, score, filter, and report.
pub fn run(
    corpus: &Corpus,
    lookup: &dyn EmbeddingLookup,
    options: &PipelineOptions,
) -> Result<PipelineRun> {
    let n = corpus.len();
    let k = options.clusters.unwrap_or_else(|| cluster_count_for(n));
    if k == 0 || k > n {
        return Err(ClusterError::InvalidClusterCount { k, n });
    }

    info!(sentences = n, k, metric = %options.metric, "Starting clustering run");

    let (vectors, stats) = vectorize_corpus(&corpus.sentences, lookup, options.oov_policy)?;

    let params = KMeansParams {
        k,
        max_iterations: options.max_iterations,
        seed: options.seed,
        restarts: options.restarts,
    };
    let clustering = kmeans(&vectors, &params)?;

    let distances = member_distances(
        &vectors,
        &clustering.labels,
        &clustering.centroids,
        options.metric,
    )?;
    let ranked = rank_clusters(&clustering.labels, &distances, k)?;

    let mean_distances = scores_worst_first(&ranked);
    let (dropped, survivors) = drop_worst(&ranked, options.report.drop_divisor);
    if !dropped.is_empty() {
        info!(dropped = ?dropped, "Dropped most dispersed clusters");
    }

    let clusters = survivors
        .into_iter()
        .map(|c| {
            preview(
                c,
                &corpus.sentences,
                options.report.preview_limit,
                options.report.keep_separators,
            )
        })
        .collect();

    let report = Report {
        sentence_count: n,
        empty_removed: corpus.empty_removed,
        duplicates_removed: corpus.duplicates_removed,
        tokens: stats.tokens,
        oov_tokens: stats.oov_tokens,
        cluster_count: k,
        metric: options.metric,
        iterations: clustering.iterations,
        converged: clustering.converged,
        inertia: clustering.inertia,
        mean_distances,
        dropped,
        clusters,
    };

    Ok(PipelineRun {
        vectors,
        clustering,
        distances,
        ranked,
        report,
    })
}
