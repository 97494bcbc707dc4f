use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::cluster::kmeans::{DEFAULT_MAX_ITERATIONS, DEFAULT_SEED};
use crate::cluster::OovPolicy;
use crate::embedding::ModelFormat;
use crate::pipeline::report::{ReportOptions, DEFAULT_DROP_DIVISOR, DEFAULT_PREVIEW_LIMIT};
use crate::pipeline::PipelineOptions;
use crate::scoring::DistanceMetric;
use crate::text::Segmenter;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Command-line flags
/// override whatever is set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-trained word2vec model (TITLECLUSTER_MODEL)
    pub model_path: Option<PathBuf>,
    pub model_format: ModelFormat,
    /// Optional HuggingFace tokenizer.json; the Unicode word tokenizer is used otherwise
    pub tokenizer_path: Option<PathBuf>,
    /// Word segmentation when no tokenizer.json is set; must match how the model was trained
    pub segmenter: Segmenter,
    pub lowercase: bool,
    pub seed: u64,
    pub metric: DistanceMetric,
    pub max_iterations: usize,
    pub restarts: usize,
    /// Fixed cluster count instead of floor(sqrt(N))
    pub clusters: Option<usize>,
    pub preview_limit: usize,
    pub drop_divisor: usize,
    pub oov_policy: OovPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            model_format: ModelFormat::Auto,
            tokenizer_path: None,
            segmenter: Segmenter::Unicode,
            lowercase: false,
            seed: DEFAULT_SEED,
            metric: DistanceMetric::Euclidean,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            restarts: 1,
            clusters: None,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            drop_divisor: DEFAULT_DROP_DIVISOR,
            oov_policy: OovPolicy::ZeroCounted,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset variables keep
    /// their defaults; set but unparseable ones are an error naming the variable.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            model_path: var("TITLECLUSTER_MODEL").map(PathBuf::from),
            model_format: parse_or(&var, "TITLECLUSTER_MODEL_FORMAT", defaults.model_format)?,
            tokenizer_path: var("TITLECLUSTER_TOKENIZER").map(PathBuf::from),
            segmenter: parse_or(&var, "TITLECLUSTER_SEGMENTER", defaults.segmenter)?,
            lowercase: parse_bool(&var, "TITLECLUSTER_LOWERCASE", defaults.lowercase)?,
            seed: parse_or(&var, "TITLECLUSTER_SEED", defaults.seed)?,
            metric: parse_or(&var, "TITLECLUSTER_METRIC", defaults.metric)?,
            max_iterations: parse_or(&var, "TITLECLUSTER_MAX_ITERATIONS", defaults.max_iterations)?,
            restarts: parse_or(&var, "TITLECLUSTER_RESTARTS", defaults.restarts)?,
            clusters: var("TITLECLUSTER_CLUSTERS")
                .map(|v| v.trim().parse::<usize>())
                .transpose()
                .context("Invalid TITLECLUSTER_CLUSTERS")?,
            preview_limit: parse_or(&var, "TITLECLUSTER_PREVIEW_LIMIT", defaults.preview_limit)?,
            drop_divisor: parse_or(&var, "TITLECLUSTER_DROP_DIVISOR", defaults.drop_divisor)?,
            oov_policy: parse_or(&var, "TITLECLUSTER_OOV_POLICY", defaults.oov_policy)?,
        })
    }

    /// Check that an embedding model is configured.
    /// Call this before any operation that needs word vectors.
    pub fn require_model(&self) -> Result<&Path> {
        match &self.model_path {
            Some(path) => Ok(path),
            None => anyhow::bail!(
                "No embedding model configured. Pass --model or set TITLECLUSTER_MODEL \
                 (word2vec text or binary format)."
            ),
        }
    }

    pub fn pipeline_options(&self, keep_separators: bool) -> PipelineOptions {
        PipelineOptions {
            clusters: self.clusters,
            max_iterations: self.max_iterations,
            seed: self.seed,
            restarts: self.restarts,
            metric: self.metric,
            oov_policy: self.oov_policy,
            report: ReportOptions {
                drop_divisor: self.drop_divisor,
                preview_limit: self.preview_limit,
                keep_separators,
            },
        }
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key}='{raw}': {e}")),
        None => Ok(default),
    }
}

fn parse_bool(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match var(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("Invalid {key}='{other}': expected true or false"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.preview_limit, 10);
        assert_eq!(config.drop_divisor, 10);
        assert!(config.clusters.is_none());
        assert_eq!(config.segmenter, Segmenter::Unicode);
        assert!(config.require_model().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("TITLECLUSTER_MODEL", "model.bin"),
            ("TITLECLUSTER_METRIC", "cosine"),
            ("TITLECLUSTER_SEED", "7"),
            ("TITLECLUSTER_CLUSTERS", "4"),
            ("TITLECLUSTER_LOWERCASE", "yes"),
            ("TITLECLUSTER_OOV_POLICY", "skip"),
            ("TITLECLUSTER_SEGMENTER", "jieba"),
        ])
        .unwrap();
        assert_eq!(config.require_model().unwrap(), Path::new("model.bin"));
        assert_eq!(config.metric, DistanceMetric::Cosine);
        assert_eq!(config.seed, 7);
        assert_eq!(config.clusters, Some(4));
        assert!(config.lowercase);
        assert_eq!(config.oov_policy, OovPolicy::Skip);
        assert_eq!(config.segmenter, Segmenter::Jieba);
    }

    #[test]
    fn test_blank_value_means_unset() {
        let config = from_map(&[("TITLECLUSTER_SEED", "  ")]).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = from_map(&[("TITLECLUSTER_METRIC", "manhattan")]).unwrap_err();
        assert!(err.to_string().contains("TITLECLUSTER_METRIC"));
    }
}
