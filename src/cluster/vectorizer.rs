// Sentence vectorization by averaging word embeddings.
//
// A sentence vector is the elementwise mean of its token embeddings. Under
// the default policy an out-of-vocabulary token adds a zero vector to the
// sum but still counts in the divisor, so sentences with many unknown words
// get proportionally shorter vectors. That shrinkage is part of the scoring
// behaviour and is kept as a named policy so it can be tested directly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding::EmbeddingLookup;
use crate::error::{ClusterError, Result};
use crate::text::Sentence;

/// How out-of-vocabulary tokens enter the sentence mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OovPolicy {
    /// Contribute a zero vector and count toward the divisor
    #[default]
    ZeroCounted,
    /// Leave OOV tokens out of both sum and divisor; an all-OOV sentence
    /// becomes the zero vector
    Skip,
}

impl FromStr for OovPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zero" | "zero-counted" => Ok(Self::ZeroCounted),
            "skip" => Ok(Self::Skip),
            other => anyhow::bail!("Unknown OOV policy '{other}' (expected zero-counted or skip)"),
        }
    }
}

/// Token coverage counters gathered while vectorizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VectorizeStats {
    pub tokens: usize,
    pub oov_tokens: usize,
    /// Sentences in which no token had an embedding
    pub all_oov_sentences: usize,
}

impl VectorizeStats {
    pub fn oov_rate(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.oov_tokens as f64 / self.tokens as f64
        }
    }
}

/// Average the embeddings of `tokens` into one vector of the lookup's dimension.
///
/// Fails with `EmptySentence` for an empty token list.
pub fn sentence_vector<S: AsRef<str>>(
    tokens: &[S],
    lookup: &dyn EmbeddingLookup,
    policy: OovPolicy,
) -> Result<Vec<f64>> {
    accumulate(tokens, lookup, policy).map(|(vector, _)| vector)
}

/// Returns the mean vector and the number of OOV tokens seen.
fn accumulate<S: AsRef<str>>(
    tokens: &[S],
    lookup: &dyn EmbeddingLookup,
    policy: OovPolicy,
) -> Result<(Vec<f64>, usize)> {
    if tokens.is_empty() {
        return Err(ClusterError::EmptySentence);
    }

    let dim = lookup.dimensionality();
    let mut sum = vec![0.0_f64; dim];
    let mut oov = 0;

    for token in tokens {
        match lookup.vector_for(token.as_ref()) {
            Some(embedding) => {
                if embedding.len() != dim {
                    return Err(ClusterError::DimensionMismatch {
                        expected: dim,
                        actual: embedding.len(),
                    });
                }
                for (acc, &value) in sum.iter_mut().zip(embedding) {
                    *acc += value as f64;
                }
            }
            // Zero vector: nothing to add
            None => oov += 1,
        }
    }

    let divisor = match policy {
        OovPolicy::ZeroCounted => tokens.len(),
        OovPolicy::Skip => tokens.len() - oov,
    };
    if divisor > 0 {
        let divisor = divisor as f64;
        for value in &mut sum {
            *value /= divisor;
        }
    }

    Ok((sum, oov))
}

/// Vectorize every sentence in order.
pub fn vectorize_corpus(
    sentences: &[Sentence],
    lookup: &dyn EmbeddingLookup,
    policy: OovPolicy,
) -> Result<(Vec<Vec<f64>>, VectorizeStats)> {
    let mut stats = VectorizeStats::default();
    let mut vectors = Vec::with_capacity(sentences.len());

    for sentence in sentences {
        let (vector, oov) = accumulate(sentence.tokens(), lookup, policy)?;
        stats.tokens += sentence.tokens().len();
        stats.oov_tokens += oov;
        if oov == sentence.tokens().len() {
            stats.all_oov_sentences += 1;
        }
        vectors.push(vector);
    }

    info!(
        sentences = vectors.len(),
        dim = lookup.dimensionality(),
        tokens = stats.tokens,
        oov_tokens = stats.oov_tokens,
        "Vectorized sentences"
    );

    Ok((vectors, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::WordVectors;

    fn lookup() -> WordVectors {
        let mut wv = WordVectors::new(2);
        wv.insert("a", &[2.0, 0.0]).unwrap();
        wv.insert("b", &[0.0, 4.0]).unwrap();
        wv
    }

    #[test]
    fn test_mean_of_known_tokens() {
        let v = sentence_vector(&["a", "b"], &lookup(), OovPolicy::ZeroCounted).unwrap();
        assert_eq!(v, vec![1.0, 2.0]);
    }

    #[test]
    fn test_oov_counts_in_divisor() {
        let v = sentence_vector(&["a", "zzz"], &lookup(), OovPolicy::ZeroCounted).unwrap();
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[test]
    fn test_skip_policy_ignores_oov() {
        let v = sentence_vector(&["a", "zzz"], &lookup(), OovPolicy::Skip).unwrap();
        assert_eq!(v, vec![2.0, 0.0]);
        let v = sentence_vector(&["zzz"], &lookup(), OovPolicy::Skip).unwrap();
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_sentence_is_error() {
        let tokens: [&str; 0] = [];
        let err = sentence_vector(&tokens, &lookup(), OovPolicy::ZeroCounted).unwrap_err();
        assert_eq!(err, ClusterError::EmptySentence);
    }

    #[test]
    fn test_stats_track_oov() {
        let sentences = vec![
            Sentence::new(vec!["a".into(), "x".into()]),
            Sentence::new(vec!["y".into()]),
        ];
        let (vectors, stats) =
            vectorize_corpus(&sentences, &lookup(), OovPolicy::ZeroCounted).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(stats.tokens, 3);
        assert_eq!(stats.oov_tokens, 2);
        assert_eq!(stats.all_oov_sentences, 1);
        assert!((stats.oov_rate() - 2.0 / 3.0).abs() < 1e-12);
    }
}
