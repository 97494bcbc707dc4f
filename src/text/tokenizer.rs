// Tokenizer trait, the swap point for word splitting.
//
// The clustering core only needs "line in, ordered tokens out". The default
// implementation follows Unicode word boundaries (UAX#29), which yields one
// token per CJK ideograph and whole words for alphabetic scripts. Word
// vectors trained on segmented Chinese text have multi-character entries
// that single ideographs never hit, so those models need the jieba
// segmenter. A HuggingFace tokenizer.json can be plugged in instead when
// the embedding model was trained on that vocabulary.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use jieba_rs::Jieba;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Trait for splitting a raw line into word tokens.
pub trait Tokenizer {
    /// Split `line` into an ordered sequence of tokens.
    fn tokenize(&self, line: &str) -> Vec<String>;
}

/// Word segmentation used when no tokenizer.json is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segmenter {
    /// UAX#29 word boundaries, one token per CJK ideograph
    #[default]
    Unicode,
    /// Dictionary-based Chinese word segmentation
    Jieba,
}

impl FromStr for Segmenter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "jieba" => Ok(Self::Jieba),
            other => anyhow::bail!("Unknown segmenter '{other}' (expected unicode or jieba)"),
        }
    }
}

impl fmt::Display for Segmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unicode => write!(f, "unicode"),
            Self::Jieba => write!(f, "jieba"),
        }
    }
}

/// Splits on Unicode word boundaries, dropping punctuation and whitespace.
#[derive(Debug, Clone, Default)]
pub struct UnicodeWordTokenizer {
    /// Lowercase every token before returning it
    pub lowercase: bool,
}

impl UnicodeWordTokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        line.unicode_words()
            .map(|word| {
                if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .collect()
    }
}

/// Chinese word segmentation with the bundled jieba dictionary.
///
/// Runs of Latin text come through as whole words. Pieces with no letters
/// or digits (spaces, punctuation) are dropped.
pub struct JiebaTokenizer {
    jieba: Jieba,
    lowercase: bool,
}

impl JiebaTokenizer {
    pub fn new(lowercase: bool) -> Self {
        let jieba = Jieba::new();
        debug!("Loaded jieba dictionary");
        Self { jieba, lowercase }
    }
}

impl Tokenizer for JiebaTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        self.jieba
            .cut(line, true)
            .into_iter()
            .filter(|piece| piece.chars().any(char::is_alphanumeric))
            .map(|piece| {
                if self.lowercase {
                    piece.to_lowercase()
                } else {
                    piece.to_string()
                }
            })
            .collect()
    }
}

/// Tokenizer backed by a HuggingFace `tokenizer.json`.
///
/// Special tokens are not added, so the output is exactly the vocabulary
/// pieces the line encodes to.
pub struct PretrainedTokenizer {
    inner: tokenizers::Tokenizer,
}

impl PretrainedTokenizer {
    /// Load a tokenizer definition from a `tokenizer.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", path.display());
        }

        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))
            .with_context(|| format!("Reading {}", path.display()))?;

        debug!("Loaded tokenizer from {}", path.display());

        Ok(Self { inner })
    }
}

impl Tokenizer for PretrainedTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        match self.inner.encode(line, false) {
            Ok(encoding) => encoding.get_tokens().to_vec(),
            Err(e) => {
                // The line becomes empty and the corpus loader drops it,
                // so say which one went missing.
                warn!(error = %e, line, "Tokenizer could not encode line, skipping it");
                Vec::new()
            }
        }
    }
}
