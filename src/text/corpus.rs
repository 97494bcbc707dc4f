// Corpus loading: raw lines to deduplicated tokenized sentences.
//
// Each input line is trimmed, tokenized, and keyed by its space-joined token
// form. Lines that tokenize to the same sequence collapse into one sentence
// (duplicate counts are discarded on purpose), and lines with no tokens are
// dropped here so the vectorizer never sees an empty sentence.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::tokenizer::Tokenizer;

/// Separator placed between tokens in the canonical joined form.
pub const TOKEN_SEPARATOR: &str = " ";

/// A tokenized, deduplicated input line. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    tokens: Vec<String>,
}

impl Sentence {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Canonical form: tokens joined by a single space. Used as the dedup key.
    pub fn joined(&self) -> String {
        self.tokens.join(TOKEN_SEPARATOR)
    }

    /// Display form: tokens concatenated with the separators removed.
    pub fn display_text(&self) -> String {
        self.tokens.concat()
    }
}

/// The full set of distinct sentences for one run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Distinct non-empty sentences in first-seen input order
    pub sentences: Vec<Sentence>,
    /// Lines that produced zero tokens
    pub empty_removed: usize,
    /// Lines whose token sequence was already present
    pub duplicates_removed: usize,
}

impl Corpus {
    /// Build a corpus from in-memory lines.
    pub fn from_lines<I, S>(lines: I, tokenizer: &dyn Tokenizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut corpus = Corpus::default();

        for line in lines {
            let tokens = tokenizer.tokenize(line.as_ref().trim());
            if tokens.is_empty() {
                corpus.empty_removed += 1;
                continue;
            }

            let sentence = Sentence::new(tokens);
            if seen.insert(sentence.joined()) {
                corpus.sentences.push(sentence);
            } else {
                corpus.duplicates_removed += 1;
            }
        }

        corpus
    }

    /// Read a UTF-8 file with one candidate sentence per line.
    pub fn load(path: &Path, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?;

        let corpus = Self::from_lines(text.lines(), tokenizer);

        info!(
            sentences = corpus.len(),
            empty_removed = corpus.empty_removed,
            duplicates_removed = corpus.duplicates_removed,
            "Loaded sentences from {}",
            path.display()
        );

        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}
