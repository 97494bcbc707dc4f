// word2vec model loading (text and binary formats).
//
// Both formats start with an ASCII header line "<vocab_size> <dim>".
//   text:   one "<word> <f32> <f32> ..." line per entry
//   binary: "<word> " followed by dim little-endian f32 values, with an
//           optional newline between records
// Headerless text files (GloVe style) are also accepted; the dimension is
// taken from the first row.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::EmbeddingLookup;
use crate::error::ClusterError;

/// On-disk layout of a word2vec model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelFormat {
    /// Sniff the file: text if it is printable UTF-8, binary otherwise
    #[default]
    Auto,
    Text,
    Binary,
}

impl FromStr for ModelFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "text" | "txt" | "vec" => Ok(Self::Text),
            "binary" | "bin" => Ok(Self::Binary),
            other => {
                anyhow::bail!("Unknown model format '{other}' (expected auto, text or binary)")
            }
        }
    }
}

/// An in-memory word embedding table.
///
/// Vectors are stored contiguously; `index` maps a word to its row.
#[derive(Debug, Clone)]
pub struct WordVectors {
    dim: usize,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl WordVectors {
    /// Create an empty table for vectors of length `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Add or replace the vector for `word`.
    pub fn insert(&mut self, word: impl Into<String>, vector: &[f32]) -> crate::Result<()> {
        if vector.len() != self.dim {
            return Err(ClusterError::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }

        let word = word.into();
        match self.index.get(&word) {
            Some(&row) => {
                let start = row * self.dim;
                self.data[start..start + self.dim].copy_from_slice(vector);
            }
            None => {
                self.index.insert(word, self.index.len());
                self.data.extend_from_slice(vector);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Load a model file from disk.
    pub fn load(path: &Path, format: ModelFormat) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read embedding model {}", path.display()))?;

        let vectors = match format {
            ModelFormat::Text => Self::from_text(
                std::str::from_utf8(&bytes).context("Text model is not valid UTF-8")?,
            ),
            ModelFormat::Binary => Self::from_binary(&bytes),
            ModelFormat::Auto => match sniff_text(&bytes) {
                Some(text) => {
                    debug!("Model file looks like text, parsing as text");
                    Self::from_text(text)
                }
                None => {
                    debug!("Model file has binary payload, parsing as binary");
                    Self::from_binary(&bytes)
                }
            },
        }
        .with_context(|| format!("Failed to parse embedding model {}", path.display()))?;

        info!(
            words = vectors.len(),
            dim = vectors.dim,
            "Loaded word vectors from {}",
            path.display()
        );

        Ok(vectors)
    }

    /// Parse the word2vec text format.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let Some((first_no, first)) = lines.next() else {
            anyhow::bail!("Model file is empty");
        };

        let header: Vec<&str> = first.split_whitespace().collect();
        let parsed_header = match header.as_slice() {
            [count, dim] => count.parse::<usize>().ok().zip(dim.parse::<usize>().ok()),
            _ => None,
        };
        let mut vectors = if let Some((_, dim)) = parsed_header {
            Self::new(dim)
        } else {
            // No header: the first row is already an entry
            let mut vectors = Self::new(header.len().saturating_sub(1));
            vectors.push_text_row(first_no, first)?;
            vectors
        };

        if vectors.dim == 0 {
            anyhow::bail!("Model dimension must be greater than zero");
        }

        for (line_no, line) in lines {
            vectors.push_text_row(line_no, line)?;
        }

        if let Some((count, _)) = parsed_header {
            if count != vectors.len() {
                debug!(
                    declared = count,
                    parsed = vectors.len(),
                    "Header vocabulary size differs from parsed entries"
                );
            }
        }

        Ok(vectors)
    }

    fn push_text_row(&mut self, line_no: usize, line: &str) -> Result<()> {
        let mut fields = line.split_whitespace();
        let word = fields
            .next()
            .with_context(|| format!("Line {}: missing word", line_no + 1))?;
        let values = fields
            .map(|v| v.parse::<f32>())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .with_context(|| format!("Line {}: invalid float value", line_no + 1))?;

        self.insert(word, &values)
            .with_context(|| format!("Line {}: word '{}'", line_no + 1, word))?;
        Ok(())
    }

    /// Parse the word2vec binary format.
    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let header_end = bytes
            .iter()
            .position(|&b| b == b'\n')
            .context("Binary model has no header line")?;
        let header = std::str::from_utf8(&bytes[..header_end]).context("Header is not UTF-8")?;
        let fields: Vec<&str> = header.split_whitespace().collect();
        if fields.len() != 2 {
            anyhow::bail!("Binary model header must be '<vocab_size> <dim>', got '{header}'");
        }
        let count: usize = fields[0].parse().context("Invalid vocabulary size in header")?;
        let dim: usize = fields[1].parse().context("Invalid dimension in header")?;
        if dim == 0 {
            anyhow::bail!("Model dimension must be greater than zero");
        }

        // Every entry needs at least its packed vector, so the header must fit the payload
        let payload_len = bytes.len() - (header_end + 1);
        let record_bytes = dim
            .checked_mul(4)
            .filter(|&n| n <= payload_len)
            .with_context(|| {
                format!("Header dimension {dim} exceeds the {payload_len} byte payload")
            })?;
        if count
            .checked_mul(record_bytes)
            .map_or(true, |needed| needed > payload_len)
        {
            anyhow::bail!(
                "Header declares {count} vectors of dimension {dim}, \
                 more than the {payload_len} byte payload holds"
            );
        }

        let mut vectors = Self::new(dim);
        let mut pos = header_end + 1;
        let mut row = vec![0.0f32; dim];

        for entry in 0..count {
            while pos < bytes.len() && (bytes[pos] == b'\n' || bytes[pos] == b' ') {
                pos += 1;
            }
            let word_len = bytes[pos..]
                .iter()
                .position(|&b| b == b' ')
                .with_context(|| format!("Entry {entry}: truncated word"))?;
            let word = String::from_utf8_lossy(&bytes[pos..pos + word_len]).into_owned();
            pos += word_len + 1;

            let payload = bytes
                .get(pos..pos + record_bytes)
                .with_context(|| format!("Entry {entry}: truncated vector for '{word}'"))?;
            for (value, chunk) in row.iter_mut().zip(payload.chunks_exact(4)) {
                *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            }
            pos += record_bytes;

            vectors.insert(word, &row)?;
        }

        Ok(vectors)
    }
}

/// The file as text if it is UTF-8 with no control bytes besides whitespace.
///
/// Packed f32 payloads almost always contain NUL or other control bytes.
fn sniff_text(bytes: &[u8]) -> Option<&str> {
    let printable = bytes
        .iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\n' | b'\r' | b'\t'));
    if printable {
        std::str::from_utf8(bytes).ok()
    } else {
        None
    }
}

impl EmbeddingLookup for WordVectors {
    fn vector_for(&self, token: &str) -> Option<&[f32]> {
        self.index.get(token).map(|&row| {
            let start = row * self.dim;
            &self.data[start..start + self.dim]
        })
    }

    fn dimensionality(&self) -> usize {
        self.dim
    }
}
