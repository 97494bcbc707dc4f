// Embedding lookup: token -> dense vector, or nothing for OOV tokens.
//
// The clustering core only depends on the EmbeddingLookup trait. The shipped
// implementation reads pre-trained word2vec artifacts; any other model
// source can be plugged in by implementing the trait.

pub mod word2vec;

pub use word2vec::{ModelFormat, WordVectors};

/// Read-only access to a pre-trained word embedding table.
pub trait EmbeddingLookup {
    /// The vector for `token`, or `None` if the token is out of vocabulary.
    fn vector_for(&self, token: &str) -> Option<&[f32]>;

    /// Length of every vector this lookup returns.
    fn dimensionality(&self) -> usize;
}
