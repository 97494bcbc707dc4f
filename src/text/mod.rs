// Text handling: tokenization and corpus loading.

pub mod corpus;
pub mod tokenizer;

pub use corpus::{Corpus, Sentence};
pub use tokenizer::{
    JiebaTokenizer, PretrainedTokenizer, Segmenter, Tokenizer, UnicodeWordTokenizer,
};
