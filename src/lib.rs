// Titlecluster: group short titles by averaged word embeddings.
//
// This is the library root. Each module corresponds to one stage of the
// batch pipeline: lines -> sentences -> vectors -> clusters -> report.

pub mod cluster;
pub mod config;
pub mod embedding;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod text;

pub use error::{ClusterError, Result};
