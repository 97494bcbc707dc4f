// Clustering: sentence vectorization and k-means partitioning.

pub mod kmeans;
pub mod vectorizer;

pub use kmeans::{cluster_count_for, kmeans, Clustering, KMeansParams};
pub use vectorizer::{sentence_vector, vectorize_corpus, OovPolicy, VectorizeStats};
