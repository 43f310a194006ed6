//! Backend module - vector index build and search (usearch HNSW)

mod hnsw;
mod traits;

pub use hnsw::{build_index, HnswSearcher};
pub use traits::VectorSearcher;
