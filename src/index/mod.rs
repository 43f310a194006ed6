//! Index module - on-disk artifacts, store, and query engine

mod query;
mod registry;
mod store;

pub use query::{QueryEngine, ScoredResult, DEFAULT_TOP_K};
pub use registry::MetadataRegistry;
pub use store::{IndexStore, LoadedIndex, NotBuilt, INDEX_FILE, REGISTRY_FILE};
