//! Vector Index: an in-memory exact-scan index over document embeddings.

mod index;
mod index_build;

pub use index::{l2_normalize, VectorIndex};
pub use index_build::BuildOptions;
