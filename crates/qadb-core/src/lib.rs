//! Shared data model, configuration and document loading for qadb.

pub mod config;
pub mod error;
pub mod loader;
pub mod text;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use types::{ContextBundle, Document, Metric, SearchResult};
