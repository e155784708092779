//! Similarity Search Engine: owns the encoder and the live index.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use qadb_core::error::{Error, Result};
use qadb_core::loader::DocumentLoader;
use qadb_core::text::normalize_query;
use qadb_core::traits::Embedder;
use qadb_core::types::{Metric, SearchResult};
use qadb_vector::{BuildOptions, VectorIndex};

#[derive(Debug, Clone)]
pub enum IndexState {
    Uninitialized,
    Ready(Arc<VectorIndex>),
    Unavailable(String),
}

impl IndexState {
    pub fn label(&self) -> &'static str {
        match self {
            IndexState::Uninitialized => "uninitialized",
            IndexState::Ready(_) => "ready",
            IndexState::Unavailable(_) => "unavailable",
        }
    }
}

pub struct SearchEngine {
    embedder: std::result::Result<Arc<dyn Embedder>, String>,
    source: Option<PathBuf>,
    loader: DocumentLoader,
    options: BuildOptions,
    init: Once,
    state: RwLock<IndexState>,
}

impl SearchEngine {
    /// Engine that builds its index from `source` on first use.
    pub fn new(embedder: Arc<dyn Embedder>, source: impl Into<PathBuf>, options: BuildOptions) -> Self {
        Self {
            embedder: Ok(embedder),
            source: Some(source.into()),
            loader: DocumentLoader::new(),
            options,
            init: Once::new(),
            state: RwLock::new(IndexState::Uninitialized),
        }
    }

    /// Engine whose encoder failed to load. Every search reports `reason`.
    pub fn unavailable(reason: impl Into<String>, source: impl Into<PathBuf>, options: BuildOptions) -> Self {
        Self {
            embedder: Err(reason.into()),
            source: Some(source.into()),
            loader: DocumentLoader::new(),
            options,
            init: Once::new(),
            state: RwLock::new(IndexState::Uninitialized),
        }
    }

    /// Engine over a prebuilt index; nothing is loaded from disk.
    pub fn with_index(index: VectorIndex, embedder: Arc<dyn Embedder>) -> Self {
        let options = BuildOptions { metric: index.metric(), ..BuildOptions::default() };
        let engine = Self {
            embedder: Ok(embedder),
            source: None,
            loader: DocumentLoader::new(),
            options,
            init: Once::new(),
            state: RwLock::new(IndexState::Ready(Arc::new(index))),
        };
        engine.init.call_once(|| {});
        engine
    }

    /// Load and index the document source. Runs once; concurrent callers
    /// wait for the first to finish.
    pub fn initialize(&self) {
        self.init.call_once(|| {
            let next = match self.build_index() {
                Ok(index) => IndexState::Ready(Arc::new(index)),
                Err(e) => {
                    error!(error = %e, "search index unavailable");
                    IndexState::Unavailable(e.to_string())
                }
            };
            *self.state.write() = next;
        });
    }

    /// Rebuild from the source and swap it in. On failure the current index
    /// stays in place.
    pub fn reload(&self) -> Result<usize> {
        if !self.init.is_completed() {
            self.initialize();
            return match self.state() {
                IndexState::Ready(index) => Ok(index.len()),
                IndexState::Unavailable(reason) => Err(Error::Unavailable(reason)),
                IndexState::Uninitialized => Err(Error::Unavailable("index not initialized".to_string())),
            };
        }
        let index = self.build_index()?;
        let count = index.len();
        *self.state.write() = IndexState::Ready(Arc::new(index));
        info!(documents = count, "search index reloaded");
        Ok(count)
    }

    fn build_index(&self) -> Result<VectorIndex> {
        let embedder = self.embedder()?;
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("engine has no document source".to_string()))?;
        let documents = self.loader.load(source)?;
        if documents.is_empty() {
            warn!(source = %source.display(), "document source is empty");
        }
        VectorIndex::build(documents, &**embedder, &self.options)
    }

    fn embedder(&self) -> Result<&Arc<dyn Embedder>> {
        self.embedder.as_ref().map_err(|reason| Error::Unavailable(reason.clone()))
    }

    fn ready_index(&self) -> Result<Arc<VectorIndex>> {
        match &*self.state.read() {
            IndexState::Ready(index) => Ok(Arc::clone(index)),
            IndexState::Unavailable(reason) => Err(Error::Unavailable(reason.clone())),
            IndexState::Uninitialized => Err(Error::Unavailable("index not initialized".to_string())),
        }
    }

    /// Rank documents against `question`, best first.
    pub fn try_search(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.initialize();
        let index = self.ready_index()?;
        let embedder = self.embedder()?;

        let query = normalize_query(question);
        if index.is_empty() || k == 0 || query.is_empty() {
            return Ok(Vec::new());
        }
        let vector = embedder.embed(&query)?;
        let metric = index.metric();
        let mut results: Vec<SearchResult> = index
            .search(&vector, k)
            .into_iter()
            .filter_map(|(i, score)| index.document(i).map(|doc| SearchResult::from_document(doc, score)))
            .collect();
        results.sort_by(|a, b| metric.better(a.score, b.score));

        if let Some(top) = results.first() {
            debug!(question = %top.question, score = top.score, hits = results.len(), "top match");
        }
        Ok(results)
    }

    /// Like [`try_search`](Self::try_search) but logs failures and returns
    /// nothing instead.
    pub fn search(&self, question: &str, k: usize) -> Vec<SearchResult> {
        self.try_search(question, k).unwrap_or_else(|e| {
            error!(error = %e, "search failed");
            Vec::new()
        })
    }

    pub fn state(&self) -> IndexState {
        self.state.read().clone()
    }

    pub fn document_count(&self) -> usize {
        match &*self.state.read() {
            IndexState::Ready(index) => index.len(),
            _ => 0,
        }
    }

    pub fn metric(&self) -> Metric {
        self.options.metric
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// `Err` carries the reason the encoder could not be loaded.
    pub fn encoder(&self) -> std::result::Result<&dyn Embedder, &str> {
        self.embedder.as_ref().map(|e| &**e).map_err(String::as_str)
    }
}
