//! Retrieval-augmented FAQ answering.
//!
//! [`RagService`] wires the loader, encoder, index, completion client and
//! fallback policy together from one [`Settings`] value.

pub mod engine;
pub mod policy;
pub mod status;

use std::sync::Arc;

use tracing::{info, warn};

use qadb_core::config::Settings;
use qadb_core::error::Result;
use qadb_core::types::SearchResult;
use qadb_embed::get_default_embedder;
use qadb_llm::Generator;
use qadb_vector::BuildOptions;

pub use engine::{IndexState, SearchEngine};
pub use policy::{Answer, FallbackPolicy, Outcome};
pub use status::{DocumentsStatus, EncoderStatus, GeneratorStatus, StatusReport, Thresholds};

pub struct RagService {
    engine: Arc<SearchEngine>,
    generator: Option<Arc<Generator>>,
    policy: FallbackPolicy,
    top_k: usize,
}

impl RagService {
    /// Build every component described by `settings`.
    ///
    /// Never fails: an encoder that cannot load leaves the engine unavailable,
    /// and a completion client that cannot be built disables generation.
    pub fn from_settings(settings: &Settings) -> Self {
        let options = BuildOptions {
            metric: settings.index.metric,
            batch_size: settings.embedding.batch_size,
            show_progress: false,
        };
        Self::from_settings_with_options(settings, options)
    }

    /// As [`from_settings`](Self::from_settings) with explicit index build options.
    pub fn from_settings_with_options(settings: &Settings, options: BuildOptions) -> Self {
        let source = settings.documents.source.clone();
        let engine = match get_default_embedder(&settings.embedding) {
            Ok(embedder) => SearchEngine::new(embedder, source, options),
            Err(e) => {
                warn!(error = %e, "embedding encoder failed to load");
                SearchEngine::unavailable(e.to_string(), source, options)
            }
        };

        let generator = if settings.policy.generate {
            match Generator::from_config(&settings.llm) {
                Ok(generator) => Some(Arc::new(generator)),
                Err(e) => {
                    warn!(error = %e, "completion client disabled");
                    None
                }
            }
        } else {
            None
        };
        Self::new(Arc::new(engine), generator, settings)
    }

    pub fn new(engine: Arc<SearchEngine>, generator: Option<Arc<Generator>>, settings: &Settings) -> Self {
        let policy = FallbackPolicy::new(Arc::clone(&engine), generator.clone(), settings.policy.clone());
        Self { engine, generator, policy, top_k: settings.index.top_k }
    }

    pub fn engine(&self) -> &Arc<SearchEngine> {
        &self.engine
    }

    pub fn initialize(&self) {
        self.engine.initialize();
        info!(state = self.engine.state().label(), documents = self.engine.document_count(), "rag service initialized");
    }

    pub fn reload(&self) -> Result<usize> {
        self.engine.reload()
    }

    /// Answer `question` using `k` retrieved documents (`index.top_k` when `None`).
    pub async fn answer(&self, question: &str, k: Option<usize>) -> Answer {
        self.policy.answer(question, k.unwrap_or(self.top_k)).await
    }

    pub fn search(&self, question: &str, k: Option<usize>) -> Vec<SearchResult> {
        self.engine.search(question, k.unwrap_or(self.top_k))
    }

    pub async fn status(&self) -> StatusReport {
        let state = self.engine.state();
        let reason = match &state {
            IndexState::Unavailable(reason) => Some(reason.clone()),
            _ => None,
        };
        let encoder = match self.engine.encoder() {
            Ok(e) => EncoderStatus::Ready { id: e.id().to_string(), dim: e.dim() },
            Err(reason) => EncoderStatus::Unavailable { reason: reason.to_string() },
        };
        let generator = match (&self.generator, self.policy.config().generate) {
            (Some(g), true) => GeneratorStatus::Enabled {
                model: g.backend().model_name().to_string(),
                reachable: g.backend().is_available().await,
            },
            _ => GeneratorStatus::Disabled,
        };
        StatusReport {
            documents: DocumentsStatus {
                state: state.label().to_string(),
                count: self.engine.document_count(),
                source: self.engine.source().map(|p| p.to_path_buf()),
                reason,
            },
            encoder,
            generator,
            metric: self.engine.metric(),
            thresholds: Thresholds {
                accept: self.policy.config().accept_threshold,
                context: self.policy.config().context_threshold,
            },
        }
    }
}
