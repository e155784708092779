use crate::error::{Error, Result};

/// Maps text to fixed-dimension dense vectors.
///
/// Implementations are loaded once and shared across requests, so `embed_batch`
/// takes `&self`. Every vector returned by one embedder has length `dim()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model behind this embedder (e.g. `fake:trigram:d1024`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Encoding("encoder returned no vector".to_string()))
    }
}
