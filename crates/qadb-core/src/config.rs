//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_POLICY__ACCEPT_THRESHOLD=0.4`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against the config file directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Metric;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load `config.toml` from the working directory (missing files are fine).
    pub fn load() -> Result<Self> {
        Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load an explicit config file plus its `<stem>.<env>.toml` sibling, with
    /// the environment taken from `RUST_ENV` (default `dev`).
    pub fn from_file(path: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_file_for_env(path, &env_name)
    }

    pub fn from_file_for_env(path: &Path, env_name: &str) -> Result<Self> {
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(path));
        if let Some(suffix) = env_suffix(env_name) {
            let stem = path.file_stem().map_or_else(|| "config".into(), |s| s.to_string_lossy());
            figment = figment.merge(Toml::file(base_dir.join(format!("{stem}.{suffix}.toml"))));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir })
    }

    /// Build from defaults only, ignoring files and the environment.
    pub fn defaults() -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())), base_dir: PathBuf::from(".") }
    }

    /// Layer an extra TOML string over the current configuration.
    pub fn merge_toml(mut self, toml: &str) -> Self {
        self.figment = self.figment.merge(Toml::string(toml));
        self
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract typed settings, resolve relative paths and validate.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.documents.source = resolve_with_base(&self.base_dir, settings.documents.source.to_string_lossy());
        settings.embedding.model_dir = settings
            .embedding
            .model_dir
            .map(|p| resolve_with_base(&self.base_dir, p.to_string_lossy()));
        settings.validate()?;
        Ok(settings)
    }
}

fn env_suffix(env: &str) -> Option<&'static str> {
    match env {
        "dev" | "development" => Some("dev"),
        "prod" | "production" => Some("prod"),
        "test" | "testing" => Some("test"),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub documents: DocumentsConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub policy: PolicyConfig,
    pub llm: LlmConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.index.top_k == 0 {
            return invalid("index.top_k must be at least 1".to_string());
        }
        if self.embedding.batch_size == 0 {
            return invalid("embedding.batch_size must be at least 1".to_string());
        }
        if self.embedding.max_len == 0 {
            return invalid("embedding.max_len must be at least 1".to_string());
        }
        if self.llm.timeout_secs == 0 {
            return invalid("llm.timeout_secs must be at least 1".to_string());
        }
        // Room for one character plus the "..." suffix.
        if self.policy.max_answer_chars < 4 {
            return invalid("policy.max_answer_chars must be at least 4".to_string());
        }
        let (accept, context) = (self.policy.accept_threshold, self.policy.context_threshold);
        if !accept.is_finite() || !context.is_finite() {
            return invalid("policy thresholds must be finite".to_string());
        }
        match self.index.metric {
            Metric::InnerProduct => {
                for (name, v) in [("accept_threshold", accept), ("context_threshold", context)] {
                    if !(-1.0..=1.0).contains(&v) {
                        return invalid(format!("policy.{name} = {v} is outside [-1, 1] for inner_product"));
                    }
                }
                if context > accept {
                    return invalid(format!("policy.context_threshold ({context}) must not exceed accept_threshold ({accept})"));
                }
            }
            Metric::L2 => {
                if accept < 0.0 || context < 0.0 {
                    return invalid("policy thresholds must be non-negative distances for l2".to_string());
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// A `.json`/`.jsonl` file or a directory of them.
    pub source: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self { source: PathBuf::from("data/json/documents.json") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Sentence-transformers model name; also the fallback `models/<name>` directory.
    pub model: String,
    pub model_dir: Option<PathBuf>,
    pub max_len: usize,
    pub batch_size: usize,
    /// Use the deterministic hashing embedder instead of model weights.
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "paraphrase-multilingual-mpnet-base-v2".to_string(),
            model_dir: None,
            max_len: 128,
            batch_size: 32,
            use_fake: false,
            fake_dim: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub metric: Metric,
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { metric: Metric::InnerProduct, top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Minimum top score for a question to count as answerable.
    pub accept_threshold: f32,
    /// Minimum score for a hit to be included as grounding context.
    pub context_threshold: f32,
    /// Synthesize the final answer with the completion service.
    pub generate: bool,
    /// Append `(ความมั่นใจ: NN%)` to answered replies (inner product only).
    pub show_confidence: bool,
    pub max_answer_chars: usize,
    pub messages: PolicyMessages,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.3,
            context_threshold: 0.2,
            generate: true,
            show_confidence: false,
            max_answer_chars: 5000,
            messages: PolicyMessages::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyMessages {
    pub unavailable: String,
    pub no_match: String,
    pub low_confidence: String,
    pub search_error: String,
}

impl Default for PolicyMessages {
    fn default() -> Self {
        Self {
            unavailable: "ขออภัย ระบบยังไม่พร้อมใช้งาน".to_string(),
            no_match: "ไม่พบข้อมูลที่เกี่ยวข้อง".to_string(),
            low_confidence: "ไม่พบข้อมูลที่ตรงกับคำถามเพียงพอ".to_string(),
            search_error: "เกิดข้อผิดพลาดในการค้นหา".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub num_predict: u32,
    /// Cleaned output shorter than this (in characters) is replaced by `non_answer`.
    pub min_answer_chars: usize,
    /// Cleaned output containing any of these is replaced by `non_answer`. Empty by default.
    pub reject_markers: Vec<String>,
    pub unavailable_message: String,
    pub non_answer: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 30,
            temperature: 0.7,
            num_predict: 512,
            min_answer_chars: 10,
            reject_markers: Vec::new(),
            unavailable_message: "ขออภัย ระบบ AI ยังไม่พร้อมใช้งาน กรุณารอสักครู่".to_string(),
            non_answer: "ขออภัย ฉันไม่สามารถตอบคำถามนี้ได้อย่างเหมาะสม กรุณาถามคำถามอื่น หรือถามในรูปแบบอื่น".to_string(),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = Config::defaults().settings().unwrap();
        assert_eq!(s.index.top_k, 3);
        assert!((s.policy.accept_threshold - 0.3).abs() < 1e-6);
        assert!((s.policy.context_threshold - 0.2).abs() < 1e-6);
        assert_eq!(s.llm.timeout_secs, 30);
        assert_eq!(s.llm.min_answer_chars, 10);
        assert!(s.llm.reject_markers.is_empty(), "grounded answers may contain words like ไม่สามารถ");
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg = Config::defaults().merge_toml("[policy]\naccept_threshold = 0.5\ncontext_threshold = 0.3\n[index]\nmetric = \"l2\"\n");
        let s = cfg.settings().unwrap();
        assert!((s.policy.accept_threshold - 0.5).abs() < 1e-6);
        assert_eq!(s.index.metric, Metric::L2);
        let k: usize = cfg.get("index.top_k").unwrap();
        assert_eq!(k, 3);
    }

    #[test]
    fn context_above_accept_is_rejected() {
        let cfg = Config::defaults().merge_toml("[policy]\naccept_threshold = 0.2\ncontext_threshold = 0.5\n");
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let cfg = Config::defaults().merge_toml("[policy]\naccept_threshold = 1.5\n");
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let cfg = Config::defaults().merge_toml("[index]\ntop_k = 0\n");
        assert!(cfg.settings().is_err());
    }

    #[test]
    fn answer_limit_below_four_chars_is_rejected() {
        let cfg = Config::defaults().merge_toml("[policy]\nmax_answer_chars = 3\n");
        assert!(matches!(cfg.settings(), Err(Error::InvalidConfig(_))));
        let cfg = Config::defaults().merge_toml("[policy]\nmax_answer_chars = 4\n");
        assert_eq!(cfg.settings().unwrap().policy.max_answer_chars, 4);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let p = resolve_with_base(Path::new("/srv/bot"), "data/docs.json");
        assert_eq!(p, PathBuf::from("/srv/bot/data/docs.json"));
        let p = resolve_with_base(Path::new("/srv/bot"), "/abs/docs.json");
        assert_eq!(p, PathBuf::from("/abs/docs.json"));
    }
}
