//! Document Store Loader: reads question/answer records from JSON sources.
//!
//! A source is either one file or a directory walked recursively. Recognized
//! files are `.json` (an array of records, or an object with a `documents`
//! array) and `.jsonl` (one record per line).

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::Document;

pub const DOCUMENT_EXTENSIONS: &[&str] = &["json", "jsonl"];

pub fn is_document_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

#[derive(Debug, Default, Clone)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self { Self }

    /// Load every valid record under `path`, in file order then in-file order.
    ///
    /// Inside a directory, files that fail to read or parse are skipped with a
    /// warning. A single named file that fails is an error.
    pub fn load(&self, path: &Path) -> Result<Vec<Document>> {
        if !path.exists() {
            return Err(Error::NotFound(format!("document source {}", path.display())));
        }
        let documents = if path.is_dir() { self.load_directory(path) } else { self.load_file(path)? };
        info!(path = %path.display(), documents = documents.len(), "loaded document source");
        Ok(documents)
    }

    fn load_directory(&self, dir: &Path) -> Vec<Document> {
        let files = self.list_source_files(dir);
        if files.is_empty() {
            warn!(dir = %dir.display(), "no document files found");
            return vec![];
        }
        let mut all = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "loading file {}/{}", file_index + 1, files.len());
            match self.load_file(file_path) {
                Ok(docs) => all.extend(docs),
                Err(e) => warn!(file = %file_path.display(), error = %e, "skipping unreadable document file"),
            }
        }
        all
    }

    fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let records = parse_records(path, &content)?;
        let default_source = path.file_stem().map(|s| s.to_string_lossy().to_string());
        let total = records.len();
        let docs: Vec<Document> = records
            .iter()
            .filter_map(|r| to_document(r, default_source.as_deref()))
            .collect();
        if docs.len() < total {
            debug!(file = %path.display(), dropped = total - docs.len(), "dropped records without question/answer");
        }
        Ok(docs)
    }

    fn list_source_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root) {
            match entry {
                Ok(e) if e.file_type().is_file() && is_document_file(e.path()) => files.push(e.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().unwrap_or(root).display().to_string();
                    warn!(path = %path, error = %e, "skipping unreadable path");
                }
            }
        }
        files.sort();
        files
    }
}

fn parse_records(path: &Path, content: &str) -> Result<Vec<Value>> {
    let parse_err = |reason: String| Error::Parse { path: path.to_path_buf(), reason };
    let is_jsonl = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    if is_jsonl {
        return content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| serde_json::from_str(line).map_err(|e| parse_err(format!("line {}: {e}", n + 1))))
            .collect();
    }

    match serde_json::from_str::<Value>(content).map_err(|e| parse_err(e.to_string()))? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("documents") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(parse_err("expected an array or an object with a `documents` array".to_string())),
        },
        _ => Err(parse_err("expected an array or an object with a `documents` array".to_string())),
    }
}

fn to_document(record: &Value, default_source: Option<&str>) -> Option<Document> {
    let field = |name: &str| {
        record
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let question = field("question")?;
    let answer = field("answer")?;
    let source = field("source").or(default_source).map(str::to_string);
    Some(Document::new(question, answer, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_without_answer_is_dropped() {
        assert!(to_document(&json!({"question": "q"}), None).is_none());
        assert!(to_document(&json!({"question": "q", "answer": "  "}), None).is_none());
        assert!(to_document(&json!("not an object"), None).is_none());
    }

    #[test]
    fn record_source_overrides_file_stem() {
        let d = to_document(&json!({"question": "q", "answer": "a", "source": "hr"}), Some("faq")).unwrap();
        assert_eq!(d.source.as_deref(), Some("hr"));
        let d = to_document(&json!({"question": "q", "answer": "a", "extra": 1}), Some("faq")).unwrap();
        assert_eq!(d.source.as_deref(), Some("faq"));
    }

    #[test]
    fn object_with_documents_array_is_accepted() {
        let v = parse_records(Path::new("x.json"), r#"{"documents":[{"question":"q","answer":"a"}]}"#).unwrap();
        assert_eq!(v.len(), 1);
        assert!(parse_records(Path::new("x.json"), r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_document_file(Path::new("a/FAQ.JSON")));
        assert!(is_document_file(Path::new("a.jsonl")));
        assert!(!is_document_file(Path::new("a.txt")));
    }

    #[test]
    fn walk_errors_do_not_stop_listing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("gone");
        assert!(DocumentLoader::new().list_source_files(&missing).is_empty());

        fs::write(tmp.path().join("faq.json"), "[]").unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.json"), "[]").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        }
        let files = DocumentLoader::new().list_source_files(tmp.path());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        }
        assert!(files.contains(&tmp.path().join("faq.json")));
    }
}
