use std::fs;
use tempfile::TempDir;

use qadb_core::config::Config;
use qadb_core::types::Metric;

#[test]
fn file_and_env_sibling_are_layered() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(
        dir.join("config.toml"),
        "[documents]\nsource = \"data/faq.json\"\n\n[policy]\naccept_threshold = 0.5\ncontext_threshold = 0.3\n",
    )
    .unwrap();
    fs::write(dir.join("config.test.toml"), "[index]\ntop_k = 5\n\n[llm]\ntimeout_secs = 5\n").unwrap();

    let config = Config::from_file_for_env(&dir.join("config.toml"), "test").expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.documents.source, dir.join("data/faq.json"), "relative source resolves against the config dir");
    assert!((settings.policy.accept_threshold - 0.5).abs() < 1e-6);
    assert_eq!(settings.index.top_k, 5, "env sibling overrides base file");
    assert_eq!(settings.llm.timeout_secs, 5);
    assert_eq!(settings.index.metric, Metric::InnerProduct, "untouched keys keep defaults");
}

#[test]
fn unknown_env_skips_sibling_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("config.toml"), "[index]\ntop_k = 4\n").unwrap();
    fs::write(dir.join("config.prod.toml"), "[index]\ntop_k = 9\n").unwrap();

    let settings = Config::from_file_for_env(&dir.join("config.toml"), "staging")
        .and_then(|c| c.settings())
        .expect("settings");
    assert_eq!(settings.index.top_k, 4);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::from_file_for_env(&tmp.path().join("absent.toml"), "dev")
        .and_then(|c| c.settings())
        .expect("settings");
    assert_eq!(settings.index.top_k, 3);
    assert_eq!(settings.llm.model, "llama3.2");
}

#[test]
fn invalid_values_fail_validation() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[embedding]\nbatch_size = 0\n").unwrap();
    let config = Config::from_file_for_env(&path, "dev").expect("load");
    assert!(config.settings().is_err());
}
