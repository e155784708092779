use qadb_core::config::EmbeddingConfig;
use qadb_core::error::Error;
use qadb_core::traits::Embedder;
use qadb_embed::{get_default_embedder, resolve_model_dir, FakeEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

fn fake_config() -> EmbeddingConfig {
    EmbeddingConfig { use_fake: true, ..EmbeddingConfig::default() }
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = get_default_embedder(&fake_config()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    assert_eq!(embedder.dim(), 1024);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn near_duplicate_thai_questions_score_high() {
    let e = FakeEmbedder::new(1024);
    let doc = e.embed("การลาป่วยสามารถลาได้กี่วันต่อปี การลาป่วยสามารถลาได้ไม่เกิน 30 วันทำการต่อปี").unwrap();
    let query = e.embed("ลาป่วยได้กี่วันต่อปี").unwrap();
    let unrelated = e.embed("สภาพอากาศวันพรุ่งนี้เป็นอย่างไร").unwrap();

    let close = dot(&doc, &query);
    let far = dot(&doc, &unrelated);
    assert!(close >= 0.5, "near duplicate scored {close}");
    assert!(far < 0.3, "unrelated scored {far}");
}

#[test]
fn blank_text_embeds_to_zero_vector() {
    let v = FakeEmbedder::new(16).embed("   ").unwrap();
    assert_eq!(v.len(), 16);
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn empty_batch_is_empty() {
    assert!(FakeEmbedder::new(8).embed_batch(&[]).unwrap().is_empty());
}

#[test]
fn explicit_model_dir_wins() {
    let tmp = tempfile::TempDir::new().unwrap();
    let cfg = EmbeddingConfig { model_dir: Some(tmp.path().to_path_buf()), ..EmbeddingConfig::default() };
    assert_eq!(resolve_model_dir(&cfg).unwrap(), tmp.path());
}

#[test]
fn missing_model_dir_is_not_found() {
    if std::env::var("APP_MODEL_DIR").is_ok() || std::env::var("MODEL_DIR").is_ok() {
        return;
    }
    let cfg = EmbeddingConfig { model: "no-such-model-7f3a".to_string(), ..EmbeddingConfig::default() };
    assert!(matches!(resolve_model_dir(&cfg), Err(Error::NotFound(_))));
}
