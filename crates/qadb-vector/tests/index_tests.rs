use qadb_core::error::{Error, Result};
use qadb_core::traits::Embedder;
use qadb_core::types::{Document, Metric};
use qadb_embed::FakeEmbedder;
use qadb_vector::{BuildOptions, VectorIndex};

fn corpus() -> Vec<Document> {
    [
        ("ลาป่วยได้กี่วัน", "ลาป่วยได้ไม่เกิน 30 วันทำการต่อปี"),
        ("ลากิจได้กี่วัน", "ลากิจได้ไม่เกิน 45 วันทำการต่อปี"),
        ("เบิกค่ารักษาพยาบาลอย่างไร", "ยื่นแบบฟอร์มเบิกพร้อมใบเสร็จที่ฝ่ายบุคคล"),
        ("ทำงานที่บ้านได้ไหม", "ทำงานที่บ้านได้สัปดาห์ละสองวันเมื่อหัวหน้าอนุมัติ"),
        ("วันหยุดประจำปีมีกี่วัน", "วันหยุดพักผ่อนประจำปี 10 วันทำการ"),
    ]
    .into_iter()
    .map(|(q, a)| Document::new(q, a, Some("hr".to_string())))
    .collect()
}

fn options(metric: Metric) -> BuildOptions {
    BuildOptions { metric, batch_size: 2, show_progress: false }
}

#[test]
fn identical_inputs_give_identical_results() {
    let embedder = FakeEmbedder::new(256);
    let index = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    let q = embedder.embed("ลาป่วยได้กี่วัน").unwrap();
    assert_eq!(index.search(&q, 3), index.search(&q, 3));
}

#[test]
fn inner_product_scores_descend_and_l2_ascend() {
    let embedder = FakeEmbedder::new(256);
    let q = embedder.embed("ลากิจได้กี่วันทำการ").unwrap();

    let ip = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    let hits = ip.search(&q, 5);
    assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1), "{hits:?}");
    assert_eq!(hits[0].0, 1);

    let l2 = VectorIndex::build(corpus(), &embedder, &options(Metric::L2)).unwrap();
    let hits = l2.search(&q, 5);
    assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1), "{hits:?}");
    assert_eq!(hits[0].0, 1);
}

#[test]
fn result_count_is_bounded_by_k_and_size() {
    let embedder = FakeEmbedder::new(64);
    let index = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    let q = embedder.embed("วันหยุด").unwrap();
    assert_eq!(index.search(&q, 0).len(), 0);
    assert_eq!(index.search(&q, 2).len(), 2);
    assert_eq!(index.search(&q, 50).len(), 5);
}

#[test]
fn empty_index_returns_nothing() {
    let embedder = FakeEmbedder::new(64);
    let index = VectorIndex::build(Vec::new(), &embedder, &options(Metric::InnerProduct)).unwrap();
    assert!(index.is_empty());
    assert!(index.search(&embedder.embed("anything").unwrap(), 3).is_empty());
}

#[test]
fn rebuild_from_same_input_matches() {
    let embedder = FakeEmbedder::new(128);
    let a = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    let b = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    let q = embedder.embed("ทำงานที่บ้าน").unwrap();
    assert_eq!(a.search(&q, 5), b.search(&q, 5));
    assert_eq!(a.documents(), b.documents());
}

#[test]
fn equal_scores_keep_insertion_order() {
    let docs: Vec<Document> = (0..4).map(|i| Document::new(format!("q{i}"), "a", None)).collect();
    let vectors = vec![vec![1.0, 0.0]; 4];
    let index = VectorIndex::from_vectors(docs, vectors, Metric::InnerProduct).unwrap();
    let positions: Vec<usize> = index.search(&[1.0, 0.0], 4).into_iter().map(|(i, _)| i).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

#[test]
fn wrong_query_dimension_returns_nothing() {
    let embedder = FakeEmbedder::new(32);
    let index = VectorIndex::build(corpus(), &embedder, &options(Metric::InnerProduct)).unwrap();
    assert!(index.search(&[1.0, 2.0], 3).is_empty());
}

struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn id(&self) -> &str { "short" }
    fn dim(&self) -> usize { 8 }
    fn max_len(&self) -> usize { 16 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
    }
}

#[test]
fn encoder_dimension_is_enforced() {
    let err = VectorIndex::build(corpus(), &ShortEmbedder, &options(Metric::InnerProduct)).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 8, actual: 4 }));
}
