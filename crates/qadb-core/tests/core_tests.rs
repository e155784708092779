use std::fs;
use tempfile::TempDir;

use qadb_core::error::Error;
use qadb_core::loader::DocumentLoader;

#[test]
fn load_single_file_keeps_order_and_drops_invalid() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("faq.json");
    fs::write(
        &path,
        r#"[
            {"question": "ลาป่วยกี่วัน", "answer": "ลาป่วยได้ไม่เกิน 30 วันทำการ"},
            {"question": "no answer"},
            {"question": "", "answer": "empty question"},
            {"question": "ลากิจกี่วัน", "answer": "ลากิจได้ไม่เกิน 45 วันทำการ", "tags": ["hr"]}
        ]"#,
    )
    .unwrap();

    let docs = DocumentLoader::new().load(&path).expect("load");

    assert_eq!(docs.len(), 2, "records without question/answer are dropped");
    assert_eq!(docs[0].question, "ลาป่วยกี่วัน");
    assert_eq!(docs[1].question, "ลากิจกี่วัน");
    assert_eq!(docs[0].source.as_deref(), Some("faq"));
    assert_eq!(docs[0].text, "ลาป่วยกี่วัน ลาป่วยได้ไม่เกิน 30 วันทำการ");
}

#[test]
fn load_directory_merges_in_file_order_and_skips_broken_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.json"), r#"[{"question": "qa", "answer": "aa"}]"#).unwrap();
    fs::write(dir.join("b.json"), "{ this is not json").unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(
        dir.join("nested").join("c.jsonl"),
        "{\"question\": \"qc1\", \"answer\": \"ac1\"}\n\n{\"question\": \"qc2\", \"answer\": \"ac2\", \"source\": \"manual\"}\n",
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let docs = DocumentLoader::new().load(dir).expect("load dir");

    let questions: Vec<&str> = docs.iter().map(|d| d.question.as_str()).collect();
    assert_eq!(questions, vec!["qa", "qc1", "qc2"]);
    assert_eq!(docs[2].source.as_deref(), Some("manual"));
}

#[test]
fn empty_directory_yields_no_documents() {
    let tmp = TempDir::new().unwrap();
    let docs = DocumentLoader::new().load(tmp.path()).expect("load");
    assert!(docs.is_empty());
}

#[test]
fn missing_source_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = DocumentLoader::new().load(&tmp.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn single_broken_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    fs::write(&path, "[{").unwrap();
    let err = DocumentLoader::new().load(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
