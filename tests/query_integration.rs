//! End-to-end query tests over indexes built on disk.

use postmerge::index::build::build_index;
use postmerge::index::{IndexReader, IndexWriter, MemoryIndex, TermIndex};
use postmerge::merge::{MergeError, MergeOp};
use postmerge::query::{QueryConfig, QueryExecutor, QueryRequest};
use postmerge::utils::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Nine documents, `doc1.txt`..`doc9.txt` (ids 1..9 in path order).
/// "apple" appears in 1, 3, 5, 7 and "banana" in 3, 5, 9.
fn create_corpus() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for id in 1..=9u32 {
        let mut words = vec!["filler"];
        if [1, 3, 5, 7].contains(&id) {
            words.push("apple");
        }
        if [3, 5, 9].contains(&id) {
            words.push("banana");
        }
        if id == 5 {
            words.extend(["banana", "banana"]);
        }
        fs::write(dir.path().join(format!("doc{id}.txt")), words.join(" ")).unwrap();
    }
    dir
}

fn build_fixture() -> (TempDir, TempDir, PathBuf) {
    let corpus = create_corpus();
    let out = TempDir::new().unwrap();
    let index_path = out.path().join("index");
    build_index(corpus.path(), &index_path, true).expect("index build failed");
    (corpus, out, index_path)
}

fn query(index_path: &PathBuf, terms: &[&str], op: MergeOp) -> QueryConfig {
    QueryConfig {
        index_path: index_path.clone(),
        terms: terms.iter().map(|s| s.to_string()).collect(),
        op,
    }
}

fn hit_ids(config: &QueryConfig) -> Vec<u32> {
    config
        .run(&Settings::default())
        .unwrap()
        .hits
        .iter()
        .map(|h| h.doc_id)
        .collect()
}

#[test]
fn test_or_is_union() {
    let (_corpus, _out, index_path) = build_fixture();
    let config = query(&index_path, &["apple", "banana"], MergeOp::Or);
    assert_eq!(hit_ids(&config), vec![1, 3, 5, 7, 9]);
}

#[test]
fn test_and_is_intersection() {
    let (_corpus, _out, index_path) = build_fixture();
    let config = query(&index_path, &["apple", "banana"], MergeOp::And);
    assert_eq!(hit_ids(&config), vec![3, 5]);
}

#[test]
fn test_single_term_reproduces_posting() {
    let (_corpus, _out, index_path) = build_fixture();
    for op in [MergeOp::And, MergeOp::Or] {
        let config = query(&index_path, &["banana"], op);
        assert_eq!(hit_ids(&config), vec![3, 5, 9]);
    }
}

#[test]
fn test_unresolved_term_is_omitted() {
    let (_corpus, _out, index_path) = build_fixture();
    let config = query(&index_path, &["apple", "cherry"], MergeOp::And);
    let result = config.run(&Settings::default()).unwrap();

    assert_eq!(result.unresolved, vec!["cherry".to_string()]);
    let ids: Vec<u32> = result.hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, vec![1, 3, 5, 7]);
}

#[test]
fn test_undefined_operator_reports_failure() {
    let (_corpus, _out, index_path) = build_fixture();
    let config = query(&index_path, &["apple"], MergeOp::Undefined);
    let err = config.run(&Settings::default()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<MergeError>(),
        Some(&MergeError::UndefinedOperator)
    );
}

#[test]
fn test_missing_index_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = query(&dir.path().join("nope"), &["apple"], MergeOp::Or);
    assert!(config.run(&Settings::default()).is_err());
}

#[test]
fn test_scores_rank_repeated_terms_higher() {
    let (_corpus, _out, index_path) = build_fixture();
    let config = query(&index_path, &["banana"], MergeOp::Or);
    let result = config.run(&Settings::default()).unwrap();

    let score = |id: u32| result.hits.iter().find(|h| h.doc_id == id).unwrap().score;
    assert!(result.hits.iter().all(|h| h.score > 0.0));
    // doc 5 repeats banana three times
    assert!(score(5) > score(9));
}

#[test]
fn test_doc_names_follow_path_order() {
    let (_corpus, _out, index_path) = build_fixture();
    let reader = IndexReader::open(&index_path).unwrap();
    assert_eq!(reader.doc_count(), 9);
    assert_eq!(reader.doc_name(1), Some("doc1.txt"));
    assert_eq!(reader.doc_name(9), Some("doc9.txt"));
    assert_eq!(reader.doc_name(10), None);
}

#[test]
fn test_disk_and_memory_indexes_agree() {
    let mut memory = MemoryIndex::new();
    let texts = [
        "the quick brown fox",
        "jumps over the lazy dog",
        "the dog sleeps",
        "a quick dog and a quick fox",
    ];
    for (i, text) in texts.iter().enumerate() {
        memory.add_document(format!("t{i}"), text);
    }

    let dir = TempDir::new().unwrap();
    IndexWriter::new(dir.path()).write(&memory).unwrap();
    let reader = IndexReader::open(dir.path()).unwrap();

    let terms: Vec<String> = ["quick", "dog", "the"].iter().map(|s| s.to_string()).collect();
    for op in [MergeOp::And, MergeOp::Or] {
        let from_memory = QueryExecutor::new(&memory).execute(&terms, op).unwrap();
        let from_disk = QueryExecutor::new(&reader).execute(&terms, op).unwrap();

        assert_eq!(from_memory.hits.len(), from_disk.hits.len());
        for (a, b) in from_memory.hits.iter().zip(&from_disk.hits) {
            assert_eq!(a.doc_id, b.doc_id);
            assert!((a.score - b.score).abs() < 1e-5);
        }
    }
}

#[test]
fn test_batch_over_disk_index() {
    let (_corpus, _out, index_path) = build_fixture();
    let reader = IndexReader::open(&index_path).unwrap();
    let executor = QueryExecutor::new(&reader);

    let requests: Vec<QueryRequest> = serde_json::from_str(
        r#"[
            {"terms": ["apple", "banana"], "op": "AND"},
            {"terms": ["apple", "banana"], "op": "OR"},
            {"terms": ["cherry"], "op": "OR"}
        ]"#,
    )
    .unwrap();

    let results = executor.execute_batch(&requests);
    let ids = |i: usize| -> Vec<u32> {
        results[i]
            .as_ref()
            .unwrap()
            .hits
            .iter()
            .map(|h| h.doc_id)
            .collect()
    };
    assert_eq!(ids(0), vec![3, 5]);
    assert_eq!(ids(1), vec![1, 3, 5, 7, 9]);
    assert_eq!(results[2].as_ref().unwrap_err(), &MergeError::NoPostings);
}
