//! Integration tests for the postmerge command-line surface.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn postmerge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_postmerge"))
        .args(args)
        .env("POSTMERGE_LOG", "off")
        .output()
        .expect("Failed to run postmerge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Index a small corpus and return (corpus dir, index path)
fn indexed_corpus() -> (TempDir, TempDir) {
    let corpus = TempDir::new().unwrap();
    fs::write(corpus.path().join("a.txt"), "merge sorted postings").unwrap();
    fs::write(corpus.path().join("b.txt"), "score postings with bm25").unwrap();
    fs::write(corpus.path().join("c.txt"), "merge and score").unwrap();

    let out = TempDir::new().unwrap();
    let output = postmerge(&[
        "-q",
        "index",
        corpus.path().to_str().unwrap(),
        "-o",
        index_dir(&out).to_str().unwrap(),
    ]);
    assert!(output.status.success(), "index failed: {}", stderr(&output));
    (corpus, out)
}

fn index_dir(out: &TempDir) -> std::path::PathBuf {
    out.path().join("idx")
}

fn hit_names(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.split('\t').count() == 3)
        .map(|line| line.rsplit('\t').next().unwrap().to_string())
        .collect()
}

#[test]
fn test_missing_path_fails() {
    let output = postmerge(&["-t", "merge", "-o", "AND"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing index path"));
}

#[test]
fn test_missing_terms_fails() {
    let output = postmerge(&["-p", "/nonexistent", "-o", "OR"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no query terms"));
}

#[test]
fn test_and_query() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let output = postmerge(&[
        "--no-color",
        "-p",
        index.to_str().unwrap(),
        "-t",
        "merge",
        "-t",
        "score",
        "-o",
        "AND",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(hit_names(&stdout(&output)), vec!["c.txt"]);
}

#[test]
fn test_or_query_with_unresolved_term() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let output = postmerge(&[
        "--no-color",
        "-p",
        index.to_str().unwrap(),
        "-t",
        "merge",
        "-t",
        "zebra",
        "-o",
        "OR",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("not found: zebra"));
    assert_eq!(hit_names(&text), vec!["a.txt", "c.txt"]);
}

#[test]
fn test_unrecognized_operator_fails() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let output = postmerge(&["-p", index.to_str().unwrap(), "-t", "merge", "-o", "XOR"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("posting merge operation undefined"));
    assert!(hit_names(&stdout(&output)).is_empty());
}

#[test]
fn test_json_output() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let output = postmerge(&[
        "--json",
        "-p",
        index.to_str().unwrap(),
        "-t",
        "postings",
        "-o",
        "OR",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<u64> = value["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["doc_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_batch_json() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let batch = out.path().join("batch.json");
    fs::write(
        &batch,
        r#"[{"terms": ["merge", "score"], "op": "AND"}, {"terms": ["merge"], "op": "NOPE"}]"#,
    )
    .unwrap();

    // unknown op strings are rejected when the batch is parsed
    let output = postmerge(&["batch", index.to_str().unwrap(), batch.to_str().unwrap(), "--json"]);
    assert!(!output.status.success());

    fs::write(
        &batch,
        r#"[{"terms": ["merge", "score"], "op": "AND"}, {"terms": ["merge"]}]"#,
    )
    .unwrap();
    let output = postmerge(&["batch", index.to_str().unwrap(), batch.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["result"]["hits"][0]["doc_id"], 3);
    assert_eq!(value[1]["error"], "posting merge operation undefined");
}

#[test]
fn test_stats() {
    let (_corpus, out) = indexed_corpus();
    let output = postmerge(&["stats", index_dir(&out).to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Document count:   3"));
}

#[test]
fn test_stats_missing_index() {
    let dir = TempDir::new().unwrap();
    let output = postmerge(&["stats", dir.path().join("none").to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("index not found"));
}

#[test]
fn test_global_flags_before_subcommand() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let config = out.path().join("settings.json");
    fs::write(&config, r#"{"max_hits": 5}"#).unwrap();

    let output = postmerge(&["--config", config.to_str().unwrap(), "stats", index.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Document count:   3"));

    let output = postmerge(&["-v", "stats", index.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_query_options_rejected_with_subcommand() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let output = postmerge(&["-t", "merge", "stats", index.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot be combined with a subcommand"));
}

#[test]
fn test_argument_errors_come_before_config_errors() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.json");
    fs::write(&config, "not json").unwrap();

    let output = postmerge(&["--config", config.to_str().unwrap(), "-t", "merge"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing index path"));

    let output = postmerge(&["--config", config.to_str().unwrap(), "-p", "/nonexistent"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no query terms"));
}

#[test]
fn test_batch_text_honors_no_color() {
    let (_corpus, out) = indexed_corpus();
    let index = index_dir(&out);
    let batch = out.path().join("batch.json");
    fs::write(&batch, r#"[{"terms": ["merge"], "op": "OR"}]"#).unwrap();

    let output = postmerge(&[
        "--no-color",
        "batch",
        index.to_str().unwrap(),
        batch.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(!text.contains('\x1b'));
    assert_eq!(hit_names(&text), vec!["a.txt", "c.txt"]);
}
