use crate::index::memory::MemoryIndex;
use crate::index::types::IndexMeta;
use crate::index::writer::IndexWriter;
use crate::utils::progress::{ProgressBar, ProgressStyle};
use crate::utils::term_frequencies;
use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Files larger than this are skipped
const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// A tokenized corpus file (computed in parallel)
struct ProcessedDoc {
    rel_path: PathBuf,
    counts: FxHashMap<String, u32>,
    doc_len: u32,
}

/// Build an index over every text file under `corpus`, writing it to
/// `index_path`. Documents are numbered in path order, so rebuilding an
/// unchanged corpus yields identical ids.
pub fn build_index(corpus: &Path, index_path: &Path, silent: bool) -> Result<IndexMeta> {
    let root = corpus
        .canonicalize()
        .with_context(|| format!("Invalid corpus path {}", corpus.display()))?;
    if !root.is_dir() {
        bail!("Corpus path is not a directory: {}", root.display());
    }

    info!(corpus = %root.display(), index = %index_path.display(), "building index");

    let spinner = (!silent).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message("Discovering files...");
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner
    });

    let index_dir = index_path.canonicalize().ok();
    let mut files: Vec<(PathBuf, PathBuf)> = WalkBuilder::new(&root)
        .hidden(true)
        .git_ignore(true)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        // don't index our own output when it lives inside the corpus
        .filter(|entry| {
            index_dir
                .as_ref()
                .is_none_or(|dir| !entry.path().starts_with(dir))
        })
        .filter_map(|entry| {
            let path = entry.path().to_path_buf();
            let rel_path = path.strip_prefix(&root).ok()?.to_path_buf();
            Some((path, rel_path))
        })
        .collect();
    files.sort_by(|a, b| a.1.cmp(&b.1));

    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!("Found {} files", files.len()));
    }

    let progress = (!silent).then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("█▓▒░  "),
        );
        pb.set_message("Tokenizing...");
        pb
    });

    let skipped = AtomicUsize::new(0);

    // par_iter keeps input order, so doc ids follow path order
    let docs: Vec<ProcessedDoc> = files
        .par_iter()
        .filter_map(|(full_path, rel_path)| {
            let doc = read_document(full_path, rel_path);
            if doc.is_none() {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
            doc
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Tokenized {} documents", docs.len()));
    }

    let mut index = MemoryIndex::new();
    for doc in docs {
        index.add_document_terms(
            doc.rel_path.to_string_lossy().into_owned(),
            doc.counts,
            doc.doc_len,
        );
    }

    let meta = IndexWriter::new(index_path).write(&index)?;

    let skipped = skipped.load(Ordering::Relaxed);
    if skipped > 0 {
        warn!(skipped, "files skipped (unreadable, binary or too large)");
    }
    info!(
        docs = meta.doc_count,
        terms = meta.term_count,
        avg_doc_len = meta.avg_doc_len(),
        "index complete"
    );

    Ok(meta)
}

/// Read and tokenize one file; `None` for unreadable, oversized or binary files
fn read_document(full_path: &Path, rel_path: &Path) -> Option<ProcessedDoc> {
    let size = full_path.metadata().ok()?.len();
    if size > MAX_FILE_SIZE {
        return None;
    }

    let content = fs::read(full_path).ok()?;
    // NUL bytes in the first block mark a binary file
    if content.iter().take(8192).any(|&b| b == 0) {
        return None;
    }

    let text = String::from_utf8_lossy(&content);
    let (counts, doc_len) = term_frequencies(&text);

    Some(ProcessedDoc {
        rel_path: rel_path.to_path_buf(),
        counts,
        doc_len,
    })
}
