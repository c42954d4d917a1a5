//! # postmerge - posting merge and BM25 scoring
//!
//! postmerge evaluates flat boolean queries (all terms AND, or all terms OR)
//! over an inverted index. Each query term contributes one posting, an
//! ascending list of `(doc id, term frequency)` pairs; the merge driver walks
//! the postings together and hands every qualifying document to a callback,
//! which the query layer uses to accumulate BM25 scores.
//!
//! ## Architecture
//!
//! - [`merge`] - posting cursors and the multi-cursor merge driver
//! - [`query`] - term resolution, BM25 scoring and query execution
//! - [`index`] - in-memory and memory-mapped on-disk term indexes
//! - [`output`] - result formatting (colored text or JSON)
//! - [`utils`] - tokenizer, varint codecs, settings, progress bars
//!
//! ## Quick Start
//!
//! ```ignore
//! use postmerge::index::IndexReader;
//! use postmerge::merge::MergeOp;
//! use postmerge::query::QueryExecutor;
//! use std::path::Path;
//!
//! let reader = IndexReader::open(Path::new("/path/to/index")).unwrap();
//! let executor = QueryExecutor::new(&reader);
//! let terms = vec!["posting".to_string(), "merge".to_string()];
//! let result = executor.execute(&terms, MergeOp::And).unwrap();
//!
//! for hit in result.hits {
//!     println!("{} {:.4}", hit.doc_id, hit.score);
//! }
//! ```

pub mod index;
pub mod merge;
pub mod output;
pub mod query;
pub mod utils;
