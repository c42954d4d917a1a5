use crate::index::reader::IndexReader;
use crate::index::types::ScoredDoc;
use crate::index::TermIndex;
use crate::merge::{MergeError, MergeOp, MergeSession, MergeStats};
use crate::query::scorer::Bm25Scorer;
use crate::utils::{normalize_term, Settings};
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::path::PathBuf;
use tracing::debug;

/// Outcome of one query
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// Matching documents with their BM25 score, ascending by doc id
    pub hits: Vec<ScoredDoc>,
    /// Query terms absent from the index (excluded from the merge)
    pub unresolved: Vec<String>,
    pub stats: MergeStats,
    /// True when the merge stopped at `max_hits`
    pub truncated: bool,
}

/// A query as submitted in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub terms: Vec<String>,
    #[serde(default)]
    pub op: MergeOp,
}

/// Resolves terms against an index, merges their postings and scores hits
pub struct QueryExecutor<'a, I: TermIndex> {
    index: &'a I,
    settings: Settings,
}

impl<'a, I: TermIndex> QueryExecutor<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self::with_settings(index, Settings::default())
    }

    pub fn with_settings(index: &'a I, settings: Settings) -> Self {
        Self { index, settings }
    }

    /// Execute one query.
    ///
    /// Terms missing from the index are skipped and listed in
    /// `unresolved`. Fails when the operator is undefined, no term resolves,
    /// or the query exceeds the configured term/posting limits.
    pub fn execute(&self, terms: &[String], op: MergeOp) -> Result<QueryResult, MergeError> {
        if terms.len() > self.settings.max_query_terms {
            return Err(MergeError::TooManyTerms {
                count: terms.len(),
                max: self.settings.max_query_terms,
            });
        }

        let index = self.index;
        let doc_count = index.doc_count();
        let mut session = MergeSession::with_capacity(op, self.settings.max_merge_postings);
        let mut scorer = Bm25Scorer::new(self.settings.bm25, index.avg_doc_len());
        let mut unresolved = Vec::new();

        for term in terms {
            let resolved = normalize_term(term)
                .and_then(|normalized| index.lookup(&normalized))
                .and_then(|term_id| index.posting(term_id).map(|cursor| (term_id, cursor)));

            match resolved {
                Some((term_id, cursor)) => {
                    let doc_freq = index.doc_freq(term_id);
                    debug!(term = %term, term_id, doc_freq, "term resolved");
                    session.add_posting(cursor)?;
                    scorer.push_term(doc_freq, doc_count);
                }
                None => {
                    debug!(term = %term, "term not found");
                    unresolved.push(term.clone());
                }
            }
        }

        debug!(
            resolved = scorer.term_count(),
            unresolved = unresolved.len(),
            "query terms resolved"
        );

        let max_hits = self.settings.max_hits;
        let outcome = session.run(Vec::new(), |mut hits: Vec<ScoredDoc>, m| {
            let doc_len = index.doc_len(m.doc_id());
            hits.push(ScoredDoc {
                doc_id: m.doc_id(),
                score: scorer.score_match(m, doc_len),
            });
            if max_hits.is_some_and(|max| hits.len() >= max) {
                ControlFlow::Break(hits)
            } else {
                ControlFlow::Continue(hits)
            }
        })?;

        Ok(QueryResult {
            hits: outcome.acc,
            unresolved,
            stats: outcome.stats,
            truncated: outcome.stopped,
        })
    }

    /// Execute independent queries in parallel, one merge session each
    pub fn execute_batch(&self, requests: &[QueryRequest]) -> Vec<Result<QueryResult, MergeError>>
    where
        I: Sync,
    {
        requests
            .par_iter()
            .map(|request| self.execute(&request.terms, request.op))
            .collect()
    }
}

/// A self-contained query against an on-disk index
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub index_path: PathBuf,
    pub terms: Vec<String>,
    pub op: MergeOp,
}

impl QueryConfig {
    pub fn open(&self) -> Result<IndexReader> {
        IndexReader::open(&self.index_path)
    }

    /// Run the query against an already opened index
    pub fn execute(&self, reader: &IndexReader, settings: &Settings) -> Result<QueryResult> {
        let executor = QueryExecutor::with_settings(reader, settings.clone());
        Ok(executor.execute(&self.terms, self.op)?)
    }

    /// Open the index and run the query. A missing index is fatal.
    pub fn run(&self, settings: &Settings) -> Result<QueryResult> {
        let reader = self.open()?;
        self.execute(&reader, settings)
    }
}
