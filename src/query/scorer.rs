//! BM25 relevance scoring
//!
//! Pure functions over corpus and document statistics, plus a per-query
//! [`Bm25Scorer`] that holds the values which do not change from one
//! document to the next (idf per term, average document length, `k1 / avgdl`).

use crate::merge::MergeMatch;
use serde::{Deserialize, Serialize};

/// BM25 k1 parameter - controls term frequency saturation
pub const BM25_DEFAULT_K1: f32 = 1.2;

/// BM25 b parameter - controls length normalization
/// 0 = no length normalization, 1 = full normalization
pub const BM25_DEFAULT_B: f32 = 0.75;

/// Tunable BM25 constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: BM25_DEFAULT_K1,
            b: BM25_DEFAULT_B,
        }
    }
}

/// Inverse document frequency: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
/// Non-negative whenever `df <= N`.
#[inline]
pub fn idf(df: f32, doc_count: f32) -> f32 {
    ((doc_count - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 contribution of one term to one document
#[inline]
pub fn term_score(idf: f32, tf: f32, doc_len: f32, avg_doc_len: f32, k1: f32, b: f32) -> f32 {
    let length_norm = 1.0 - b + b * (doc_len / avg_doc_len);
    idf * tf * (k1 + 1.0) / (tf + k1 * length_norm)
}

/// Per-query scoring state.
///
/// Terms are pushed in the same order their postings are added to the merge
/// session, so posting index `i` in a [`MergeMatch`] maps to idf `i`.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    params: Bm25Params,
    idf: Vec<f32>,
    avg_doc_len: f32,
    /// `k1 / avg_doc_len`, folded once per query
    k1_over_avg: f32,
}

impl Bm25Scorer {
    pub fn new(params: Bm25Params, avg_doc_len: f32) -> Self {
        // empty corpora report 0; keep the length ratio finite
        let avg_doc_len = if avg_doc_len > 0.0 { avg_doc_len } else { 1.0 };
        Self {
            params,
            idf: Vec::new(),
            avg_doc_len,
            k1_over_avg: params.k1 / avg_doc_len,
        }
    }

    /// Register the next active term; returns its posting index
    pub fn push_term(&mut self, doc_freq: u32, doc_count: u32) -> usize {
        self.idf.push(idf(doc_freq as f32, doc_count as f32));
        self.idf.len() - 1
    }

    pub fn term_count(&self) -> usize {
        self.idf.len()
    }

    pub fn idf(&self, term: usize) -> Option<f32> {
        self.idf.get(term).copied()
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    /// Score of term `term` occurring `tf` times in a document of `doc_len`
    #[inline]
    pub fn term_score(&self, term: usize, tf: u32, doc_len: u32) -> f32 {
        let Some(idf) = self.idf(term) else {
            return 0.0;
        };
        let Bm25Params { k1, b } = self.params;
        let tf = tf as f32;
        // k1 * (1 - b + b * dl / avgdl) == k1 * (1 - b) + b * dl * (k1 / avgdl)
        let denom = tf + k1 * (1.0 - b) + b * doc_len as f32 * self.k1_over_avg;
        idf * tf * (k1 + 1.0) / denom
    }

    /// Sum the contribution of every posting positioned on the match
    pub fn score_match(&self, m: &MergeMatch<'_>, doc_len: u32) -> f32 {
        m.matching()
            .map(|(term, item)| self.term_score(term, item.tf, doc_len))
            .sum()
    }
}
