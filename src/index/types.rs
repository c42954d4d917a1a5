use serde::{Deserialize, Serialize};

/// Unique identifier for a document in the index
pub type DocId = u32;

/// Identifier for a term within one index (assigned from 1)
pub type TermId = u32;

/// One entry of a posting: a document containing the term and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostingItem {
    pub doc_id: DocId,
    pub tf: u32,
}

impl PostingItem {
    #[inline]
    pub fn new(doc_id: DocId, tf: u32) -> Self {
        Self { doc_id, tf }
    }
}

/// Dictionary entry mapping a term to its encoded posting
#[derive(Debug, Clone, Copy)]
pub struct DictEntry {
    pub offset: u64,
    pub length: u32,
    pub doc_freq: u32,
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub doc_count: u32,
    pub term_count: u32,
    /// Sum of all document lengths, in tokens
    pub total_doc_len: u64,
    pub created_at: u64,
}

impl IndexMeta {
    pub const VERSION: u32 = 1;

    /// Average document length across the corpus
    pub fn avg_doc_len(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            (self.total_doc_len as f64 / self.doc_count as f64) as f32
        }
    }
}

impl Default for IndexMeta {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            doc_count: 0,
            term_count: 0,
            total_doc_len: 0,
            created_at: 0,
        }
    }
}

/// A scored search result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_doc_len() {
        let meta = IndexMeta {
            doc_count: 4,
            total_doc_len: 10,
            ..Default::default()
        };
        assert!((meta.avg_doc_len() - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_avg_doc_len_empty_corpus() {
        let meta = IndexMeta::default();
        assert_eq!(meta.avg_doc_len(), 0.0);
    }
}
