pub mod build;
pub mod memory;
pub mod reader;
pub mod stats;
pub mod types;
pub mod writer;

pub use memory::MemoryIndex;
pub use reader::IndexReader;
pub use types::*;
pub use writer::IndexWriter;

use crate::merge::PostingCursor;

/// Read-only view of a term index, as consumed by the query executor.
///
/// A missing term is `None` from [`TermIndex::lookup`], not an error.
pub trait TermIndex {
    type Cursor<'a>: PostingCursor
    where
        Self: 'a;

    fn lookup(&self, term: &str) -> Option<TermId>;

    /// Cursor positioned at the start of the term's posting
    fn posting(&self, term_id: TermId) -> Option<Self::Cursor<'_>>;

    /// Number of documents in the corpus
    fn doc_count(&self) -> u32;

    /// Number of documents containing the term
    fn doc_freq(&self, term_id: TermId) -> u32;

    /// Length of a document in tokens (0 for unknown ids)
    fn doc_len(&self, doc_id: DocId) -> u32;

    fn avg_doc_len(&self) -> f32;

    /// Display name of a document, when the index stores one
    fn doc_name(&self, _doc_id: DocId) -> Option<&str> {
        None
    }
}
