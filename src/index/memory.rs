use crate::index::types::{DocId, PostingItem, TermId};
use crate::index::TermIndex;
use crate::merge::SliceCursor;
use crate::utils::term_frequencies;
use rustc_hash::FxHashMap;

/// In-memory term index.
///
/// Documents are numbered from 1 in insertion order, so every posting is
/// ascending by construction. Used to accumulate a corpus before it is
/// written to disk, and directly as a [`TermIndex`] in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    term_ids: FxHashMap<String, TermId>,
    /// term_id - 1 -> term text
    terms: Vec<String>,
    /// term_id - 1 -> posting
    postings: Vec<Vec<PostingItem>>,
    /// doc_id - 1 -> length in tokens
    doc_lens: Vec<u32>,
    /// doc_id - 1 -> display name (path for file corpora)
    doc_names: Vec<String>,
    total_doc_len: u64,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize and add a document
    pub fn add_document(&mut self, name: impl Into<String>, text: &str) -> DocId {
        let (counts, doc_len) = term_frequencies(text);
        self.add_document_terms(name, counts, doc_len)
    }

    /// Add a document from precomputed term counts
    pub fn add_document_terms<I>(&mut self, name: impl Into<String>, counts: I, doc_len: u32) -> DocId
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let doc_id = self.doc_lens.len() as DocId + 1;

        for (term, tf) in counts {
            if tf == 0 {
                continue;
            }
            let term_id = self.term_id_or_insert(term);
            self.postings[(term_id - 1) as usize].push(PostingItem::new(doc_id, tf));
        }

        self.doc_lens.push(doc_len);
        self.doc_names.push(name.into());
        self.total_doc_len += doc_len as u64;
        doc_id
    }

    fn term_id_or_insert(&mut self, term: String) -> TermId {
        if let Some(&id) = self.term_ids.get(&term) {
            return id;
        }
        let id = self.terms.len() as TermId + 1;
        self.terms.push(term.clone());
        self.postings.push(Vec::new());
        self.term_ids.insert(term, id);
        id
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn total_doc_len(&self) -> u64 {
        self.total_doc_len
    }

    pub fn doc_lens(&self) -> &[u32] {
        &self.doc_lens
    }

    pub fn doc_names(&self) -> &[String] {
        &self.doc_names
    }

    pub fn doc_name(&self, doc_id: DocId) -> Option<&str> {
        let idx = (doc_id as usize).checked_sub(1)?;
        self.doc_names.get(idx).map(String::as_str)
    }

    /// Posting for a term id
    pub fn posting_items(&self, term_id: TermId) -> Option<&[PostingItem]> {
        let idx = (term_id as usize).checked_sub(1)?;
        self.postings.get(idx).map(Vec::as_slice)
    }

    /// All terms with their postings, sorted by term text
    pub fn sorted_terms(&self) -> Vec<(&str, &[PostingItem])> {
        let mut entries: Vec<(&str, &[PostingItem])> = self
            .terms
            .iter()
            .zip(&self.postings)
            .map(|(term, posting)| (term.as_str(), posting.as_slice()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl TermIndex for MemoryIndex {
    type Cursor<'a> = SliceCursor<'a>;

    fn lookup(&self, term: &str) -> Option<TermId> {
        self.term_ids.get(term).copied()
    }

    fn posting(&self, term_id: TermId) -> Option<SliceCursor<'_>> {
        self.posting_items(term_id).map(SliceCursor::new)
    }

    fn doc_count(&self) -> u32 {
        self.doc_lens.len() as u32
    }

    fn doc_freq(&self, term_id: TermId) -> u32 {
        self.posting_items(term_id).map_or(0, |p| p.len() as u32)
    }

    fn doc_len(&self, doc_id: DocId) -> u32 {
        (doc_id as usize)
            .checked_sub(1)
            .and_then(|idx| self.doc_lens.get(idx))
            .copied()
            .unwrap_or(0)
    }

    fn avg_doc_len(&self) -> f32 {
        if self.doc_lens.is_empty() {
            0.0
        } else {
            (self.total_doc_len as f64 / self.doc_lens.len() as f64) as f32
        }
    }

    fn doc_name(&self, doc_id: DocId) -> Option<&str> {
        MemoryIndex::doc_name(self, doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::PostingCursor;

    fn sample() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_document("a.txt", "nick wilde nick");
        index.add_document("b.txt", "judy hopps");
        index.add_document("c.txt", "wilde judy");
        index
    }

    #[test]
    fn test_doc_ids_start_at_one() {
        let index = sample();
        assert_eq!(index.doc_count(), 3);
        assert_eq!(index.doc_name(1), Some("a.txt"));
        assert_eq!(index.doc_name(0), None);
        assert_eq!(index.doc_name(4), None);
    }

    #[test]
    fn test_lookup_and_stats() {
        let index = sample();
        let nick = index.lookup("nick").unwrap();
        let wilde = index.lookup("wilde").unwrap();
        assert!(index.lookup("fox").is_none());

        assert_eq!(index.doc_freq(nick), 1);
        assert_eq!(index.doc_freq(wilde), 2);
        assert_eq!(index.doc_len(1), 3);
        assert_eq!(index.doc_len(99), 0);
        assert!((index.avg_doc_len() - 7.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_posting_cursor_carries_tf() {
        let index = sample();
        let nick = index.lookup("nick").unwrap();
        let cursor = index.posting(nick).unwrap();
        assert_eq!(cursor.current(), Some(PostingItem::new(1, 2)));
        assert!(index.posting(0).is_none());
    }

    #[test]
    fn test_sorted_terms() {
        let index = sample();
        let terms: Vec<&str> = index.sorted_terms().into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["hopps", "judy", "nick", "wilde"]);
    }

    #[test]
    fn test_empty_index() {
        let index = MemoryIndex::new();
        assert_eq!(index.doc_count(), 0);
        assert_eq!(index.avg_doc_len(), 0.0);
    }
}
