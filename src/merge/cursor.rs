//! Posting cursors: forward-only views over one term's posting.
//!
//! The merge driver only talks to postings through [`PostingCursor`], so any
//! storage backend can take part in a merge by implementing it. Two backends
//! live here:
//!
//! - [`SliceCursor`] walks an in-memory slice of [`PostingItem`]s and uses a
//!   galloping search for `jump`.
//! - [`EncodedCursor`] walks a delta + varint encoded posting (as stored in
//!   `postings.bin`) and decodes lazily.
//!
//! An exhausted cursor reports `None`; there is no reserved "max" document id,
//! so no real id can ever be mistaken for the end of a posting.

use crate::index::types::{DocId, PostingItem};
use crate::utils::decode_posting_item;

/// Capability set every posting backend provides to the merge driver.
pub trait PostingCursor {
    /// Item at the current position, or `None` once exhausted
    fn current(&self) -> Option<PostingItem>;

    /// Document id at the current position, or `None` once exhausted
    #[inline]
    fn current_id(&self) -> Option<DocId> {
        self.current().map(|item| item.doc_id)
    }

    /// Advance to the following item. No-op when already exhausted.
    fn next(&mut self);

    /// Skip forward to the first item whose id is >= `target`.
    ///
    /// Never moves backward: when the cursor already sits at or past `target`
    /// it stays put and returns `true`. Returns `false` (leaving the cursor
    /// exhausted) when no such item exists.
    fn jump(&mut self, target: DocId) -> bool;

    /// Release the cursor. Afterwards it reports exhausted.
    fn finish(&mut self);
}

impl<C: PostingCursor + ?Sized> PostingCursor for Box<C> {
    #[inline]
    fn current(&self) -> Option<PostingItem> {
        (**self).current()
    }

    #[inline]
    fn current_id(&self) -> Option<DocId> {
        (**self).current_id()
    }

    #[inline]
    fn next(&mut self) {
        (**self).next()
    }

    #[inline]
    fn jump(&mut self, target: DocId) -> bool {
        (**self).jump(target)
    }

    #[inline]
    fn finish(&mut self) {
        (**self).finish()
    }
}

/// A posting that can hand out cursors positioned on its first item.
pub trait PostingList {
    type Cursor<'a>: PostingCursor
    where
        Self: 'a;

    /// Start a cursor at the first item (exhausted if the posting is empty)
    fn start(&self) -> Self::Cursor<'_>;
}

/// Cursor over an in-memory, ascending slice of posting items
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    items: &'a [PostingItem],
    pos: usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(items: &'a [PostingItem]) -> Self {
        Self { items, pos: 0 }
    }

    /// Number of items not yet passed, including the current one
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.pos)
    }
}

impl PostingCursor for SliceCursor<'_> {
    #[inline]
    fn current(&self) -> Option<PostingItem> {
        self.items.get(self.pos).copied()
    }

    #[inline]
    fn next(&mut self) {
        if self.pos < self.items.len() {
            self.pos += 1;
        }
    }

    fn jump(&mut self, target: DocId) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if current.doc_id >= target {
            return true;
        }

        // Gallop: double the step until we overshoot, then binary search the
        // last window. Keeps skips over long postings logarithmic.
        let len = self.items.len();
        let mut low = self.pos + 1;
        let mut step = 1;
        let mut high = low;
        while high < len && self.items[high].doc_id < target {
            low = high + 1;
            high = high + step;
            step *= 2;
        }
        let high = high.min(len);

        let offset = self.items[low.min(high)..high].partition_point(|item| item.doc_id < target);
        self.pos = low.min(high) + offset;
        self.pos < len
    }

    #[inline]
    fn finish(&mut self) {
        self.pos = self.items.len();
    }
}

impl PostingList for [PostingItem] {
    type Cursor<'a> = SliceCursor<'a>;

    fn start(&self) -> SliceCursor<'_> {
        SliceCursor::new(self)
    }
}

impl PostingList for Vec<PostingItem> {
    type Cursor<'a> = SliceCursor<'a>;

    fn start(&self) -> SliceCursor<'_> {
        SliceCursor::new(self)
    }
}

/// A delta + varint encoded posting borrowed from the index
#[derive(Debug, Clone, Copy)]
pub struct EncodedPosting<'a> {
    bytes: &'a [u8],
}

impl<'a> EncodedPosting<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn cursor(&self) -> EncodedCursor<'a> {
        EncodedCursor::new(self.bytes)
    }
}

impl<'a> PostingList for EncodedPosting<'a> {
    // The cursor borrows the encoded bytes, not the wrapper
    type Cursor<'b>
        = EncodedCursor<'a>
    where
        Self: 'b;

    fn start(&self) -> EncodedCursor<'a> {
        EncodedCursor::new(self.bytes)
    }
}

/// Cursor that decodes an encoded posting one item at a time
#[derive(Debug, Clone)]
pub struct EncodedCursor<'a> {
    bytes: &'a [u8],
    /// Offset of the next undecoded pair
    pos: usize,
    current: Option<PostingItem>,
}

impl<'a> EncodedCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut cursor = Self {
            bytes,
            pos: 0,
            current: None,
        };
        cursor.decode_from(0);
        cursor
    }

    fn decode_from(&mut self, prev: DocId) {
        self.current = match self.bytes.get(self.pos..) {
            Some(rest) if !rest.is_empty() => match decode_posting_item(rest, prev) {
                // A zero gap past the first item is corrupt; ids must strictly ascend
                Some((item, consumed)) if self.pos == 0 || item.doc_id > prev => {
                    self.pos += consumed;
                    Some(item)
                }
                _ => None,
            },
            _ => None,
        };
    }
}

impl PostingCursor for EncodedCursor<'_> {
    #[inline]
    fn current(&self) -> Option<PostingItem> {
        self.current
    }

    fn next(&mut self) {
        if let Some(item) = self.current {
            self.decode_from(item.doc_id);
        }
    }

    fn jump(&mut self, target: DocId) -> bool {
        // Gaps are relative, so the only way forward is to decode
        while let Some(item) = self.current {
            if item.doc_id >= target {
                return true;
            }
            self.decode_from(item.doc_id);
        }
        false
    }

    fn finish(&mut self) {
        self.pos = self.bytes.len();
        self.current = None;
    }
}
