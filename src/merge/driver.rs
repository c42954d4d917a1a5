//! Multi-cursor merge driver.
//!
//! A [`MergeSession`] owns a set of posting cursors and walks them under one
//! boolean operator, emitting every qualifying document id exactly once and
//! in ascending order:
//!
//! - **OR** repeatedly takes the smallest current id across all cursors,
//!   reports it, then advances every cursor sitting on it.
//! - **AND** is a zig-zag join: the largest current id becomes the target,
//!   every lagging cursor `jump`s to it, and a match is reported only when
//!   all cursors land on the same id. Any exhausted cursor ends the merge.
//!
//! The per-match callback receives an accumulator and returns it wrapped in
//! [`ControlFlow`]; `Break` stops the merge early. It also sees the current
//! item of every cursor through [`MergeMatch`], so a scorer can sum the
//! contribution of each term matching at that document.

use crate::index::types::{DocId, PostingItem};
use crate::merge::cursor::PostingCursor;
use crate::merge::error::MergeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;
use tracing::debug;

/// Default upper bound on the number of postings in one session
pub const DEFAULT_MAX_MERGE_POSTINGS: usize = 64;

/// Boolean operator applied across all postings of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeOp {
    And,
    Or,
    #[default]
    Undefined,
}

impl MergeOp {
    /// Map an operator string from the command line: exactly `AND` or
    /// `OR`, anything else becomes `Undefined` and fails at merge time.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "AND" => MergeOp::And,
            "OR" => MergeOp::Or,
            _ => MergeOp::Undefined,
        }
    }
}

impl FromStr for MergeOp {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("and") {
            Ok(MergeOp::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(MergeOp::Or)
        } else {
            Err(MergeError::UnknownOperator(s.to_string()))
        }
    }
}

impl fmt::Display for MergeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOp::And => write!(f, "AND"),
            MergeOp::Or => write!(f, "OR"),
            MergeOp::Undefined => write!(f, "UNDEFINED"),
        }
    }
}

/// View of all cursors at the moment a document qualifies
#[derive(Debug, Clone, Copy)]
pub struct MergeMatch<'s> {
    doc_id: DocId,
    items: &'s [Option<PostingItem>],
}

impl<'s> MergeMatch<'s> {
    /// The qualifying document id
    #[inline]
    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    /// Current item of every cursor, in the order postings were added.
    /// Cursors ahead of this id (OR only) or exhausted show up too.
    #[inline]
    pub fn items(&self) -> &'s [Option<PostingItem>] {
        self.items
    }

    /// Cursors positioned on this document, as `(posting index, item)`
    pub fn matching(&self) -> impl Iterator<Item = (usize, PostingItem)> + 's {
        let doc_id = self.doc_id;
        self.items
            .iter()
            .enumerate()
            .filter_map(move |(i, item)| match item {
                Some(item) if item.doc_id == doc_id => Some((i, *item)),
                _ => None,
            })
    }
}

/// Counters collected while merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Callback invocations
    pub matches: u64,
    /// Driver loop iterations
    pub iterations: u64,
    /// `jump` calls issued (AND only)
    pub jumps: u64,
}

/// Result of a completed (or stopped) merge
#[derive(Debug, Clone)]
pub struct MergeOutcome<A> {
    pub acc: A,
    pub stats: MergeStats,
    /// True when the callback asked to stop early
    pub stopped: bool,
}

/// One merge invocation over an owned set of cursors
pub struct MergeSession<C: PostingCursor> {
    op: MergeOp,
    cursors: Vec<C>,
    /// Cached `current()` of each cursor, refreshed after every move
    items: Vec<Option<PostingItem>>,
    capacity: usize,
}

impl<C: PostingCursor> MergeSession<C> {
    pub fn new(op: MergeOp) -> Self {
        Self::with_capacity(op, DEFAULT_MAX_MERGE_POSTINGS)
    }

    pub fn with_capacity(op: MergeOp, capacity: usize) -> Self {
        Self {
            op,
            cursors: Vec::new(),
            items: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Add a cursor to the session.
    ///
    /// Fails when the session is at capacity; the rejected cursor is finished.
    pub fn add_posting(&mut self, mut cursor: C) -> Result<(), MergeError> {
        if self.cursors.len() >= self.capacity {
            cursor.finish();
            return Err(MergeError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.items.push(cursor.current());
        self.cursors.push(cursor);
        Ok(())
    }

    /// Run the merge to completion, threading `acc` through `on_match`.
    ///
    /// Fails without invoking the callback when the operator is undefined or
    /// no postings were added. Every cursor is finished before returning.
    pub fn run<A, F>(mut self, acc: A, mut on_match: F) -> Result<MergeOutcome<A>, MergeError>
    where
        F: FnMut(A, &MergeMatch<'_>) -> ControlFlow<A, A>,
    {
        let result = match self.op {
            MergeOp::Undefined => Err(MergeError::UndefinedOperator),
            _ if self.cursors.is_empty() => Err(MergeError::NoPostings),
            MergeOp::Or => Ok(self.merge_or(acc, &mut on_match)),
            MergeOp::And => Ok(self.merge_and(acc, &mut on_match)),
        };

        if let Ok(outcome) = &result {
            debug!(
                op = %self.op,
                postings = self.cursors.len(),
                matches = outcome.stats.matches,
                iterations = outcome.stats.iterations,
                jumps = outcome.stats.jumps,
                stopped = outcome.stopped,
                "posting merge finished"
            );
        }

        self.finish_all();
        result
    }

    fn merge_or<A, F>(&mut self, mut acc: A, on_match: &mut F) -> MergeOutcome<A>
    where
        F: FnMut(A, &MergeMatch<'_>) -> ControlFlow<A, A>,
    {
        let mut stats = MergeStats::default();

        loop {
            stats.iterations += 1;

            let Some(cur_min) = self.items.iter().flatten().map(|item| item.doc_id).min() else {
                break;
            };

            stats.matches += 1;
            let view = MergeMatch {
                doc_id: cur_min,
                items: &self.items,
            };
            match on_match(acc, &view) {
                ControlFlow::Continue(next) => acc = next,
                ControlFlow::Break(last) => {
                    return MergeOutcome {
                        acc: last,
                        stats,
                        stopped: true,
                    };
                }
            }

            for i in 0..self.cursors.len() {
                if self.items[i].map(|item| item.doc_id) == Some(cur_min) {
                    self.advance(i);
                }
            }
        }

        MergeOutcome {
            acc,
            stats,
            stopped: false,
        }
    }

    fn merge_and<A, F>(&mut self, mut acc: A, on_match: &mut F) -> MergeOutcome<A>
    where
        F: FnMut(A, &MergeMatch<'_>) -> ControlFlow<A, A>,
    {
        let mut stats = MergeStats::default();

        'merge: loop {
            stats.iterations += 1;

            let mut target: DocId = 0;
            for item in &self.items {
                match item {
                    Some(item) => target = target.max(item.doc_id),
                    None => break 'merge,
                }
            }

            let mut aligned = true;
            for i in 0..self.cursors.len() {
                let Some(item) = self.items[i] else {
                    break 'merge;
                };
                if item.doc_id < target {
                    stats.jumps += 1;
                    self.cursors[i].jump(target);
                    self.items[i] = self.cursors[i].current();
                    match self.items[i] {
                        None => break 'merge,
                        Some(landed) if landed.doc_id != target => aligned = false,
                        Some(_) => {}
                    }
                }
            }

            if !aligned {
                continue;
            }

            stats.matches += 1;
            let view = MergeMatch {
                doc_id: target,
                items: &self.items,
            };
            match on_match(acc, &view) {
                ControlFlow::Continue(next) => acc = next,
                ControlFlow::Break(last) => {
                    return MergeOutcome {
                        acc: last,
                        stats,
                        stopped: true,
                    };
                }
            }

            for i in 0..self.cursors.len() {
                self.advance(i);
            }
        }

        MergeOutcome {
            acc,
            stats,
            stopped: false,
        }
    }

    #[inline]
    fn advance(&mut self, i: usize) {
        self.cursors[i].next();
        self.items[i] = self.cursors[i].current();
    }

    fn finish_all(&mut self) {
        for cursor in &mut self.cursors {
            cursor.finish();
        }
        self.cursors.clear();
        self.items.clear();
    }
}

impl<C: PostingCursor> Drop for MergeSession<C> {
    fn drop(&mut self) {
        self.finish_all();
    }
}

/// Merge the given cursors and collect the qualifying ids
pub fn merge_ids<C, I>(op: MergeOp, cursors: I) -> Result<Vec<DocId>, MergeError>
where
    C: PostingCursor,
    I: IntoIterator<Item = C>,
{
    let mut session = MergeSession::new(op);
    for cursor in cursors {
        session.add_posting(cursor)?;
    }
    let outcome = session.run(Vec::new(), |mut ids, m| {
        ids.push(m.doc_id());
        ControlFlow::Continue(ids)
    })?;
    Ok(outcome.acc)
}
