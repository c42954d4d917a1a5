/// Configuration errors reported by a merge session before any match is
/// emitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("posting merge operation undefined")]
    UndefinedOperator,

    #[error("no postings to merge")]
    NoPostings,

    #[error("too many postings to merge (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("too many query terms: {count} (max {max})")]
    TooManyTerms { count: usize, max: usize },

    #[error("unknown merge operator: {0:?}")]
    UnknownOperator(String),
}
