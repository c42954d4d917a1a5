pub mod cursor;
pub mod driver;
pub mod error;

pub use cursor::{EncodedCursor, EncodedPosting, PostingCursor, PostingList, SliceCursor};
pub use driver::{
    merge_ids, MergeMatch, MergeOp, MergeOutcome, MergeSession, MergeStats,
    DEFAULT_MAX_MERGE_POSTINGS,
};
pub use error::MergeError;
