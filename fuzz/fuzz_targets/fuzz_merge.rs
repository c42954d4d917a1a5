#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use postmerge::index::PostingItem;
use postmerge::merge::{merge_ids, MergeOp, SliceCursor};
use std::collections::BTreeSet;

#[derive(Debug, Arbitrary)]
struct Input {
    and: bool,
    postings: Vec<Vec<u32>>,
}

fuzz_target!(|input: Input| {
    if input.postings.is_empty() || input.postings.len() > 16 {
        return;
    }

    // Sorted, duplicate-free postings; u32::MAX included to probe the top of the range
    let sets: Vec<BTreeSet<u32>> = input
        .postings
        .iter()
        .map(|ids| ids.iter().copied().collect())
        .collect();
    let postings: Vec<Vec<PostingItem>> = sets
        .iter()
        .map(|set| set.iter().map(|&id| PostingItem::new(id, 1)).collect())
        .collect();

    let op = if input.and { MergeOp::And } else { MergeOp::Or };
    let ids = merge_ids(op, postings.iter().map(|p| SliceCursor::new(p)))
        .expect("valid merge configuration");

    let expected: BTreeSet<u32> = if input.and {
        sets.iter()
            .skip(1)
            .fold(sets[0].clone(), |acc, s| acc.intersection(s).copied().collect())
    } else {
        sets.iter().flatten().copied().collect()
    };

    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ids, expected.into_iter().collect::<Vec<_>>());
});
