#![no_main]

use libfuzzer_sys::fuzz_target;
use postmerge::merge::{EncodedCursor, PostingCursor};

fuzz_target!(|data: &[u8]| {
    // Corrupt bytes must end the cursor, never panic or go backwards
    let target = data.first().copied().unwrap_or(0) as u32 * 17;
    let mut cursor = EncodedCursor::new(data);
    let mut last = None;
    let mut steps = 0;
    while let Some(id) = cursor.current_id() {
        assert!(last.is_none_or(|prev| id > prev));
        last = Some(id);
        if steps == 3 {
            cursor.jump(target);
        } else {
            cursor.next();
        }
        steps += 1;
    }
    cursor.finish();
});
