#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use radar_store::{Error, Store};
use tempfile::tempdir;

#[derive(Arbitrary, Debug)]
enum Op {
    Next(String),
    Batch(String, u8),
}

fuzz_target!(|ops: Vec<Op>| {
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path()).unwrap();
    let allocator = store.allocator();
    let mut last: HashMap<String, u64> = HashMap::new();

    for op in ops.into_iter().take(64) {
        let (kind, count) = match op {
            Op::Next(kind) => (kind, 1),
            Op::Batch(kind, n) => (kind, u64::from(n)),
        };

        let result = if count == 1 {
            allocator.next(&kind).map(|seq| seq..=seq)
        } else {
            allocator.next_batch(&kind, count)
        };

        match result {
            Ok(range) => {
                let prev = last.get(&kind).copied().unwrap_or(0);
                assert_eq!(*range.start(), prev + 1);
                assert_eq!(*range.end(), prev + count);
                last.insert(kind, *range.end());
            }
            Err(Error::InvalidKind { .. }) => assert!(kind.is_empty() || kind.len() > 511),
            Err(Error::InvalidBatch { .. }) => assert_eq!(count, 0),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
});
