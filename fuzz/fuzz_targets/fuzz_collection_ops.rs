#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nbstate_core::collections::{arr_delete, arr_insert, arr_replace, diff_array, partition};

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { idx: i16, item: u8 },
    Replace { idx: i16, item: u8 },
    Delete { idx: i16 },
}

fuzz_target!(|input: (Vec<u8>, Vec<Op>)| {
    let (mut arr, ops) = input;
    arr.truncate(256);
    for op in ops.into_iter().take(256) {
        let len = arr.len();
        arr = match op {
            Op::Insert { idx, item } => {
                let out = arr_insert(&arr, isize::from(idx), item);
                assert_eq!(out.len(), len + 1);
                out
            }
            Op::Replace { idx, item } => {
                let out = arr_replace(&arr, isize::from(idx), item);
                assert!(out.len() == len || out.len() == len + 1);
                out
            }
            Op::Delete { idx } => {
                let out = arr_delete(&arr, isize::from(idx));
                assert!(out.len() == len || out.len() + 1 == len);
                out
            }
        };
    }

    let (evens, odds) = partition(&arr, |b| b % 2 == 0);
    assert_eq!(evens.len() + odds.len(), arr.len());
    let (only_a, only_b) = diff_array(&evens, &odds);
    assert!(only_a.iter().all(|b| !odds.contains(b)));
    assert!(only_b.iter().all(|b| !evens.contains(b)));
});
