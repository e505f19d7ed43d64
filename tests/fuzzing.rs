//! Proptest suite for the liquidation queue and the numeric substrate.
//!
//! ## Running
//! - Quick: `cargo test --features fuzz`
//! - Deep: `PROPTEST_CASES=2000 cargo test --features fuzz`
//!
//! The deterministic suite in `avl_tests.rs` covers the same laws with
//! seeded generators; this suite searches a wider input space and shrinks
//! counterexamples.

#![cfg(feature = "fuzz")]

use std::collections::BTreeMap;

use num_traits::Signed;
use proptest::prelude::*;
use warren::avl::{add, assert_invariants, assert_no_dangling, del, split, to_list, Item, Node};
use warren::ratio::ratio;
use warren::{Arena, FixedPoint, Handle, Tez};

type Queue = Arena<Node<u32>>;

fn build(items: &[(i64, u8)]) -> (Queue, Option<Handle>) {
    let mut arena = Arena::new();
    let mut root = None;
    for &(id, c) in items {
        root = Some(add(
            &mut arena,
            root,
            Item { id, payload: id as u32, collateral: Tez::of_tez(c as u64) },
        ));
    }
    (arena, root)
}

fn whole_tez(t: Tez) -> u64 {
    (t.raw() >> 64) as u64
}

proptest! {
    #[test]
    fn listing_is_sorted_and_deduped(items in prop::collection::vec((0i64..40, 1u8..20), 0..50)) {
        let (arena, root) = build(&items);
        assert_invariants(&arena, root);
        assert_no_dangling(&arena, &[root]);

        let mut expected: BTreeMap<i64, u8> = BTreeMap::new();
        for &(id, c) in &items {
            expected.insert(id, c);
        }
        let got: Vec<(i64, u64)> = to_list(&arena, root)
            .iter()
            .map(|i| (i.id, whole_tez(i.collateral)))
            .collect();
        let want: Vec<(i64, u64)> = expected.into_iter().map(|(k, v)| (k, v as u64)).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn deletion_removes_one_id(
        items in prop::collection::vec((0i64..30, 1u8..10), 1..40),
        victim in 0i64..30,
    ) {
        let (mut arena, root) = build(&items);
        let before: Vec<i64> = to_list(&arena, root).iter().map(|i| i.id).collect();
        let after_root = del(&mut arena, root, victim);
        assert_invariants(&arena, after_root);
        assert_no_dangling(&arena, &[after_root]);
        let after: Vec<i64> = to_list(&arena, after_root).iter().map(|i| i.id).collect();
        let want: Vec<i64> = before.into_iter().filter(|&id| id != victim).collect();
        prop_assert_eq!(after, want);
    }

    #[test]
    fn split_prefix_is_affordable_and_maximal(
        items in prop::collection::vec((0i64..60, 1u8..15), 0..50),
        limit in 0u64..300,
    ) {
        let (mut arena, root) = build(&items);
        let before = to_list(&arena, root);

        let (prefix, rest) = split(&mut arena, root, Tez::of_tez(limit));
        assert_invariants(&arena, prefix);
        assert_invariants(&arena, rest);
        assert_no_dangling(&arena, &[prefix, rest]);

        let a = to_list(&arena, prefix);
        let b = to_list(&arena, rest);
        let mut joined = a.clone();
        joined.extend(b.iter().cloned());
        prop_assert_eq!(joined, before);

        let prefix_sum: u64 = a.iter().map(|i| whole_tez(i.collateral)).sum();
        prop_assert!(prefix_sum <= limit);
        if let Some(first) = b.first() {
            prop_assert!(prefix_sum + whole_tez(first.collateral) > limit);
        }
    }

    #[test]
    fn ratio_floor_ceil_bracket_the_value(n in -1_000_000i128..1_000_000, d in 1i128..10_000) {
        let r = ratio(n, d);
        let fl = FixedPoint::of_ratio_floor(&r);
        let ce = FixedPoint::of_ratio_ceil(&r);
        prop_assert!(fl.to_ratio() <= r && r <= ce.to_ratio());
        prop_assert!(ce.raw() - fl.raw() <= 1);
    }

    #[test]
    fn fixedpoint_mul_truncates_toward_zero(a in -1_000_000i128..1_000_000, b in -1_000_000i128..1_000_000) {
        let x = FixedPoint::of_int(a as i64);
        let y = FixedPoint::from_raw(b);
        let exact = x.to_ratio() * y.to_ratio();
        let got = x.mul(y).to_ratio();
        // |got| <= |exact| and they differ by less than one raw unit.
        prop_assert!((exact.clone() - &got).abs() < ratio(1, 1 << 62) * ratio(1, 4));
        if exact >= ratio(0, 1) {
            prop_assert!(got <= exact);
        } else {
            prop_assert!(got >= exact);
        }
    }
}
