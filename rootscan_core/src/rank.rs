//! Report ordering.
//!
//! Known-typed objects come before `unknown` ones. Within each group pinned
//! objects come first, then larger objects before smaller ones. Objects that
//! tie keep their incoming order.

use crate::classify::ObjectInfo;
use std::cmp::Ordering;

/// Order two report rows. `Less` means `a` is listed before `b`.
pub fn compare(a: &ObjectInfo, b: &ObjectInfo) -> Ordering {
    match (a.type_tag.is_unknown(), b.type_tag.is_unknown()) {
        // Unknown sinks below known
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        // Both unknown or both known: same rule within the group
        _ => {}
    }

    match (a.pinned, b.pinned) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.total_size.cmp(&a.total_size),
    }
}

/// Whether `a` is listed strictly before `b`.
pub fn less(a: &ObjectInfo, b: &ObjectInfo) -> bool {
    compare(a, b) == Ordering::Less
}

/// Sort report rows in place (stable).
pub fn rank(objects: &mut [ObjectInfo]) {
    objects.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::Cid;
    use crate::classify::TypeTag;
    use crate::node::FsKind;

    fn info(name: &str, known: bool, pinned: bool, total_size: u64) -> ObjectInfo {
        ObjectInfo {
            cid: Cid::hash_bytes(name.as_bytes()),
            type_tag: if known {
                TypeTag::Fs(FsKind::File)
            } else {
                TypeTag::Unknown
            },
            total_size,
            pinned,
        }
    }

    #[test]
    fn test_known_before_larger_unknown() {
        let unknown = info("u", false, false, 10);
        let known = info("k", true, false, 1);
        assert!(less(&known, &unknown));
        assert!(!less(&unknown, &known));
    }

    #[test]
    fn test_pinned_before_larger_unpinned() {
        let pinned = info("p", true, true, 5);
        let unpinned = info("u", true, false, 1000);
        assert!(less(&pinned, &unpinned));
        assert!(!less(&unpinned, &pinned));
    }

    #[test]
    fn test_pinned_unknown_before_larger_unpinned_unknown() {
        let pinned = info("p", false, true, 5);
        let unpinned = info("u", false, false, 1000);
        assert!(less(&pinned, &unpinned));
        assert!(!less(&unpinned, &pinned));
    }

    #[test]
    fn test_pinned_unknown_still_after_unpinned_known() {
        let unknown = info("u", false, true, 1_000_000);
        let known = info("k", true, false, 1);
        assert!(less(&known, &unknown));
    }

    #[test]
    fn test_larger_first_within_pin_class() {
        let big = info("big", true, false, 300);
        let small = info("small", true, false, 3);
        assert!(less(&big, &small));
        assert!(!less(&small, &big));

        let twin = info("twin", true, false, 300);
        assert!(!less(&big, &twin));
        assert!(!less(&twin, &big));
    }

    #[test]
    fn test_rank_full_order() {
        let mut rows = vec![
            info("unknown-small", false, false, 1),
            info("known-unpinned-big", true, false, 900),
            info("unknown-pinned", false, true, 2),
            info("known-pinned-small", true, true, 10),
            info("unknown-big", false, false, 500),
            info("known-unpinned-small", true, false, 20),
            info("known-pinned-big", true, true, 50),
        ];
        rank(&mut rows);

        let expected = [
            "known-pinned-big",
            "known-pinned-small",
            "known-unpinned-big",
            "known-unpinned-small",
            "unknown-pinned",
            "unknown-big",
            "unknown-small",
        ]
        .map(|name| Cid::hash_bytes(name.as_bytes()));
        let got: Vec<Cid> = rows.iter().map(|r| r.cid).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let mut rows = vec![info("first", true, false, 7), info("second", true, false, 7)];
        rank(&mut rows);
        assert_eq!(rows[0].cid, Cid::hash_bytes(b"first"));
    }

    use proptest::prelude::*;

    fn arb_info() -> impl Strategy<Value = ObjectInfo> {
        (any::<bool>(), any::<bool>(), 0u64..64, any::<u8>()).prop_map(
            |(known, pinned, size, tag)| info(&format!("obj-{}", tag), known, pinned, size),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// `less(a, b)` and `less(b, a)` are never both true
        #[test]
        fn prop_less_is_asymmetric(a in arb_info(), b in arb_info()) {
            prop_assert!(!(less(&a, &b) && less(&b, &a)));
        }

        /// The order is transitive, so sorting is well defined
        #[test]
        fn prop_compare_is_transitive(a in arb_info(), b in arb_info(), c in arb_info()) {
            if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(compare(&a, &c), Ordering::Greater);
            }
        }

        /// Ranked output has every known row before every unknown row
        #[test]
        fn prop_rank_groups_known_first(mut rows in prop::collection::vec(arb_info(), 0..40)) {
            rank(&mut rows);
            let first_unknown = rows.iter().position(|r| r.type_tag.is_unknown()).unwrap_or(rows.len());
            prop_assert!(rows[first_unknown..].iter().all(|r| r.type_tag.is_unknown()));
            for pair in rows.windows(2) {
                prop_assert!(!less(&pair[1], &pair[0]));
            }
        }
    }
}
