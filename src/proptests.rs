use super::*;

use crate::arena::NodeIdx;
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{HashMap, HashSet};

/// Brute-force longest-prefix match over every stored prefix.
#[derive(Default)]
struct Reference {
    prefixes: HashMap<(u32, u8), i32>,
}

impl Reference {
    fn put(&mut self, key: u32, len: u8, value: i32) {
        self.prefixes.insert((key & mask_from_prefix_len(len), len), value);
    }

    fn select(&self, key: u32) -> i32 {
        (0..=MAX_PREFIX_LEN)
            .rev()
            .find_map(|len| self.prefixes.get(&(key & mask_from_prefix_len(len), len)).copied())
            .unwrap_or(NO_VALUE)
    }

    /// One node per distinct prefix of every stored prefix, root included.
    fn node_count(&self) -> usize {
        let mut nodes = HashSet::new();
        for &(key, len) in self.prefixes.keys() {
            for l in 0..=len {
                nodes.insert((key & mask_from_prefix_len(l), l));
            }
        }
        nodes.len().max(1)
    }
}

fn validate_tree(t: &Ipv4RadixTree) {
    let nodes = t.nodes();
    assert!(t.size() <= t.capacity());

    let mut seen = vec![false; nodes.len()];
    let mut stack = vec![(NodeIdx::ROOT, 0u32)];
    while let Some((node, depth)) = stack.pop() {
        assert!(node.as_usize() < nodes.len(), "child index out of bounds");
        assert!(depth <= 32, "tree deeper than an IPv4 address");
        assert!(!seen[node.as_usize()], "node reachable twice");
        seen[node.as_usize()] = true;

        for child in [nodes.left(node), nodes.right(node)] {
            if !child.is_null() {
                stack.push((child, depth + 1));
            }
        }
    }
    assert!(seen.iter().all(|&s| s), "unreachable node");
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 3)]
    Put {
        key: u32,
        #[proptest(strategy = "0u8..=32")]
        len: u8,
        #[proptest(strategy = "0i32..=i32::MAX")]
        value: i32,
    },
    Select(u32),
}

fn prefix_set() -> impl Strategy<Value = Vec<(u32, u8)>> {
    prop::collection::vec((any::<u32>(), 0u8..=32), 0..=5)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_longest_prefix_match(ops in prop::collection::vec(any::<Op>(), 0..=500), capacity in 0usize..64) {
        let mut t = Ipv4RadixTree::with_capacity(capacity);
        let mut m = Reference::default();
        let mut keys = Vec::new();

        for op in ops {
            match op {
                Op::Put { key, len, value } => {
                    let before = t.size();
                    t.put(key, mask_from_prefix_len(len), value);
                    m.put(key, len, value);
                    keys.push(key);
                    prop_assert!(t.size() >= before);
                }
                Op::Select(key) => {
                    prop_assert_eq!(t.select_value(key), m.select(key));
                }
            }
        }

        validate_tree(&t);
        prop_assert_eq!(t.size(), m.node_count());
        for key in keys {
            prop_assert_eq!(t.select_value(key), m.select(key));
            prop_assert_eq!(t.select_value(key ^ 1), m.select(key ^ 1));
        }
    }

    #[test]
    fn prop_size_independent_of_order(set in prefix_set()) {
        let mut sizes = HashSet::new();
        for_each_permutation(&set, |perm| {
            let mut t = Ipv4RadixTree::with_capacity(1);
            for (i, (key, len)) in perm.into_iter().enumerate() {
                t.put(key, mask_from_prefix_len(len), i as i32);
            }
            validate_tree(&t);
            sizes.insert(t.size());
        });
        prop_assert!(sizes.len() <= 1, "sizes differ across insert orders: {:?}", sizes);
    }

    #[test]
    fn prop_parse_ipv4_rejects_foreign_chars(s in "[0-9.]{0,6}[^0-9.][0-9.]{0,6}") {
        prop_assert!(parse_ipv4(&s).is_err());
        let mut t = Ipv4RadixTree::new();
        let cidr = format!("{s}/8");
        prop_assert!(t.put_cidr(&cidr, 1).is_err());
        prop_assert_eq!(t.size(), 1);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_nested_prefixes() {
    let prefixes = [
        "0.0.0.0/0",
        "10.0.0.0/8",
        "10.0.0.0/24",
        "10.0.0.128/25",
        "10.1.0.0/16",
        "192.168.1.1/32",
    ];
    let lookups = [
        ("10.0.0.200", 3),
        ("10.0.0.1", 2),
        ("10.0.1.1", 1),
        ("10.1.2.3", 4),
        ("192.168.1.1", 5),
        ("192.168.1.2", 0),
        ("8.8.8.8", 0),
    ];

    let mut size = None;
    let items: Vec<usize> = (0..prefixes.len()).collect();
    for_each_permutation(&items, |perm| {
        let mut t = Ipv4RadixTree::with_capacity(2);
        for i in perm {
            t.put_cidr(prefixes[i], i as i32).unwrap();
        }

        validate_tree(&t);
        for (ip, expected) in lookups {
            assert_eq!(t.select_value_str(ip), Ok(expected), "lookup of {ip}");
        }
        assert_eq!(*size.get_or_insert(t.size()), t.size());
    });
}
