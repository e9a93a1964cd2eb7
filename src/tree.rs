use std::net::Ipv4Addr;

use crate::arena::{NodeArena, NodeIdx};
use crate::error::ParseError;
use crate::parse::{parse_cidr, parse_ipv4};
use crate::{DEFAULT_CAPACITY, NO_VALUE};

const MAX_IPV4_BIT: u32 = 0x8000_0000;

/// Binary radix tree keyed by IPv4 prefixes, holding one `i32` per prefix.
///
/// Each level consumes one address bit, most significant first, so a prefix
/// of length `p` lives at depth `p`. There is no removal: the tree is meant to
/// be built once (see [`Ipv4RadixTree::load_from_file`]) and then queried.
///
/// [`NO_VALUE`] is reserved. Storing it under a prefix is the same as never
/// having stored anything there.
#[derive(Clone)]
pub struct Ipv4RadixTree {
    nodes: NodeArena,
}

impl Ipv4RadixTree {
    /// Creates a tree with room for [`DEFAULT_CAPACITY`] nodes, enough for
    /// small databases.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a tree with room for `capacity` nodes before the first growth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
        }
    }

    /// Number of nodes, root included. This is not the number of prefixes.
    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that fit before the arena grows again.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Heap bytes reserved for nodes, used or not.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    /// Stores `value` under the prefix `key/mask`.
    ///
    /// `mask` is a netmask such as `0xffff_ff00` for a /24. Only its leading
    /// run of one bits is used. Bits of `key` beyond the mask are ignored.
    /// A value already stored under the exact same prefix is replaced.
    pub fn put(&mut self, key: u32, mask: u32, value: i32) {
        let mut bit = MAX_IPV4_BIT;
        let mut node = NodeIdx::ROOT;

        // Follow the existing path as far as it goes.
        while bit & mask != 0 {
            let next = self.nodes.child(node, key & bit != 0);
            if next.is_null() {
                break;
            }
            node = next;
            bit >>= 1;
        }

        // Extend it with fresh nodes for the remaining prefix bits.
        while bit & mask != 0 {
            let next = self.nodes.allocate_node();
            self.nodes.set_child(node, key & bit != 0, next);
            node = next;
            bit >>= 1;
        }

        self.nodes.set_value(node, value);
    }

    /// Stores `value` under a prefix written as `a.b.c.d/len`.
    ///
    /// The tree is left untouched when `cidr` does not parse.
    pub fn put_cidr(&mut self, cidr: &str, value: i32) -> Result<(), ParseError> {
        let (key, mask) = parse_cidr(cidr)?;
        self.put(key, mask, value);
        Ok(())
    }

    /// Value of the most specific stored prefix containing `key`, or
    /// [`NO_VALUE`] when no stored prefix contains it.
    pub fn select_value(&self, key: u32) -> i32 {
        let mut bit = MAX_IPV4_BIT;
        let mut value = NO_VALUE;
        let mut node = NodeIdx::ROOT;

        while !node.is_null() {
            let v = self.nodes.value(node);
            if v != NO_VALUE {
                value = v;
            }
            // Depth 32 nodes have no children, so `bit` reaching zero ends the walk.
            node = self.nodes.child(node, key & bit != 0);
            bit >>= 1;
        }

        value
    }

    /// Like [`select_value`](Self::select_value), with `None` for no match.
    #[inline]
    pub fn get(&self, key: u32) -> Option<i32> {
        match self.select_value(key) {
            NO_VALUE => None,
            v => Some(v),
        }
    }

    /// Looks up a dotted-decimal address.
    pub fn select_value_str(&self, ip: &str) -> Result<i32, ParseError> {
        Ok(self.select_value(parse_ipv4(ip)?))
    }

    #[inline]
    pub fn select_value_addr(&self, addr: Ipv4Addr) -> i32 {
        self.select_value(u32::from(addr))
    }

    #[cfg(test)]
    pub(crate) fn nodes(&self) -> &NodeArena {
        &self.nodes
    }
}

impl Default for Ipv4RadixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ipv4RadixTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4RadixTree")
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .finish()
    }
}
