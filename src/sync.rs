//! Lock-guarded tree for hosts that insert or reload while serving lookups.

use parking_lot::RwLock;

use crate::error::ParseError;
use crate::tree::Ipv4RadixTree;

/// An [`Ipv4RadixTree`] behind a reader-writer lock.
///
/// Lookups take the read lock and run in parallel. Insertions and
/// [`replace`](Self::replace) take the write lock, so a lookup never sees the
/// arena mid-growth. A tree that is never mutated after loading does not need
/// this: share `&Ipv4RadixTree` directly.
pub struct SharedIpv4RadixTree {
    inner: RwLock<Ipv4RadixTree>,
}

impl SharedIpv4RadixTree {
    pub fn new() -> Self {
        Self::from_tree(Ipv4RadixTree::new())
    }

    pub fn from_tree(tree: Ipv4RadixTree) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    pub fn put(&self, key: u32, mask: u32, value: i32) {
        self.inner.write().put(key, mask, value);
    }

    pub fn put_cidr(&self, cidr: &str, value: i32) -> Result<(), ParseError> {
        // Parse before locking so bad input never blocks readers.
        let (key, mask) = crate::parse::parse_cidr(cidr)?;
        self.put(key, mask, value);
        Ok(())
    }

    pub fn select_value(&self, key: u32) -> i32 {
        self.inner.read().select_value(key)
    }

    pub fn select_value_str(&self, ip: &str) -> Result<i32, ParseError> {
        let key = crate::parse::parse_ipv4(ip)?;
        Ok(self.select_value(key))
    }

    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    /// Swaps in `tree`, typically a freshly loaded one, and returns the old tree.
    pub fn replace(&self, tree: Ipv4RadixTree) -> Ipv4RadixTree {
        std::mem::replace(&mut *self.inner.write(), tree)
    }

    pub fn into_inner(self) -> Ipv4RadixTree {
        self.inner.into_inner()
    }
}

impl Default for SharedIpv4RadixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Ipv4RadixTree> for SharedIpv4RadixTree {
    fn from(tree: Ipv4RadixTree) -> Self {
        Self::from_tree(tree)
    }
}
