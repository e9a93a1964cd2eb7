//! Flat node storage for the radix tree.
//!
//! Nodes are not individual allocations. A node is an index into three
//! parallel vectors (`left`, `right`, `value`) which always have the same
//! length. Node 0 is the root and exists from construction on.
//!
//! The arena keeps its own logical capacity (`allocated`) and doubles it when
//! a node is requested while full. Existing nodes are moved into the larger
//! storage by `Vec` reallocation, so their contents are preserved exactly.

use crate::NO_VALUE;

/// Index of a node in a [`NodeArena`].
///
/// A 32-bit index keeps each child link at 4 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeIdx(u32);

impl NodeIdx {
    /// Absent child.
    pub const NULL: NodeIdx = NodeIdx(u32::MAX);

    /// The root node.
    pub const ROOT: NodeIdx = NodeIdx(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    /// # Panics
    /// Panics if `idx` does not fit below the `NULL` sentinel.
    #[inline]
    fn from_usize(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize, "node index overflow");
        Self(idx as u32)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

/// Growable arena holding every node of a tree.
#[derive(Clone)]
pub struct NodeArena {
    left: Vec<NodeIdx>,
    right: Vec<NodeIdx>,
    values: Vec<i32>,
    /// Logical capacity. Doubles when `len() == allocated`.
    allocated: usize,
}

impl NodeArena {
    /// Creates an arena with room for `capacity` nodes and a fresh root.
    ///
    /// A capacity of zero is raised to one so the root always fits.
    pub fn with_capacity(capacity: usize) -> Self {
        let allocated = capacity.max(1);
        let mut arena = Self {
            left: Vec::with_capacity(allocated),
            right: Vec::with_capacity(allocated),
            values: Vec::with_capacity(allocated),
            allocated,
        };
        arena.push_empty();
        arena
    }

    /// Number of nodes in use, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Logical capacity in nodes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.allocated
    }

    /// Heap bytes reserved by the three node vectors.
    pub fn memory_usage(&self) -> usize {
        self.left.capacity() * std::mem::size_of::<NodeIdx>()
            + self.right.capacity() * std::mem::size_of::<NodeIdx>()
            + self.values.capacity() * std::mem::size_of::<i32>()
    }

    /// Appends a node with no children and no value and returns its index.
    ///
    /// Doubles the capacity first when the arena is full.
    pub fn allocate_node(&mut self) -> NodeIdx {
        if self.len() == self.allocated {
            self.grow();
        }
        self.push_empty()
    }

    fn grow(&mut self) {
        let from = self.allocated;
        let to = from.saturating_mul(2);
        let additional = to - self.len();
        self.left.reserve_exact(additional);
        self.right.reserve_exact(additional);
        self.values.reserve_exact(additional);
        self.allocated = to;
        tracing::trace!(from, to, "grew radix tree node arena");
    }

    fn push_empty(&mut self) -> NodeIdx {
        debug_assert!(self.len() < self.allocated);
        let idx = NodeIdx::from_usize(self.len());
        self.left.push(NodeIdx::NULL);
        self.right.push(NodeIdx::NULL);
        self.values.push(NO_VALUE);
        idx
    }

    #[inline]
    pub fn left(&self, node: NodeIdx) -> NodeIdx {
        self.left[node.as_usize()]
    }

    #[inline]
    pub fn right(&self, node: NodeIdx) -> NodeIdx {
        self.right[node.as_usize()]
    }

    /// Child on the `right` side when `bit_set`, else on the `left` side.
    #[inline]
    pub fn child(&self, node: NodeIdx, bit_set: bool) -> NodeIdx {
        if bit_set {
            self.right(node)
        } else {
            self.left(node)
        }
    }

    #[inline]
    pub fn set_child(&mut self, node: NodeIdx, bit_set: bool, child: NodeIdx) {
        debug_assert!(child.is_null() || child.as_usize() < self.len());
        if bit_set {
            self.right[node.as_usize()] = child;
        } else {
            self.left[node.as_usize()] = child;
        }
    }

    #[inline]
    pub fn value(&self, node: NodeIdx) -> i32 {
        self.values[node.as_usize()]
    }

    #[inline]
    pub fn set_value(&mut self, node: NodeIdx, value: i32) {
        self.values[node.as_usize()] = value;
    }
}
