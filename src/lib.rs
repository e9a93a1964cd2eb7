//! # ipv4-radix
//!
//! A compact binary radix tree (Patricia trie) keyed by IPv4 prefixes, with
//! `i32` values and longest-prefix-match lookup. Suited to build-once,
//! read-many tables: geolocation, blocklists, routing-table emulation.
//!
//! Nodes live in one flat arena and refer to each other by index. There is
//! no removal.
//!
//! ## Example
//!
//! ```rust
//! use ipv4_radix::{Ipv4RadixTree, NO_VALUE};
//!
//! let mut tree = Ipv4RadixTree::new();
//! tree.put(0x0a00_0000, 0xffff_ff00, 42); // 10.0.0.0/24
//! tree.put_cidr("10.0.0.0/8", 69).unwrap();
//!
//! assert_eq!(tree.select_value_str("10.32.32.32"), Ok(69));
//! assert_eq!(tree.select_value_str("10.0.0.32"), Ok(42));
//! assert_eq!(tree.select_value(0x0b01_0203), NO_VALUE);
//! ```
//!
//! ## Bulk loading
//!
//! [`Ipv4RadixTree::load_from_file`] reads tab-separated prefix files, either
//! `ip<TAB>cidr<TAB>decimal` lines or nginx-style `ip/cidr<TAB>hex;` lines.

#![deny(unsafe_code)]

mod arena;
mod error;
mod loader;
mod parse;
mod sync;
mod tree;

pub use error::{LoadError, ParseError};
pub use loader::{count_lines, LineFormat, Loader, LoaderConfig};
pub use parse::{mask_from_prefix_len, parse_cidr, parse_ipv4, MAX_PREFIX_LEN};
pub use sync::SharedIpv4RadixTree;
pub use tree::Ipv4RadixTree;

/// Returned by lookups that match no stored prefix. It cannot be stored as a
/// real value.
pub const NO_VALUE: i32 = -1;

/// Node capacity of [`Ipv4RadixTree::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

#[cfg(test)]
mod proptests;
