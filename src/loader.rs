//! Bulk construction from tab-separated prefix files.
//!
//! Two line grammars are understood:
//!
//! ```text
//! plain:  <ip>\t<cidr>\t<value>\n     value in decimal
//! nginx:  <ip>/<cidr>\t<value>;\n     value in hex, as in an nginx `geo` block
//! ```
//!
//! The tokenizer is shared: octets end with `.`, the last octet and the
//! prefix length end with a tab or `/`, and the value runs to the end of the
//! line. One `;` right before the line end is dropped in either grammar.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::error::{LoadError, ParseError};
use crate::parse::{mask_from_prefix_len, MAX_PREFIX_LEN};
use crate::tree::Ipv4RadixTree;
use crate::DEFAULT_CAPACITY;

const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Grammar of the value column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineFormat {
    /// Decimal values that fit in a non-negative `i32`.
    #[default]
    Plain,
    /// Hexadecimal values of up to 32 bits, reinterpreted as `i32`.
    Nginx,
}

impl LineFormat {
    /// `(radix, max)` for the value column.
    fn value_digits(self) -> (u32, u32) {
        match self {
            LineFormat::Plain => (10, i32::MAX as u32),
            LineFormat::Nginx => (16, u32::MAX),
        }
    }
}

/// Configuration for a [`Loader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub format: LineFormat,
    /// Initial node capacity. `None` sizes the tree from a line count of the
    /// input file, or [`DEFAULT_CAPACITY`] for readers.
    pub initial_capacity: Option<usize>,
    /// Read buffer size in bytes.
    pub buffer_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            format: LineFormat::Plain,
            initial_capacity: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl LoaderConfig {
    pub fn nginx() -> Self {
        Self {
            format: LineFormat::Nginx,
            ..Self::default()
        }
    }
}

/// Builds an [`Ipv4RadixTree`] from line-oriented input.
///
/// The first malformed line aborts the load. Nothing is skipped, empty
/// lines included.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads a file, streaming it through a buffered reader.
    ///
    /// Unless a capacity is configured, the file is read once beforehand to
    /// count its lines, and the tree starts with that many nodes.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Ipv4RadixTree, LoadError> {
        let path = path.as_ref();

        let capacity = match self.config.initial_capacity {
            Some(capacity) => capacity,
            None => count_lines_with_buffer(path, self.config.buffer_size)
                .map_err(|e| LoadError::io(path, e))?,
        };
        debug!(
            path = %path.display(),
            capacity,
            format = ?self.config.format,
            "loading radix tree"
        );

        let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
        let reader = BufReader::with_capacity(self.config.buffer_size, file);

        let mut tree = Ipv4RadixTree::with_capacity(capacity);
        let records = self.load_into(&mut tree, reader).map_err(|e| match e {
            LoadError::Read(e) => LoadError::io(path, e),
            e => e,
        })?;

        debug!(
            path = %path.display(),
            records,
            nodes = tree.size(),
            "loaded radix tree"
        );
        Ok(tree)
    }

    /// Loads from an already open source.
    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<Ipv4RadixTree, LoadError> {
        let mut tree =
            Ipv4RadixTree::with_capacity(self.config.initial_capacity.unwrap_or(DEFAULT_CAPACITY));
        let records = self.load_into(&mut tree, reader)?;
        debug!(records, nodes = tree.size(), "loaded radix tree");
        Ok(tree)
    }

    /// Inserts every record of `reader` into `tree` and returns the record count.
    ///
    /// Records before a malformed line stay inserted; callers discard the tree
    /// on error.
    fn load_into<R: BufRead>(&self, tree: &mut Ipv4RadixTree, mut reader: R) -> Result<usize, LoadError> {
        let mut buf = Vec::with_capacity(64);
        let mut line_no = 0;
        let mut records = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let record = parse_record(trim_line_end(&buf), self.config.format).ok_or_else(|| {
                let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
                ParseError::InvalidLine {
                    line: line_no,
                    content: String::from_utf8_lossy(raw).into_owned(),
                }
            })?;
            tree.put(record.key, record.mask, record.value);
            records += 1;
        }

        Ok(records)
    }
}

impl Ipv4RadixTree {
    /// Builds a tree from a file in the plain or nginx grammar.
    pub fn load_from_file(path: impl AsRef<Path>, nginx_format: bool) -> Result<Self, LoadError> {
        let config = if nginx_format {
            LoaderConfig::nginx()
        } else {
            LoaderConfig::default()
        };
        Loader::new(config).load_file(path)
    }

    /// Builds a tree from a file in the plain grammar.
    pub fn load_from_local_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::load_from_file(path, false)
    }
}

/// Number of lines in a file. A last line without a newline counts, and so
/// does an empty file (as a single empty line).
pub fn count_lines(path: impl AsRef<Path>) -> io::Result<usize> {
    count_lines_with_buffer(path.as_ref(), 8 * 1024)
}

fn count_lines_with_buffer(path: &Path, buffer_size: usize) -> io::Result<usize> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut lines = 0;
    let mut last = 0u8;

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        lines += buf[..n].iter().filter(|&&b| b == b'\n').count();
        last = buf[n - 1];
    }

    if last != b'\n' {
        lines += 1;
    }
    Ok(lines)
}

#[derive(Debug, PartialEq, Eq)]
struct Record {
    key: u32,
    mask: u32,
    value: i32,
}

/// Strips `\n`, then `\r`, then one `;`.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.strip_suffix(b";").unwrap_or(line)
}

/// Field layout: octets 0..=3, prefix length 4, value 5.
fn parse_record(line: &[u8], format: LineFormat) -> Option<Record> {
    const LEN: usize = 4;
    const VALUE: usize = 5;

    let mut octets = [0u32; 4];
    let mut prefix_len = 0u32;
    let mut field = 0;
    let mut acc = 0u32;
    let mut digits = 0;

    for &b in line {
        let separator = match field {
            0..=2 => b == b'.',
            3 | LEN => b == b'\t' || b == b'/',
            _ => false,
        };
        if separator {
            if digits == 0 {
                return None;
            }
            if field == LEN {
                prefix_len = acc;
            } else {
                octets[field] = acc;
            }
            field += 1;
            acc = 0;
            digits = 0;
            continue;
        }

        let (radix, max) = match field {
            0..=3 => (10, 255),
            LEN => (10, u32::from(MAX_PREFIX_LEN)),
            _ => format.value_digits(),
        };
        let digit = char::from(b).to_digit(radix)?;
        acc = acc.checked_mul(radix)?.checked_add(digit)?;
        if acc > max {
            return None;
        }
        digits += 1;
    }

    if field != VALUE || digits == 0 {
        return None;
    }

    Some(Record {
        key: octets.iter().fold(0, |key, &octet| (key << 8) | octet),
        mask: mask_from_prefix_len(prefix_len as u8),
        value: acc as i32,
    })
}
