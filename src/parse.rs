//! Dotted-decimal address and CIDR parsing.

use crate::error::ParseError;

/// Longest IPv4 prefix.
pub const MAX_PREFIX_LEN: u8 = 32;

/// Netmask with the top `len` bits set.
///
/// `0` yields an empty mask and `32` (or more) a full one.
#[inline]
pub fn mask_from_prefix_len(len: u8) -> u32 {
    if len >= MAX_PREFIX_LEN {
        return u32::MAX;
    }
    u32::MAX.checked_shl(u32::from(MAX_PREFIX_LEN - len)).unwrap_or(0)
}

/// Parses `a.b.c.d` into a host-order `u32`, first octet in the high byte.
///
/// Exactly four non-empty decimal octets in `0..=255` are accepted.
pub fn parse_ipv4(s: &str) -> Result<u32, ParseError> {
    let invalid = || ParseError::InvalidAddress(s.to_owned());

    let mut addr = 0u32;
    let mut octets = 0;
    for part in s.split('.') {
        if octets == 4 {
            return Err(invalid());
        }
        let octet = parse_decimal(part, 255).ok_or_else(invalid)?;
        addr = (addr << 8) | octet;
        octets += 1;
    }

    if octets != 4 {
        return Err(invalid());
    }
    Ok(addr)
}

/// Parses `a.b.c.d/len` into `(key, mask)`.
///
/// The prefix length must be in `0..=32`; longer lengths are rejected rather
/// than clamped. Host bits in the address are kept as given.
pub fn parse_cidr(s: &str) -> Result<(u32, u32), ParseError> {
    let invalid = || ParseError::InvalidCidr(s.to_owned());

    let (ip, len) = s.split_once('/').ok_or_else(invalid)?;
    let key = parse_ipv4(ip)?;
    let len = parse_decimal(len, u32::from(MAX_PREFIX_LEN)).ok_or_else(invalid)?;
    Ok((key, mask_from_prefix_len(len as u8)))
}

/// Non-empty run of ASCII digits whose value does not exceed `max`.
fn parse_decimal(s: &str, max: u32) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut value = 0u32;
    for b in s.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u32::from(b - b'0');
        if value > max {
            return None;
        }
    }
    Some(value)
}
