//! Canonical representation of one parsed IPv4 expression
//!
//! Every value reduces to a closed interval on the 32-bit address space,
//! which makes overlap testing a single disjointness check regardless of
//! the shapes being compared.

use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Shape label for a parsed value, used by renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressKind {
    /// One address
    Single,
    /// CIDR network block
    #[serde(rename = "CIDR")]
    Cidr,
    /// Inclusive endpoint range
    Range,
}

impl AddressKind {
    /// Stable display label
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::Single => "Single",
            AddressKind::Cidr => "CIDR",
            AddressKind::Range => "Range",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed IPv4 expression: single address, CIDR network, or inclusive range
///
/// Immutable once constructed. Network bases are stored with host bits
/// already cleared, so `base` is always the first address of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressValue {
    /// One address, big-endian integer encoding
    Single(u32),
    /// CIDR network; `base` is masked at construction
    Network {
        /// First address of the block
        base: u32,
        /// Leading fixed bits, 0..=32
        prefix_len: u8,
    },
    /// Inclusive range with `start <= end`
    Range {
        /// First address
        start: u32,
        /// Last address
        end: u32,
    },
}

impl AddressValue {
    /// Netmask for a prefix length (0 yields an empty mask, 32 a full one)
    pub fn mask(prefix_len: u8) -> u32 {
        debug_assert!(prefix_len <= 32);
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len)
        }
    }

    /// Construct a network value, clearing host bits from `base`
    pub fn network(base: u32, prefix_len: u8) -> AddressValue {
        let masked = base & Self::mask(prefix_len);
        AddressValue::Network {
            base: masked,
            prefix_len,
        }
    }

    /// Shape label for display
    pub fn kind(&self) -> AddressKind {
        match self {
            AddressValue::Single(_) => AddressKind::Single,
            AddressValue::Network { .. } => AddressKind::Cidr,
            AddressValue::Range { .. } => AddressKind::Range,
        }
    }

    /// The closed interval `[lo, hi]` this value covers
    pub fn bounds(&self) -> (u32, u32) {
        match *self {
            AddressValue::Single(addr) => (addr, addr),
            AddressValue::Network { base, prefix_len } => {
                (base, base | !Self::mask(prefix_len))
            }
            AddressValue::Range { start, end } => (start, end),
        }
    }

    /// Whether two values share at least one address
    ///
    /// Intervals either side of the comparison are closed, so this is a
    /// plain disjointness test. CIDR intervals only ever nest or stay
    /// disjoint, which makes this equivalent to the mutual-subnet test
    /// for network pairs.
    pub fn overlaps(&self, other: &AddressValue) -> bool {
        let (lo_a, hi_a) = self.bounds();
        let (lo_b, hi_b) = other.bounds();
        !(hi_a < lo_b || lo_a > hi_b)
    }

    /// Whether a single address integer falls inside this value
    pub fn contains_addr(&self, addr: u32) -> bool {
        let (lo, hi) = self.bounds();
        lo <= addr && addr <= hi
    }
}

impl fmt::Display for AddressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            AddressValue::Single(addr) => write!(f, "{}", Ipv4Addr::from(addr)),
            AddressValue::Network { base, prefix_len } => {
                write!(f, "{}/{}", Ipv4Addr::from(base), prefix_len)
            }
            AddressValue::Range { start, end } => {
                write!(f, "{}-{}", Ipv4Addr::from(start), Ipv4Addr::from(end))
            }
        }
    }
}
