//! Per-run index over reference entries
//!
//! Built fresh before each match run and discarded afterwards; it borrows
//! the entry slice and stores entry indices only. Entries are partitioned
//! by variant:
//! - networks into exact prefix-length buckets, so each bucket shares one
//!   precomputed mask and buckets iterate longest prefix first
//! - single addresses into an insertion-ordered slot list with a hash map
//!   for O(1) exact lookup
//! - ranges into a plain ordered list, scanned linearly

use crate::address::AddressValue;
use crate::entry::ReferenceEntry;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Networks sharing one prefix length
#[derive(Debug)]
pub struct PrefixBucket {
    /// Prefix length of every network in this bucket
    pub prefix_len: u8,
    /// Netmask shared by the bucket
    pub mask: u32,
    /// (network base, entry index), insertion order
    pub nets: Vec<(u32, usize)>,
}

/// Index over one reference set, valid for a single match run
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    /// Non-empty buckets, sorted longest prefix first
    buckets: Vec<PrefixBucket>,
    /// (address, entry index) slots in first-insertion order
    address_slots: Vec<(u32, usize)>,
    /// address -> position in `address_slots`
    address_lookup: FxHashMap<u32, usize>,
    /// (start, end, entry index), insertion order
    ranges: Vec<(u32, u32, usize)>,
}

impl ReferenceIndex {
    /// Partition a reference slice into the three lookup structures
    ///
    /// Duplicate single addresses keep the slot position of their first
    /// occurrence but the entry of the last one (last-write-wins).
    pub fn build(entries: &[ReferenceEntry]) -> ReferenceIndex {
        let mut by_prefix: [Vec<(u32, usize)>; 33] = std::array::from_fn(|_| Vec::new());
        let mut index = ReferenceIndex::default();

        for (id, entry) in entries.iter().enumerate() {
            match entry.value {
                AddressValue::Network { base, prefix_len } => {
                    by_prefix[prefix_len as usize].push((base, id));
                }
                AddressValue::Single(addr) => {
                    let next_slot = index.address_slots.len();
                    match index.address_lookup.entry(addr) {
                        Entry::Occupied(slot) => index.address_slots[*slot.get()].1 = id,
                        Entry::Vacant(slot) => {
                            slot.insert(next_slot);
                            index.address_slots.push((addr, id));
                        }
                    }
                }
                AddressValue::Range { start, end } => {
                    index.ranges.push((start, end, id));
                }
            }
        }

        for prefix_len in (0..=32u8).rev() {
            let nets = std::mem::take(&mut by_prefix[prefix_len as usize]);
            if !nets.is_empty() {
                index.buckets.push(PrefixBucket {
                    prefix_len,
                    mask: AddressValue::mask(prefix_len),
                    nets,
                });
            }
        }

        index
    }

    /// Buckets, longest prefix first
    pub fn buckets(&self) -> &[PrefixBucket] {
        &self.buckets
    }

    /// Address slots in first-insertion order
    pub fn address_slots(&self) -> &[(u32, usize)] {
        &self.address_slots
    }

    /// Entry index for an exact address, if present
    pub fn lookup_address(&self, addr: u32) -> Option<usize> {
        self.address_lookup
            .get(&addr)
            .map(|&slot| self.address_slots[slot].1)
    }

    /// Ranges in insertion order
    pub fn ranges(&self) -> &[(u32, u32, usize)] {
        &self.ranges
    }

    /// Indexed network count across all buckets
    pub fn network_count(&self) -> usize {
        self.buckets.iter().map(|b| b.nets.len()).sum()
    }

    /// Distinct indexed single addresses
    pub fn address_count(&self) -> usize {
        self.address_slots.len()
    }

    /// Indexed range count
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_token;

    fn entry(token: &str) -> ReferenceEntry {
        ReferenceEntry::from_token(parse_token(token).unwrap(), token)
    }

    #[test]
    fn test_partitions_by_variant() {
        let refs = vec![
            entry("10.0.0.0/8"),
            entry("1.2.3.4"),
            entry("10.0.0.1-10.0.0.5"),
            entry("192.168.0.0/16"),
            entry("192.168.1.0/24"),
        ];
        let index = ReferenceIndex::build(&refs);
        assert_eq!(index.network_count(), 3);
        assert_eq!(index.address_count(), 1);
        assert_eq!(index.range_count(), 1);
    }

    #[test]
    fn test_buckets_sorted_longest_prefix_first() {
        let refs = vec![
            entry("10.0.0.0/8"),
            entry("192.168.1.0/24"),
            entry("172.16.0.0/16"),
        ];
        let index = ReferenceIndex::build(&refs);
        let lens: Vec<u8> = index.buckets().iter().map(|b| b.prefix_len).collect();
        assert_eq!(lens, vec![24, 16, 8]);
        for bucket in index.buckets() {
            assert_eq!(bucket.mask, AddressValue::mask(bucket.prefix_len));
        }
    }

    #[test]
    fn test_duplicate_addresses_last_write_wins() {
        let refs = vec![entry("1.1.1.1"), entry("2.2.2.2"), entry("1.1.1.1")];
        let index = ReferenceIndex::build(&refs);
        // Slot keeps first-insert position, entry id is the later one
        assert_eq!(index.address_count(), 2);
        assert_eq!(index.address_slots()[0], (0x0101_0101, 2));
        assert_eq!(index.lookup_address(0x0101_0101), Some(2));
    }

    #[test]
    fn test_empty_reference_set() {
        let index = ReferenceIndex::build(&[]);
        assert_eq!(index.network_count(), 0);
        assert_eq!(index.address_count(), 0);
        assert_eq!(index.range_count(), 0);
        assert_eq!(index.lookup_address(1), None);
    }
}
