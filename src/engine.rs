//! Overlap matching of source entries against a reference index
//!
//! Single-threaded and stateless across calls: the result is a pure
//! function of the inputs. Per source entry the engine dispatches on the
//! parsed variant, walks the relevant index structures, and records every
//! overlapping reference entry in first-seen order.

use crate::address::{AddressKind, AddressValue};
use crate::cancel::CancelToken;
use crate::entry::{ReferenceEntry, SourceEntry};
use crate::error::MatchError;
use crate::index::ReferenceIndex;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Sources processed between progress callbacks
///
/// Coalesced so the callback never dominates the match loop.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Knobs for one match run
///
/// The progress callback is invoked on the calling thread every
/// `progress_interval` sources and on the final source, with
/// `(sources_processed, total)`. It must be cheap and must not block;
/// callers that cross threads should forward through a channel. The
/// cancel token is checked at the same cadence.
#[derive(Default)]
pub struct MatchOptions<'a> {
    /// Progress callback, if any
    pub progress: Option<&'a mut dyn FnMut(usize, usize)>,
    /// Cooperative cancellation, if any
    pub cancel: Option<&'a CancelToken>,
    /// Callback/cancellation cadence; 0 means the default
    pub progress_interval: usize,
}

/// Match outcome for one source entry
///
/// `matched` holds indices into the reference slice the index was built
/// from, deduplicated by entry identity, first-seen order. Keeping
/// indices rather than display text lets renderers join any metadata
/// they need.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Original source text
    pub source: String,
    /// Detected shape of the source token
    pub kind: AddressKind,
    /// Indices of overlapping reference entries
    pub matched: Vec<usize>,
}

impl MatchResult {
    /// Whether anything overlapped
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Display names of the matched entries, in match order
    pub fn matched_names<'e>(&self, entries: &'e [ReferenceEntry]) -> Vec<&'e str> {
        self.matched
            .iter()
            .map(|&id| entries[id].network_name.as_str())
            .collect()
    }
}

/// Match every source entry against the index
///
/// A source with no overlaps yields a result with an empty `matched`
/// list; the only error is cooperative cancellation.
pub fn run_match(
    sources: &[SourceEntry],
    index: &ReferenceIndex,
    mut options: MatchOptions<'_>,
) -> Result<Vec<MatchResult>, MatchError> {
    let interval = if options.progress_interval == 0 {
        DEFAULT_PROGRESS_INTERVAL
    } else {
        options.progress_interval
    };
    let total = sources.len();
    let mut results = Vec::with_capacity(total);
    let mut seen = FxHashSet::default();

    for (idx, source) in sources.iter().enumerate() {
        let at_checkpoint = idx % interval == 0 || idx + 1 == total;
        if at_checkpoint {
            if let Some(token) = options.cancel {
                if token.is_cancelled() {
                    return Err(MatchError::Cancelled);
                }
            }
        }

        seen.clear();
        let mut matched = Vec::new();
        match_one(source.value, index, &mut matched, &mut seen);

        results.push(MatchResult {
            source: source.original.clone(),
            kind: source.value.kind(),
            matched,
        });

        if at_checkpoint {
            if let Some(cb) = options.progress.as_deref_mut() {
                cb(idx + 1, total);
            }
        }
    }

    Ok(results)
}

/// Collect overlapping entry ids for one source value
///
/// Discovery order is fixed: single addresses check the exact-match map,
/// then networks (longest prefix first, so more specific matches are
/// reported earlier), then ranges; network and range sources visit
/// networks, then addresses, then ranges.
fn match_one(
    value: AddressValue,
    index: &ReferenceIndex,
    out: &mut Vec<usize>,
    seen: &mut FxHashSet<usize>,
) {
    // Dedup by entry identity, first-seen order
    fn push(id: usize, out: &mut Vec<usize>, seen: &mut FxHashSet<usize>) {
        if seen.insert(id) {
            out.push(id);
        }
    }

    match value {
        AddressValue::Single(addr) => {
            if let Some(id) = index.lookup_address(addr) {
                push(id, out, seen);
            }
            for bucket in index.buckets() {
                for &(net, id) in &bucket.nets {
                    if addr & bucket.mask == net {
                        push(id, out, seen);
                    }
                }
            }
            for &(start, end, id) in index.ranges() {
                if start <= addr && addr <= end {
                    push(id, out, seen);
                }
            }
        }
        AddressValue::Network { .. } | AddressValue::Range { .. } => {
            let (lo, hi) = value.bounds();
            for bucket in index.buckets() {
                let span = !bucket.mask;
                for &(net, id) in &bucket.nets {
                    // Interval overlap; CIDR intervals nest or stay
                    // disjoint, so this is the mutual-subnet test
                    if !(hi < net || lo > (net | span)) {
                        push(id, out, seen);
                    }
                }
            }
            for &(addr, id) in index.address_slots() {
                if lo <= addr && addr <= hi {
                    push(id, out, seen);
                }
            }
            for &(start, end, id) in index.ranges() {
                if !(hi < start || lo > end) {
                    push(id, out, seen);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_reference_text, parse_text};

    fn setup(source_text: &str, reference_text: &str) -> (Vec<MatchResult>, Vec<ReferenceEntry>) {
        let (sources, _) = parse_text(source_text);
        let (refs, _) = parse_reference_text(reference_text);
        let index = ReferenceIndex::build(&refs);
        let results = run_match(&sources, &index, MatchOptions::default()).unwrap();
        (results, refs)
    }

    #[test]
    fn test_single_in_network() {
        let (results, refs) = setup("10.0.0.5", "10.0.0.0/24");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_names(&refs), vec!["10.0.0.0/24"]);
    }

    #[test]
    fn test_nested_networks_all_reported_specific_first() {
        let (results, refs) = setup("192.168.1.1", "192.168.0.0/16\n192.168.1.0/24");
        assert_eq!(
            results[0].matched_names(&refs),
            vec!["192.168.1.0/24", "192.168.0.0/16"]
        );
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let (results, _) = setup("8.8.8.8", "10.0.0.0/8");
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_matched());
        assert!(results[0].matched.is_empty());
    }

    #[test]
    fn test_exact_address_reported_before_networks() {
        let (results, refs) = setup("10.0.0.5", "10.0.0.0/24\n10.0.0.5");
        assert_eq!(
            results[0].matched_names(&refs),
            vec!["10.0.0.5", "10.0.0.0/24"]
        );
    }

    #[test]
    fn test_range_source_against_all_categories() {
        let (results, refs) = setup(
            "10.0.0.100-10.0.0.200",
            "10.0.0.0/24\n10.0.0.150\n10.0.0.180-10.0.1.0\n10.0.2.0/24",
        );
        assert_eq!(
            results[0].matched_names(&refs),
            vec!["10.0.0.0/24", "10.0.0.150", "10.0.0.180-10.0.1.0"]
        );
    }

    #[test]
    fn test_network_source_overlaps_network() {
        // Source /16 contains the reference /24 and vice versa
        let (results, refs) = setup("192.168.0.0/16", "192.168.5.0/24");
        assert_eq!(results[0].matched_names(&refs), vec!["192.168.5.0/24"]);

        let (results, refs) = setup("192.168.5.0/24", "192.168.0.0/16");
        assert_eq!(results[0].matched_names(&refs), vec!["192.168.0.0/16"]);
    }

    #[test]
    fn test_range_fully_containing_network_matches() {
        let (results, refs) = setup("10.0.0.0-10.0.3.255", "10.0.1.0/24");
        assert_eq!(results[0].matched_names(&refs), vec!["10.0.1.0/24"]);
    }

    #[test]
    fn test_identical_values_with_different_names_all_appear() {
        let (sources, _) = parse_text("10.0.0.1-10.0.0.9");
        let refs = vec![
            ReferenceEntry::from_token(
                crate::parser::parse_token("10.0.0.1-10.0.0.9").unwrap(),
                "range-a",
            ),
            ReferenceEntry::from_token(
                crate::parser::parse_token("10.0.0.1-10.0.0.9").unwrap(),
                "range-b",
            ),
        ];
        let index = ReferenceIndex::build(&refs);
        let results = run_match(&sources, &index, MatchOptions::default()).unwrap();
        assert_eq!(results[0].matched_names(&refs), vec!["range-a", "range-b"]);
    }

    #[test]
    fn test_idempotent_across_runs() {
        let (sources, _) = parse_text("10.0.0.5,192.168.1.1,8.8.8.8");
        let (refs, _) = parse_reference_text("10.0.0.0/8\n192.168.1.0/24\n10.0.0.5");
        let index = ReferenceIndex::build(&refs);
        let a = run_match(&sources, &index, MatchOptions::default()).unwrap();
        let rebuilt = ReferenceIndex::build(&refs);
        let b = run_match(&sources, &rebuilt, MatchOptions::default()).unwrap();
        let collect =
            |rs: &[MatchResult]| rs.iter().map(|r| r.matched.clone()).collect::<Vec<_>>();
        assert_eq!(collect(&a), collect(&b));
    }

    #[test]
    fn test_progress_fires_coalesced_and_on_final() {
        let text = (0..120)
            .map(|i| format!("10.0.{}.1", i))
            .collect::<Vec<_>>()
            .join("\n");
        let (sources, _) = parse_text(&text);
        let (refs, _) = parse_reference_text("10.0.0.0/8");
        let index = ReferenceIndex::build(&refs);

        let mut calls = Vec::new();
        let mut cb = |done: usize, total: usize| calls.push((done, total));
        run_match(
            &sources,
            &index,
            MatchOptions {
                progress: Some(&mut cb),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(calls, vec![(1, 120), (51, 120), (101, 120), (120, 120)]);
    }

    #[test]
    fn test_cancellation_between_checkpoints() {
        let (sources, _) = parse_text("1.1.1.1,2.2.2.2");
        let (refs, _) = parse_reference_text("1.0.0.0/8");
        let index = ReferenceIndex::build(&refs);
        let token = CancelToken::new();
        token.cancel();
        let err = run_match(
            &sources,
            &index,
            MatchOptions {
                cancel: Some(&token),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, MatchError::Cancelled);
    }

    #[test]
    fn test_empty_inputs() {
        let index = ReferenceIndex::build(&[]);
        let results = run_match(&[], &index, MatchOptions::default()).unwrap();
        assert!(results.is_empty());

        let (sources, _) = parse_text("1.1.1.1");
        let results = run_match(&sources, &index, MatchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].matched.is_empty());
    }
}
