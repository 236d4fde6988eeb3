//! ipmatch - Overlap Matching for IPv4 Inventories
//!
//! ipmatch parses heterogeneous IPv4 text (single addresses, CIDR blocks,
//! inclusive ranges) into a canonical form and reports, for every entry of
//! a source list, which entries of a reference list it overlaps. Useful for
//! checking address lists against network inventories, allocation plans, or
//! firewall object exports.
//!
//! # Quick Start
//!
//! ```rust
//! use ipmatch::{parser, ReferenceIndex, MatchOptions};
//!
//! // Parse both sides; malformed tokens are dropped and counted
//! let (sources, stats) = parser::parse_text("10.0.0.5, 192.168.1.1\n8.8.8.8");
//! assert_eq!(stats.parsed, 3);
//!
//! let (references, _) = parser::parse_reference_text("10.0.0.0/24\n192.168.0.0/16");
//!
//! // Index is rebuilt per run and borrows the reference slice
//! let index = ReferenceIndex::build(&references);
//! let results = ipmatch::run_match(&sources, &index, MatchOptions::default())?;
//!
//! assert!(results[0].is_matched()); // 10.0.0.5 in 10.0.0.0/24
//! assert!(results[1].is_matched()); // 192.168.1.1 in 192.168.0.0/16
//! assert!(!results[2].is_matched()); // 8.8.8.8 overlaps nothing
//! # Ok::<(), ipmatch::MatchError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! raw text / inventory rows
//!         │
//!         ▼
//!     Parser ──► Vec<SourceEntry> / Vec<ReferenceEntry>
//!         │
//!         ▼
//!     ReferenceIndex::build   (prefix-length buckets, address map, ranges)
//!         │
//!         ▼
//!     run_match ──► Vec<MatchResult>  (entry indices, first-seen order)
//! ```
//!
//! Matching is single-threaded and pure; [`session::MatchSession`] wraps a
//! whole run on a worker thread with progress events and cancellation for
//! interactive callers.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
/// Canonical address values and interval arithmetic
pub mod address;
/// Cooperative cancellation token
pub mod cancel;
/// The match engine
pub mod engine;
/// Source and reference entry records
pub mod entry;
/// Error types
pub mod error;
/// Per-run reference index
pub mod index;
/// Token and batch parsing
pub mod parser;
/// Worker-thread session boundary
pub mod session;

// Re-exports for consumers

pub use crate::address::{AddressKind, AddressValue};
pub use crate::cancel::CancelToken;
pub use crate::engine::{run_match, MatchOptions, MatchResult, DEFAULT_PROGRESS_INTERVAL};
pub use crate::entry::{ReferenceEntry, SourceEntry};
pub use crate::error::{MatchError, ParseError, RangeFault};
pub use crate::index::ReferenceIndex;
pub use crate::parser::{ParseStats, DEFAULT_CHUNK_SIZE};
pub use crate::session::{
    MatchOutcome, MatchSession, ReferenceInput, SessionEvent, SessionRequest, SourceInput,
};

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
