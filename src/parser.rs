//! Parsing of raw IP text into canonical values
//!
//! Input arrives either as one blob delimited by runs of `,`, `\n`, `\r`
//! or as pre-split lines; both shapes go through the same per-token path.
//! Malformed tokens are dropped silently and only aggregate counts are
//! observable. Batch parsing runs in chunks so callers can report
//! progress and cancel between chunks.

use crate::address::AddressValue;
use crate::cancel::CancelToken;
use crate::entry::{ReferenceEntry, SourceEntry};
use crate::error::{MatchError, ParseError, RangeFault};
use memchr::memchr3_iter;
use std::net::Ipv4Addr;

/// Tokens handed to the per-chunk progress callback at a time
///
/// Balances callback overhead against responsiveness; not a correctness
/// knob.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Aggregate counters for one batch parse
///
/// The only observable outcome of per-token failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-empty tokens encountered
    pub tokens_seen: usize,
    /// Tokens that parsed successfully
    pub parsed: usize,
    /// Tokens empty after trimming
    pub empty: usize,
    /// Tokens rejected as single addresses
    pub invalid_address: usize,
    /// Tokens rejected as CIDR expressions
    pub invalid_cidr: usize,
    /// Tokens rejected as ranges
    pub invalid_range: usize,
}

impl ParseStats {
    /// Total tokens dropped
    pub fn skipped(&self) -> usize {
        self.empty + self.invalid_address + self.invalid_cidr + self.invalid_range
    }

    fn record_error(&mut self, err: ParseError) {
        match err {
            ParseError::Empty => self.empty += 1,
            ParseError::InvalidAddress => self.invalid_address += 1,
            ParseError::InvalidCidr => self.invalid_cidr += 1,
            ParseError::InvalidRange(_) => self.invalid_range += 1,
        }
    }
}

/// Parse one token into a canonical value
///
/// Dispatch order matches the recognized shapes: anything containing `/`
/// is treated as CIDR; otherwise text with exactly one `-` is treated as
/// a range; everything else must be a single dotted-quad address. Text
/// with two or more hyphens deliberately falls through to single-address
/// parsing and is rejected there (`"1-2-3"` is not a range).
pub fn parse_token(text: &str) -> Result<AddressValue, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    if text.contains('/') {
        return parse_cidr(text);
    }
    if text.bytes().filter(|&b| b == b'-').count() == 1 {
        return parse_range(text);
    }
    parse_single(text)
}

fn parse_single(text: &str) -> Result<AddressValue, ParseError> {
    text.parse::<Ipv4Addr>()
        .map(|a| AddressValue::Single(a.into()))
        .map_err(|_| ParseError::InvalidAddress)
}

fn parse_cidr(text: &str) -> Result<AddressValue, ParseError> {
    let (addr_part, prefix_part) = text.split_once('/').ok_or(ParseError::InvalidCidr)?;
    let base: Ipv4Addr = addr_part.parse().map_err(|_| ParseError::InvalidCidr)?;
    if prefix_part.is_empty() || !prefix_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidCidr);
    }
    let prefix_len: u8 = prefix_part.parse().map_err(|_| ParseError::InvalidCidr)?;
    if prefix_len > 32 {
        return Err(ParseError::InvalidCidr);
    }
    // Host bits are cleared rather than rejected (non-strict CIDR)
    Ok(AddressValue::network(base.into(), prefix_len))
}

fn parse_range(text: &str) -> Result<AddressValue, ParseError> {
    let (start_part, end_part) = text.split_once('-').ok_or(ParseError::InvalidAddress)?;
    let start: Ipv4Addr = start_part
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidRange(RangeFault::Start))?;
    let end: Ipv4Addr = end_part
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidRange(RangeFault::End))?;
    let (start, end) = (u32::from(start), u32::from(end));
    if start > end {
        return Err(ParseError::InvalidRange(RangeFault::Inverted));
    }
    Ok(AddressValue::Range { start, end })
}

/// Split a blob on runs of `,`, `\n`, `\r`, dropping empty fields
///
/// Delimiters are all single-byte ASCII so slicing at their positions is
/// UTF-8 safe.
pub fn split_tokens(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0usize;
    for pos in memchr3_iter(b',', b'\n', b'\r', bytes) {
        if pos > start {
            let piece = text[start..pos].trim();
            if !piece.is_empty() {
                tokens.push(piece);
            }
        }
        start = pos + 1;
    }
    if start < bytes.len() {
        let piece = text[start..].trim();
        if !piece.is_empty() {
            tokens.push(piece);
        }
    }
    tokens
}

/// Parse a delimited blob into source entries, chunked
///
/// `progress` fires after every chunk with `(tokens_consumed, total)`;
/// the cancel token is checked before each chunk. Invalid tokens are
/// counted and dropped.
pub fn parse_batch(
    text: &str,
    chunk_size: usize,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
    cancel: Option<&CancelToken>,
) -> Result<(Vec<SourceEntry>, ParseStats), MatchError> {
    let chunk_size = chunk_size.max(1);
    let tokens = split_tokens(text);
    let total = tokens.len();

    let mut entries = Vec::with_capacity(total);
    let mut stats = ParseStats::default();

    for chunk in tokens.chunks(chunk_size) {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
        }
        for &raw in chunk {
            stats.tokens_seen += 1;
            match parse_token(raw) {
                Ok(value) => {
                    stats.parsed += 1;
                    entries.push(SourceEntry::new(value, raw));
                }
                Err(err) => stats.record_error(err),
            }
        }
        if let Some(cb) = progress.as_deref_mut() {
            let done = stats.tokens_seen.min(total);
            cb(done, total);
        }
    }

    Ok((entries, stats))
}

/// Parse a delimited blob without progress or cancellation
pub fn parse_text(text: &str) -> (Vec<SourceEntry>, ParseStats) {
    parse_batch(text, DEFAULT_CHUNK_SIZE, None, None)
        .expect("uncancellable parse cannot be cancelled")
}

/// Parse pre-split tokens (e.g. one per line from a file)
///
/// Same per-token path as blob parsing; each item may still contain
/// commas and is re-split.
pub fn parse_lines<I, S>(lines: I) -> (Vec<SourceEntry>, ParseStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries = Vec::new();
    let mut stats = ParseStats::default();
    for line in lines {
        for raw in split_tokens(line.as_ref()) {
            stats.tokens_seen += 1;
            match parse_token(raw) {
                Ok(value) => {
                    stats.parsed += 1;
                    entries.push(SourceEntry::new(value, raw));
                }
                Err(err) => stats.record_error(err),
            }
        }
    }
    (entries, stats)
}

/// Parse reference text: every token becomes a reference entry whose
/// name is the raw token and whose other metadata stays empty
pub fn parse_reference_text(text: &str) -> (Vec<ReferenceEntry>, ParseStats) {
    let mut entries = Vec::new();
    let mut stats = ParseStats::default();
    for raw in split_tokens(text) {
        stats.tokens_seen += 1;
        match parse_token(raw) {
            Ok(value) => {
                stats.parsed += 1;
                entries.push(ReferenceEntry::from_token(value, raw));
            }
            Err(err) => stats.record_error(err),
        }
    }
    (entries, stats)
}
