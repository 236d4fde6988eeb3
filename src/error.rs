/// Error types for the ipmatch library
use std::fmt;

/// Why a range token failed to parse
///
/// Retained for diagnostics: parse statistics distinguish a malformed
/// endpoint from an inverted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFault {
    /// The text before the hyphen is not a valid IPv4 address
    Start,
    /// The text after the hyphen is not a valid IPv4 address
    End,
    /// Both endpoints parsed, but start > end
    Inverted,
}

/// Per-token parse failure
///
/// These are recovered locally by batch parsing: the offending token is
/// dropped and counted, never surfaced individually to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Token was empty after trimming
    Empty,
    /// Token is not a valid dotted-quad IPv4 address
    InvalidAddress,
    /// Token contains `/` but is not a valid CIDR expression
    InvalidCidr,
    /// Token contains exactly one `-` but is not a valid range
    InvalidRange(RangeFault),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty token"),
            ParseError::InvalidAddress => write!(f, "invalid IPv4 address"),
            ParseError::InvalidCidr => write!(f, "invalid CIDR expression"),
            ParseError::InvalidRange(RangeFault::Start) => {
                write!(f, "invalid range: bad start address")
            }
            ParseError::InvalidRange(RangeFault::End) => {
                write!(f, "invalid range: bad end address")
            }
            ParseError::InvalidRange(RangeFault::Inverted) => {
                write!(f, "invalid range: start is greater than end")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors from a match run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The run was aborted through its cancel token
    Cancelled,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::Cancelled => write!(f, "match run cancelled"),
        }
    }
}

impl std::error::Error for MatchError {}
