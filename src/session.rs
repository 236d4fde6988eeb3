//! Worker-thread boundary around parse, index, and match
//!
//! The engine itself is synchronous; this module runs one full
//! parse -> index -> match pass on a dedicated worker thread and streams
//! progress back over a channel, so an interactive caller never blocks.
//! The index and result vector are built entirely on the worker and
//! published once on completion (immutable handoff, no locks). One
//! session is one run; callers wanting another run spawn another session.

use crate::cancel::CancelToken;
use crate::engine::{run_match, MatchOptions, MatchResult};
use crate::entry::{ReferenceEntry, SourceEntry};
use crate::error::MatchError;
use crate::index::ReferenceIndex;
use crate::parser::{self, ParseStats, DEFAULT_CHUNK_SIZE};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Source side of a run: a raw delimited blob or pre-parsed entries
pub enum SourceInput {
    /// Raw text, parsed on the worker with progress events
    Text(String),
    /// Already-parsed entries
    Entries(Vec<SourceEntry>),
}

/// Reference side of a run: a raw blob or pre-built entries
/// (e.g. from the tabular loader)
pub enum ReferenceInput {
    /// Raw text; every token becomes a name-only reference entry
    Text(String),
    /// Already-built entries with metadata
    Entries(Vec<ReferenceEntry>),
}

/// Everything one run needs
pub struct SessionRequest {
    /// Source entries or text
    pub source: SourceInput,
    /// Reference entries or text
    pub reference: ReferenceInput,
    /// Parser chunk size; 0 means the default
    pub chunk_size: usize,
    /// Engine progress cadence; 0 means the default
    pub progress_interval: usize,
}

/// Events published by the worker, in order
///
/// Progress events are emitted from the worker thread; receivers are
/// responsible for marshaling to their own execution context.
#[derive(Debug)]
pub enum SessionEvent {
    /// Source tokens consumed so far out of the total
    ParseProgress {
        /// Tokens consumed
        done: usize,
        /// Total tokens
        total: usize,
    },
    /// Source entries matched so far out of the total
    MatchProgress {
        /// Entries matched
        done: usize,
        /// Total entries
        total: usize,
    },
    /// The run finished; terminal event
    Completed(MatchOutcome),
    /// The run was cancelled; terminal event
    Cancelled,
}

/// Published result of a completed run
#[derive(Debug)]
pub struct MatchOutcome {
    /// Per-source match results
    pub results: Vec<MatchResult>,
    /// The reference entries the result indices point into
    pub references: Vec<ReferenceEntry>,
    /// Source parse counters (zeroed when entries were supplied pre-parsed)
    pub source_stats: ParseStats,
    /// Reference parse counters (zeroed when entries were supplied pre-built)
    pub reference_stats: ParseStats,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl MatchOutcome {
    /// Sources with at least one overlap
    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_matched()).count()
    }
}

/// Handle to one in-flight run
pub struct MatchSession {
    events: Receiver<SessionEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl MatchSession {
    /// Spawn a run with a fresh cancel token
    pub fn spawn(request: SessionRequest) -> MatchSession {
        Self::spawn_with_token(request, CancelToken::new())
    }

    /// Spawn a run sharing an externally held cancel token
    ///
    /// Lets callers wire the token to a signal handler before the worker
    /// starts.
    pub fn spawn_with_token(request: SessionRequest, cancel: CancelToken) -> MatchSession {
        let (tx, rx) = unbounded();
        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || run_session(request, worker_cancel, tx));
        MatchSession {
            events: rx,
            cancel,
            handle: Some(handle),
        }
    }

    /// Event stream for this run
    pub fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Token shared with the worker
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation of the in-flight run
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the run finishes, discarding progress events
    pub fn wait(mut self) -> Result<MatchOutcome, MatchError> {
        let outcome = loop {
            match self.events.recv() {
                Ok(SessionEvent::Completed(outcome)) => break Ok(outcome),
                Ok(SessionEvent::Cancelled) => break Err(MatchError::Cancelled),
                Ok(_) => continue,
                // Worker gone without a terminal event: it panicked
                Err(_) => break Err(MatchError::Cancelled),
            }
        };
        if let Some(handle) = self.handle.take() {
            handle.join().expect("session worker panicked");
        }
        outcome
    }
}

fn run_session(request: SessionRequest, cancel: CancelToken, tx: Sender<SessionEvent>) {
    let started = Instant::now();
    let chunk_size = if request.chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        request.chunk_size
    };

    // Sends are fire-and-forget: a dropped receiver must not stall the
    // worker, and an unbounded channel never blocks the hot loop
    let (sources, source_stats) = match request.source {
        SourceInput::Entries(entries) => (entries, ParseStats::default()),
        SourceInput::Text(text) => {
            let progress_tx = tx.clone();
            let mut on_parse = move |done: usize, total: usize| {
                let _ = progress_tx.send(SessionEvent::ParseProgress { done, total });
            };
            match parser::parse_batch(&text, chunk_size, Some(&mut on_parse), Some(&cancel)) {
                Ok(parsed) => parsed,
                Err(MatchError::Cancelled) => {
                    let _ = tx.send(SessionEvent::Cancelled);
                    return;
                }
            }
        }
    };

    let (references, reference_stats) = match request.reference {
        ReferenceInput::Entries(entries) => (entries, ParseStats::default()),
        ReferenceInput::Text(text) => parser::parse_reference_text(&text),
    };

    let index = ReferenceIndex::build(&references);
    let progress_tx = tx.clone();
    let mut on_match = move |done: usize, total: usize| {
        let _ = progress_tx.send(SessionEvent::MatchProgress { done, total });
    };
    let options = MatchOptions {
        progress: Some(&mut on_match),
        cancel: Some(&cancel),
        progress_interval: request.progress_interval,
    };

    match run_match(&sources, &index, options) {
        Ok(results) => {
            let _ = tx.send(SessionEvent::Completed(MatchOutcome {
                results,
                references,
                source_stats,
                reference_stats,
                elapsed: started.elapsed(),
            }));
        }
        Err(MatchError::Cancelled) => {
            let _ = tx.send(SessionEvent::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str, reference: &str) -> SessionRequest {
        SessionRequest {
            source: SourceInput::Text(source.to_string()),
            reference: ReferenceInput::Text(reference.to_string()),
            chunk_size: 0,
            progress_interval: 0,
        }
    }

    #[test]
    fn test_session_completes_with_results() {
        let session = MatchSession::spawn(request(
            "10.0.0.5\n8.8.8.8",
            "10.0.0.0/24\n192.168.0.0/16",
        ));
        let outcome = session.wait().unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].is_matched());
        assert!(!outcome.results[1].is_matched());
        assert_eq!(outcome.matched_count(), 1);
        assert_eq!(outcome.source_stats.parsed, 2);
        assert_eq!(outcome.reference_stats.parsed, 2);
    }

    #[test]
    fn test_session_emits_progress_then_completion() {
        let session = MatchSession::spawn(request("1.1.1.1,2.2.2.2,3.3.3.3", "1.0.0.0/8"));
        let mut saw_match_progress = false;
        let mut completed = false;
        for event in session.events().iter() {
            match event {
                SessionEvent::MatchProgress { done, total } => {
                    assert!(done <= total);
                    saw_match_progress = true;
                }
                SessionEvent::ParseProgress { done, total } => assert!(done <= total),
                SessionEvent::Completed(outcome) => {
                    assert_eq!(outcome.results.len(), 3);
                    completed = true;
                    break;
                }
                SessionEvent::Cancelled => panic!("unexpected cancellation"),
            }
        }
        assert!(saw_match_progress);
        assert!(completed);
    }

    #[test]
    fn test_pre_cancelled_token_aborts_the_run() {
        let token = CancelToken::new();
        token.cancel();
        let session =
            MatchSession::spawn_with_token(request("1.1.1.1,2.2.2.2", "1.0.0.0/8"), token);
        assert_eq!(session.wait().unwrap_err(), MatchError::Cancelled);
    }

    #[test]
    fn test_pre_built_reference_entries_pass_through() {
        let (references, _) = crate::parser::parse_reference_text("10.0.0.0/8");
        let session = MatchSession::spawn(SessionRequest {
            source: SourceInput::Text("10.1.2.3".to_string()),
            reference: ReferenceInput::Entries(references),
            chunk_size: 0,
            progress_interval: 0,
        });
        let outcome = session.wait().unwrap();
        assert_eq!(outcome.results[0].matched_names(&outcome.references), vec![
            "10.0.0.0/8"
        ]);
        assert_eq!(outcome.reference_stats, ParseStats::default());
    }
}
