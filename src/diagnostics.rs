//! The diagnostics handle threaded through dataset and benchmark code.

use std::time::{Duration, Instant};

use tracing::Span;

/// Scopes log output to one participant of one run.
///
/// Every dataset and benchmark constructor takes one of these rather than
/// reaching for a global logger; events recorded while it is entered carry
/// the participant's rank.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    span: Span,
    rank: usize,
    peers: usize,
    start: Instant,
}

impl Diagnostics {
    pub fn new(rank: usize, peers: usize) -> Self {
        Diagnostics {
            span: tracing::info_span!("dynograph", rank),
            rank,
            peers,
            start: Instant::now(),
        }
    }

    /// Diagnostics for a single-process run.
    pub fn single() -> Self {
        Self::new(0, 1)
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn peers(&self) -> usize {
        self.peers
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == 0
    }

    /// Time since the handle was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Runs `f` with this participant's span entered.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}
