//! Freshness and debounce bookkeeping for fetches.
//!
//! The gate holds the fetch-related state only; the waiting itself happens in
//! `TaskStore::request_fetch`. Time is read from `tokio::time::Instant` so the
//! window and the debounce follow the runtime clock (and pause with it in
//! tests).

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default window after a successful fetch in which plain requests are skipped.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_millis(5000);

/// Default quiet period that collapses bursts of fetch requests.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A debounce wait handed to one caller.
#[derive(Debug, Clone)]
pub struct ArmedDebounce {
    /// Sequence number of this arm
    pub ticket: u64,

    /// Cancelled when a later request supersedes this one
    pub token: CancellationToken,
}

/// Fetch gating state.
#[derive(Debug)]
pub struct FreshnessGate {
    freshness_window: Duration,

    /// When the last successful fetch finished (runtime clock)
    last_fetched: Option<Instant>,

    /// Same moment in wall-clock time, for display
    last_fetched_at: Option<DateTime<Utc>>,

    /// The currently armed debounce, if any
    pending: Option<ArmedDebounce>,

    /// Sequence counter for arms
    next_ticket: u64,

    /// A remote read is running
    in_flight: bool,
}

impl Default for FreshnessGate {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

impl FreshnessGate {
    /// Create a gate with the given freshness window.
    pub fn new(freshness_window: Duration) -> Self {
        FreshnessGate {
            freshness_window,
            last_fetched: None,
            last_fetched_at: None,
            pending: None,
            next_ticket: 0,
            in_flight: false,
        }
    }

    /// Returns true if the last successful fetch is inside the window.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.last_fetched
            .map_or(false, |at| now.saturating_duration_since(at) < self.freshness_window)
    }

    /// Wall-clock time of the last successful fetch.
    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    /// Returns true if a debounce wait is armed.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true if a remote read is running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Cancel any armed debounce and arm a new one.
    pub fn arm(&mut self) -> ArmedDebounce {
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
        }
        self.next_ticket += 1;
        let armed = ArmedDebounce {
            ticket: self.next_ticket,
            token: CancellationToken::new(),
        };
        self.pending = Some(armed.clone());
        armed
    }

    /// Clear the armed debounce if it is still the given one.
    pub fn disarm(&mut self, ticket: u64) {
        if self.pending.as_ref().map_or(false, |p| p.ticket == ticket) {
            self.pending = None;
        }
    }

    /// Claim the single in-flight slot. Returns false if it is taken.
    pub fn begin_fetch(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the in-flight slot, recording the time on success.
    pub fn finish_fetch(&mut self, succeeded: bool) {
        self.in_flight = false;
        if succeeded {
            self.last_fetched = Some(Instant::now());
            self.last_fetched_at = Some(Utc::now());
        }
    }

    /// Forget the last successful fetch so the next request goes out.
    pub fn invalidate(&mut self) {
        self.last_fetched = None;
        self.last_fetched_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window() {
        let mut gate = FreshnessGate::default();
        assert!(!gate.is_fresh(Instant::now()));

        assert!(gate.begin_fetch());
        gate.finish_fetch(true);
        assert!(gate.is_fresh(Instant::now()));
        assert!(gate.last_fetched_at().is_some());

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(gate.is_fresh(Instant::now()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!gate.is_fresh(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_does_not_refresh() {
        let mut gate = FreshnessGate::default();

        assert!(gate.begin_fetch());
        gate.finish_fetch(false);
        assert!(!gate.is_fresh(Instant::now()));
        assert!(!gate.is_in_flight());
    }

    #[test]
    fn test_arm_cancels_previous() {
        let mut gate = FreshnessGate::default();

        let first = gate.arm();
        let second = gate.arm();
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());

        gate.disarm(first.ticket);
        assert!(gate.is_armed());
        gate.disarm(second.ticket);
        assert!(!gate.is_armed());
    }

    #[test]
    fn test_single_in_flight_slot() {
        let mut gate = FreshnessGate::default();

        assert!(gate.begin_fetch());
        assert!(!gate.begin_fetch());
        gate.finish_fetch(true);
        assert!(gate.begin_fetch());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let mut gate = FreshnessGate::default();
        gate.begin_fetch();
        gate.finish_fetch(true);

        gate.invalidate();
        assert!(!gate.is_fresh(Instant::now()));
        assert!(gate.last_fetched_at().is_none());
    }
}
