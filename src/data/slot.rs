//! Observable value slots with issue-order conflict resolution.
//!
//! Each channel owns one [`Slot`]. Every refresh takes a sequence number from
//! the slot before it goes out, and hands it back together with the result.
//! A value is only applied if it was issued after the value currently held,
//! so a slow response can never overwrite a newer one. Once a slot is
//! closed it rejects every result, which is how teardown guarantees nothing
//! lands after it returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::FetchError;

/// What happened when a result was handed to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The value was replaced.
    Replaced,
    /// The failure was recorded; the value was kept.
    Failed,
    /// A newer result was already applied; this one was discarded.
    Stale,
    /// The slot was closed; the result was discarded.
    Closed,
}

/// Point-in-time view of a slot.
#[derive(Debug)]
pub struct SlotState<T> {
    /// Last accepted payload, `None` until the first success.
    pub value: Option<Arc<T>>,
    /// Sequence number of the request that produced `value`.
    pub value_seq: u64,
    /// Failure of the most recently issued request that failed, if it was
    /// issued after `value`.
    pub last_error: Option<FetchError>,
    /// Sequence number of the request that produced `last_error`.
    pub error_seq: u64,
    /// Set by [`Slot::close`]; no result is applied afterwards.
    pub closed: bool,
}

impl<T> SlotState<T> {
    /// True when the latest issued request that resolved has failed.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }
}

impl<T> Default for SlotState<T> {
    fn default() -> Self {
        Self {
            value: None,
            value_seq: 0,
            last_error: None,
            error_seq: 0,
            closed: false,
        }
    }
}

impl<T> Clone for SlotState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            value_seq: self.value_seq,
            last_error: self.last_error.clone(),
            error_seq: self.error_seq,
            closed: self.closed,
        }
    }
}

/// A single-writer, many-reader value cell.
///
/// Readers subscribe through a watch channel and see whole values only.
#[derive(Debug)]
pub struct Slot<T> {
    issued: AtomicU64,
    state: watch::Sender<SlotState<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Slot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SlotState::default());
        Self {
            issued: AtomicU64::new(0),
            state,
        }
    }

    /// Reserve the next sequence number for an outgoing request.
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply the result of request `seq`.
    ///
    /// A success replaces the value if `seq` is newer than the held value and
    /// clears any older error. A failure is recorded only if `seq` is newer
    /// than both the held value and the held error. Subscribers are notified
    /// only when something changed. A closed slot rejects everything; the
    /// check and the write happen under the same lock as [`close`](Self::close).
    pub fn apply(&self, seq: u64, result: &Result<Arc<T>, FetchError>) -> Applied {
        let mut outcome = Applied::Stale;

        self.state.send_if_modified(|state| match result {
            _ if state.closed => {
                outcome = Applied::Closed;
                false
            }
            Ok(value) => {
                if seq <= state.value_seq {
                    return false;
                }
                state.value = Some(Arc::clone(value));
                state.value_seq = seq;
                if state.error_seq < seq {
                    state.last_error = None;
                }
                outcome = Applied::Replaced;
                true
            }
            Err(error) => {
                if seq <= state.value_seq || seq <= state.error_seq {
                    return false;
                }
                state.last_error = Some(error.clone());
                state.error_seq = seq;
                outcome = Applied::Failed;
                true
            }
        });

        outcome
    }

    /// Stop accepting results. Idempotent.
    ///
    /// Once this returns, no in-flight [`apply`](Self::apply) can still
    /// write: either it finished before, or it will see the flag.
    pub fn close(&self) {
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.closed, true));
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Subscribe to changes.
    pub fn subscribe(&self) -> watch::Receiver<SlotState<T>> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SlotState<T> {
        self.state.borrow().clone()
    }

    /// Current value, if any.
    pub fn value(&self) -> Option<Arc<T>> {
        self.state.borrow().value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(v: &str) -> Result<Arc<String>, FetchError> {
        Ok(Arc::new(v.to_string()))
    }

    #[test]
    fn test_new_slot_is_empty() {
        let slot: Slot<String> = Slot::new();
        let state = slot.snapshot();
        assert!(state.value.is_none());
        assert!(state.last_error.is_none());
        assert!(!state.closed);
    }

    #[test]
    fn test_issue_is_monotonic() {
        let slot: Slot<String> = Slot::new();
        assert_eq!(slot.issue(), 1);
        assert_eq!(slot.issue(), 2);
        assert_eq!(slot.issue(), 3);
    }

    #[test]
    fn test_success_replaces_value() {
        let slot = Slot::new();
        let first = slot.issue();
        assert_eq!(slot.apply(first, &ok("a")), Applied::Replaced);
        let second = slot.issue();
        assert_eq!(slot.apply(second, &ok("b")), Applied::Replaced);
        assert_eq!(slot.value().as_deref().map(String::as_str), Some("b"));
        assert_eq!(slot.snapshot().value_seq, second);
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let slot = Slot::new();
        let first = slot.issue();
        slot.apply(first, &ok("good"));

        let second = slot.issue();
        let outcome = slot.apply(second, &Err(FetchError::Network("refused".into())));
        assert_eq!(outcome, Applied::Failed);

        let state = slot.snapshot();
        assert_eq!(state.value(), Some(&"good".to_string()));
        assert!(state.is_stale());
        assert_eq!(state.last_error, Some(FetchError::Network("refused".into())));
    }

    #[test]
    fn test_newer_success_clears_error() {
        let slot = Slot::new();
        let failed = slot.issue();
        slot.apply(failed, &Err(FetchError::Protocol(500)));
        let next = slot.issue();
        slot.apply(next, &ok("fresh"));
        assert!(!slot.snapshot().is_stale());
    }

    #[test]
    fn test_older_result_is_discarded() {
        let slot = Slot::new();
        let older = slot.issue();
        let newer = slot.issue();

        assert_eq!(slot.apply(newer, &ok("newer")), Applied::Replaced);
        assert_eq!(slot.apply(older, &ok("older")), Applied::Stale);
        assert_eq!(slot.value().as_deref().map(String::as_str), Some("newer"));
    }

    #[test]
    fn test_older_failure_does_not_mark_newer_value_stale() {
        let slot = Slot::new();
        let older = slot.issue();
        let newer = slot.issue();

        slot.apply(newer, &ok("newer"));
        assert_eq!(slot.apply(older, &Err(FetchError::Protocol(502))), Applied::Stale);
        assert!(!slot.snapshot().is_stale());
    }

    #[test]
    fn test_older_success_after_newer_failure_keeps_error() {
        let slot = Slot::new();
        let older = slot.issue();
        let newer = slot.issue();

        slot.apply(newer, &Err(FetchError::Decode("bad".into())));
        assert_eq!(slot.apply(older, &ok("late")), Applied::Replaced);

        let state = slot.snapshot();
        assert_eq!(state.value(), Some(&"late".to_string()));
        assert!(state.is_stale());
    }

    #[test]
    fn test_subscribers_notified_only_on_change() {
        let slot = Slot::new();
        let mut rx = slot.subscribe();
        assert!(!rx.has_changed().unwrap());

        let seq = slot.issue();
        slot.apply(seq, &ok("x"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // Replaying the same sequence number is a no-op.
        slot.apply(seq, &ok("again"));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_closed_slot_rejects_results() {
        let slot = Slot::new();
        let first = slot.issue();
        slot.apply(first, &ok("kept"));

        let late = slot.issue();
        slot.close();
        slot.close();
        assert!(slot.is_closed());

        assert_eq!(slot.apply(late, &ok("late")), Applied::Closed);
        assert_eq!(slot.apply(late, &Err(FetchError::Protocol(500))), Applied::Closed);

        let state = slot.snapshot();
        assert_eq!(state.value(), Some(&"kept".to_string()));
        assert_eq!(state.value_seq, first);
        assert!(state.last_error.is_none());
    }
}
