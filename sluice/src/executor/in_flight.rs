//! In-flight submission counter.
//!
//! Counts submissions from acceptance until their result is published, and
//! carries the executor's closed flag. Both live behind one `watch` channel so
//! that accepting a submission and closing the executor are serialized: once
//! [`InFlight::close`] returns, no new entry can be created, and
//! [`InFlight::wait_idle`] observes every entry created before it.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct State {
    count: usize,
    closed: bool,
}

/// Shared counter of accepted, unpublished submissions.
#[derive(Debug)]
pub(crate) struct InFlight {
    state: watch::Sender<State>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(State::default());
        Self { state }
    }

    /// Registers one submission; `None` once the counter is closed.
    pub(crate) fn enter(&self) -> Option<InFlightEntry> {
        let accepted = self.state.send_if_modified(|state| {
            if state.closed {
                false
            } else {
                state.count += 1;
                true
            }
        });
        accepted.then(|| InFlightEntry {
            state: self.state.clone(),
        })
    }

    /// Rejects all future entries.
    pub(crate) fn close(&self) {
        self.state.send_modify(|state| state.closed = true);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub(crate) fn count(&self) -> usize {
        self.state.borrow().count
    }

    /// Resolves once no submission is in flight.
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| state.count == 0).await;
    }
}

/// Keeps one submission counted until dropped.
#[derive(Debug)]
pub(crate) struct InFlightEntry {
    state: watch::Sender<State>,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        self.state
            .send_modify(|state| state.count = state.count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_enter_and_exit() {
        let in_flight = InFlight::new();
        let a = in_flight.enter().unwrap();
        let b = in_flight.enter().unwrap();
        assert_eq!(in_flight.count(), 2);
        drop(a);
        assert_eq!(in_flight.count(), 1);
        drop(b);
        assert_eq!(in_flight.count(), 0);
    }

    #[test]
    fn test_close_rejects_new_entries() {
        let in_flight = InFlight::new();
        let held = in_flight.enter().unwrap();
        in_flight.close();
        assert!(in_flight.is_closed());
        assert!(in_flight.enter().is_none());
        assert_eq!(in_flight.count(), 1);
        drop(held);
        assert_eq!(in_flight.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_empty() {
        let in_flight = InFlight::new();
        tokio::time::timeout(Duration::from_millis(50), in_flight.wait_idle())
            .await
            .expect("idle counter should not block");
    }

    #[tokio::test]
    async fn test_wait_idle_waits_for_last_entry() {
        let in_flight = std::sync::Arc::new(InFlight::new());
        let entry = in_flight.enter().unwrap();

        let waiter = {
            let in_flight = std::sync::Arc::clone(&in_flight);
            tokio::spawn(async move { in_flight.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(entry);
        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }
}
