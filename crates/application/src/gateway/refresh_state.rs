//! Single-flight refresh bookkeeping.

use tokio::sync::oneshot;

use super::GatewayError;

/// Token handed to queued requests when the refresh succeeded. The session
/// lives in cookies, so the value itself carries no credentials.
pub const REFRESHED: &str = "refreshed";

/// Outcome delivered to every queued request.
pub type RefreshOutcome = Result<&'static str, GatewayError>;

/// A caller parked behind an in-flight refresh.
///
/// Resolving or rejecting consumes the entry, so each one settles exactly
/// once.
#[derive(Debug)]
pub struct PendingRequest {
    tx: oneshot::Sender<RefreshOutcome>,
}

impl PendingRequest {
    /// Creates an entry and the receiver its caller waits on.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<RefreshOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Wakes the caller with the refreshed token.
    pub fn resolve(self, token: &'static str) {
        // The receiver is gone if the caller timed out; nothing to do then.
        let _ = self.tx.send(Ok(token));
    }

    /// Wakes the caller with the refresh failure.
    pub fn reject(self, error: GatewayError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Whether a `401` made the caller the refresh leader or put it in line.
#[derive(Debug)]
pub(crate) enum Admission {
    /// No refresh was running; the caller must perform it.
    Leader,
    /// A refresh is running; wait on the receiver.
    Queued(oneshot::Receiver<RefreshOutcome>),
}

/// Refresh flag plus the ordered queue of waiting callers.
///
/// Invariants: the queue is only non-empty while `is_refreshing` is set,
/// and settling drains the whole queue before the flag resets.
#[derive(Debug, Default)]
pub struct RefreshState {
    is_refreshing: bool,
    queue: Vec<PendingRequest>,
}

impl RefreshState {
    /// Creates an idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            is_refreshing: false,
            queue: Vec::new(),
        }
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.is_refreshing
    }

    /// Number of callers waiting on the refresh.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Takes the refresh slot or queues behind the current holder.
    pub(crate) fn admit(&mut self) -> Admission {
        if self.is_refreshing {
            let (entry, rx) = PendingRequest::new();
            self.queue.push(entry);
            Admission::Queued(rx)
        } else {
            self.is_refreshing = true;
            Admission::Leader
        }
    }

    /// Delivers the outcome to every queued caller in arrival order, then
    /// releases the refresh slot.
    pub(crate) fn settle(&mut self, outcome: &RefreshOutcome) {
        for entry in self.queue.drain(..) {
            match outcome {
                Ok(token) => entry.resolve(token),
                Err(error) => entry.reject(error.clone()),
            }
        }
        self.is_refreshing = false;
    }

    /// Point-in-time view for diagnostics and tests.
    #[must_use]
    pub fn snapshot(&self) -> RefreshSnapshot {
        RefreshSnapshot {
            is_refreshing: self.is_refreshing,
            pending: self.queue.len(),
        }
    }
}

/// Copy of the refresh state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSnapshot {
    /// A refresh is in flight.
    pub is_refreshing: bool,
    /// Callers waiting on it.
    pub pending: usize,
}
