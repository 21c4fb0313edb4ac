//! Bounding an unbounded wait with a timeout.
//!
//! [`watcher::await_change`](crate::watcher::await_change) never resolves if
//! nothing touches the file, so the long-poll handler races it against a
//! deadline to keep every `/watch` request finite.

use std::future::Future;
use std::time::Duration;

/// Outcome of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The operation completed before the deadline.
    Changed,
    /// The deadline elapsed first.
    TimedOut,
}

/// Race `operation` against a deadline; the first to finish wins.
///
/// The deadline elapsing is a *successful* outcome, not an error: the caller
/// of a long poll cannot distinguish "nothing changed" from "changed right at
/// the deadline" and is not meant to. An operation failure propagates only if
/// it happens before the deadline.
///
/// When the deadline wins, the losing operation is dropped, which disposes of
/// whatever resources it holds - for a file watch, the OS watch handle is
/// released instead of lingering until process exit.
pub async fn wait_bounded<F, E>(operation: F, timeout: Duration) -> Result<PollOutcome, E>
where
    F: Future<Output = Result<(), E>>,
{
    tokio::select! {
        res = operation => res.map(|()| PollOutcome::Changed),
        _ = tokio::time::sleep(timeout) => Ok(PollOutcome::TimedOut),
    }
}
