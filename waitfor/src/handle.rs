//! Observable result of a single `fire` call
//!
//! A [`PollHandle`] is how the caller learns what happened to a polling
//! cycle. Timeouts are delivered here as [`WaitForError::Timeout`] instead of
//! escaping from inside the timer task.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Terminal state of a polling cycle that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The resolver passed and the action was invoked
    Succeeded,
    /// The timeout elapsed with `silent` set; the action was never invoked
    Abandoned,
    /// The cycle was stopped by `cancel`, `abort`, or a newer `fire`
    Cancelled,
}

/// Handle to one polling cycle
///
/// Dropping the handle does not stop polling.
#[derive(Debug)]
pub struct PollHandle {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    /// Resolved without a timer
    Ready(Result<Outcome>),
    /// A timer task owns the cycle
    Polling {
        outcome_rx: oneshot::Receiver<Result<Outcome>>,
        task: JoinHandle<()>,
    },
}

impl PollHandle {
    pub(crate) fn ready(result: Result<Outcome>) -> Self {
        Self {
            inner: Inner::Ready(result),
        }
    }

    pub(crate) fn polling(outcome_rx: oneshot::Receiver<Result<Outcome>>, task: JoinHandle<()>) -> Self {
        Self {
            inner: Inner::Polling { outcome_rx, task },
        }
    }

    /// Check if the cycle has reached a terminal state
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Ready(_) => true,
            Inner::Polling { task, .. } => task.is_finished(),
        }
    }

    /// Stop this cycle; `outcome` then resolves to [`Outcome::Cancelled`]
    ///
    /// The poller's state follows once the runtime drops the task.
    pub fn abort(&self) {
        if let Inner::Polling { task, .. } = &self.inner {
            task.abort();
        }
    }

    /// Wait for the cycle to finish
    ///
    /// Returns `Err(WaitForError::Timeout)` when the timeout elapsed and the
    /// options were not silent. A panic raised by the resolver or the action
    /// inside the timer task is resumed here.
    pub async fn outcome(self) -> Result<Outcome> {
        match self.inner {
            Inner::Ready(result) => result,
            Inner::Polling { outcome_rx, task } => match outcome_rx.await {
                Ok(result) => result,
                // Sender dropped without a result: the task was aborted or panicked
                Err(_) => match task.await {
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    _ => Ok(Outcome::Cancelled),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaitForError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ready_handle() {
        let handle = PollHandle::ready(Ok(Outcome::Succeeded));
        assert!(handle.is_finished());
        handle.abort();
        assert_eq!(handle.outcome().await.unwrap(), Outcome::Succeeded);
    }

    #[tokio::test]
    async fn test_polling_handle_delivers_error() {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = tx.send(Err(WaitForError::Timeout {
                elapsed: Duration::from_millis(5),
            }));
        });

        let error = PollHandle::polling(rx, task).outcome().await.unwrap_err();
        assert!(error.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_handle_is_cancelled() {
        let (tx, rx) = oneshot::channel::<Result<Outcome>>();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = tx.send(Ok(Outcome::Succeeded));
        });

        let handle = PollHandle::polling(rx, task);
        assert!(!handle.is_finished());
        handle.abort();
        assert_eq!(handle.outcome().await.unwrap(), Outcome::Cancelled);
    }

    #[tokio::test]
    #[should_panic(expected = "action exploded")]
    async fn test_panic_in_task_is_resumed() {
        let (tx, rx) = oneshot::channel::<Result<Outcome>>();
        let task = tokio::spawn(async move {
            let _tx = tx;
            panic!("action exploded");
        });

        let _ = PollHandle::polling(rx, task).outcome().await;
    }
}
