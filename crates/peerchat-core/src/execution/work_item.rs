//! Queued units of work
//!
//! A work item bundles a callback (with whatever state it captured), its
//! submission mode and, for blocking submissions, the one-shot completion
//! signal the submitter is parked on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::oneshot;

use super::StatsCounters;
use crate::errors::ExecutionError;
use crate::types::SubmissionMode;

/// Completion signal of a blocking submission
pub(crate) type Completion<R> = oneshot::Sender<Result<R, ExecutionError>>;

/// Type-erased body of a work item
trait Dispatch: Send {
    /// Run the callback, record the outcome in `stats`, then fire the
    /// completion signal, if any
    ///
    /// Returns the fault when the callback panicked.
    fn dispatch(self: Box<Self>, stats: &StatsCounters) -> Result<(), ExecutionError>;

    /// Drop the callback unrun, failing a waiting submitter with `reason`
    fn abandon(self: Box<Self>, reason: ExecutionError);
}

struct AsyncBody<F> {
    callback: F,
}

impl<F> Dispatch for AsyncBody<F>
where
    F: FnOnce() + Send,
{
    fn dispatch(self: Box<Self>, stats: &StatsCounters) -> Result<(), ExecutionError> {
        let callback = self.callback;
        let outcome = panic::catch_unwind(AssertUnwindSafe(callback)).map_err(fault_from_panic);
        stats.record(outcome.is_ok());
        outcome
    }

    fn abandon(self: Box<Self>, _reason: ExecutionError) {}
}

struct BlockingBody<F, R> {
    callback: F,
    completion: Completion<R>,
}

impl<F, R> Dispatch for BlockingBody<F, R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    fn dispatch(self: Box<Self>, stats: &StatsCounters) -> Result<(), ExecutionError> {
        let BlockingBody {
            callback,
            completion,
        } = *self;

        let outcome = panic::catch_unwind(AssertUnwindSafe(callback)).map_err(fault_from_panic);
        let fault = outcome.as_ref().err().cloned();
        // Counted before the submitter wakes, so stats() on return includes this item.
        stats.record(fault.is_none());

        // The submitter may have gone away (async waiter dropped); nothing to do then.
        let _ = completion.send(outcome);

        match fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn abandon(self: Box<Self>, reason: ExecutionError) {
        let _ = self.completion.send(Err(reason));
    }
}

// ----------------------------------------------------------------------------
// Work Item
// ----------------------------------------------------------------------------

/// A single queued callback
pub(crate) struct WorkItem {
    seq: u64,
    mode: SubmissionMode,
    body: Box<dyn Dispatch>,
}

impl WorkItem {
    /// Fire-and-forget item
    pub(crate) fn fire_and_forget<F>(seq: u64, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            seq,
            mode: SubmissionMode::Async,
            body: Box::new(AsyncBody { callback }),
        }
    }

    /// Item whose outcome is delivered through `completion`
    pub(crate) fn blocking<F, R>(seq: u64, callback: F, completion: Completion<R>) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        Self {
            seq,
            mode: SubmissionMode::Blocking,
            body: Box::new(BlockingBody {
                callback,
                completion,
            }),
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn mode(&self) -> SubmissionMode {
        self.mode
    }

    /// Execute the item; panics are caught and reported as `Fault`
    pub(crate) fn dispatch(self, stats: &StatsCounters) -> Result<(), ExecutionError> {
        self.body.dispatch(stats)
    }

    /// Discard the item without running it
    pub(crate) fn abandon(self, reason: ExecutionError) {
        self.body.abandon(reason)
    }
}

fn fault_from_panic(payload: Box<dyn Any + Send>) -> ExecutionError {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    ExecutionError::Fault { message }
}
