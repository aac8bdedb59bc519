//! Blocking fallback for kernels (or sandboxes) without io_uring.
//!
//! Submissions are queued and executed with plain syscalls inside `run`, in
//! the order they were submitted. From the handler's point of view nothing
//! changes: each request still completes exactly once with a result or
//! `-errno`.

use std::collections::VecDeque;

use crate::error::{LoopError, RequestError};
use crate::{Completion, CompletionHandler, EventLoop, Op, Submitter};

#[derive(Debug, Default)]
pub struct BlockingLoop {
    pending: VecDeque<Op>,
}

impl BlockingLoop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Submitter for BlockingLoop {
    /// # Safety
    /// The memory referred by the op must stay valid until the op has been
    /// executed by [EventLoop::run].
    unsafe fn submit(&mut self, op: Op) -> Result<(), RequestError> {
        tracing::trace!(kind = %op.kind(), "queued blocking request");
        self.pending.push_back(op);
        Ok(())
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl EventLoop for BlockingLoop {
    fn run(&mut self, handler: &mut dyn CompletionHandler) -> Result<(), LoopError> {
        while let Some(op) = self.pending.pop_front() {
            // # Safety: submit's contract keeps the op's memory alive until
            // this point.
            let result = unsafe { op.run_blocking() };
            let completion = Completion {
                kind: op.kind(),
                result,
            };

            tracing::trace!(kind = %completion.kind, result, "completed blocking request");
            handler.on_complete(&mut *self, completion);
        }

        Ok(())
    }
}
