#![cfg(target_os = "linux")]

extern crate libc;

use io_uring::{opcode, IoUring, Probe};
use std::io;

use crate::error::{InitError, LoopError, RequestError};
use crate::{Completion, CompletionHandler, EventLoop, OpKind, Op, Submitter};

/// Reactor drives requests through an io_uring instance.
pub struct Reactor {
    ring: IoUring,
    in_flight: usize,
}

impl Reactor {
    pub fn new(entries: u32) -> Result<Self, InitError> {
        let ring = IoUring::new(entries).map_err(InitError::Ring)?;

        let mut probe = Probe::new();
        ring.submitter()
            .register_probe(&mut probe)
            .map_err(InitError::Probe)?;

        for (code, name) in [
            (opcode::OpenAt::CODE, "openat"),
            (opcode::Read::CODE, "read"),
            (opcode::Write::CODE, "write"),
            (opcode::Close::CODE, "close"),
        ] {
            if !probe.is_supported(code) {
                return Err(InitError::Unsupported(name));
            }
        }

        tracing::debug!(entries, "io_uring reactor ready");

        Ok(Self { ring, in_flight: 0 })
    }

    fn flush_submissions(&mut self, want: usize) -> io::Result<()> {
        loop {
            if let Err(err) = self.ring.submit_and_wait(want) {
                match err.raw_os_error() {
                    Some(libc::EINTR) => {
                        continue;
                    }
                    // The completion queue is full; it will be reaped by
                    // flush_completions, so submit again without waiting.
                    Some(libc::EBUSY) | Some(libc::EAGAIN) if want > 0 => {
                        return self.flush_submissions(0);
                    }
                    _ => {
                        return Err(err);
                    }
                }
            }

            return Ok(());
        }
    }

    fn flush_completions(&mut self) -> Vec<Completion> {
        let mut collected = Vec::new();

        for cqe in self.ring.completion() {
            match OpKind::from_user_data(cqe.user_data()) {
                Some(kind) => collected.push(Completion {
                    kind,
                    result: cqe.result(),
                }),
                None => {
                    tracing::warn!(user_data = cqe.user_data(), "dropping untagged completion");
                }
            }
        }

        self.in_flight -= collected.len();
        collected
    }
}

impl Submitter for Reactor {
    /// submit pushes the op's entry onto the submission queue. The entry
    /// reaches the kernel on the next [EventLoop::run].
    ///
    /// # Safety
    /// It needs to be ensured the the memory referred by the op lives at
    /// least for as long as the request is in the ring.
    unsafe fn submit(&mut self, op: Op) -> Result<(), RequestError> {
        let entry = op.entry();

        self.ring
            .submission()
            .push(&entry)
            .map_err(|_| RequestError::Push)?;

        self.in_flight += 1;
        tracing::trace!(kind = %op.kind(), in_flight = self.in_flight, "queued request");

        Ok(())
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl EventLoop for Reactor {
    fn run(&mut self, handler: &mut dyn CompletionHandler) -> Result<(), LoopError> {
        while self.in_flight > 0 {
            self.flush_submissions(1)?;

            // Handlers may submit follow-ups, so the completion queue is
            // drained before any of them runs.
            for completion in self.flush_completions() {
                tracing::trace!(kind = %completion.kind, result = completion.result, "completed request");
                handler.on_complete(&mut *self, completion);
            }
        }

        Ok(())
    }
}
