#![cfg(target_os = "linux")]
pub mod blocking;
pub mod error;
pub mod iouring;
mod ops;
pub use ops::*;

extern crate libc;

use std::fmt;
use std::str::FromStr;

pub use blocking::BlockingLoop;
pub use error::{InitError, LoopError, RequestError};
pub use iouring::Reactor;

/// Submitter accepts requests without waiting for them.
pub trait Submitter {
    /// submit queues `op`; its completion is delivered by a later
    /// [EventLoop::run].
    ///
    /// # Safety
    /// It needs to be ensured that the memory referred by the op (paths and
    /// buffers) lives, and is not touched by anyone else, until the op's
    /// completion has been delivered.
    unsafe fn submit(&mut self, op: Op) -> Result<(), RequestError>;

    /// in_flight returns the number of requests submitted but not yet
    /// delivered.
    fn in_flight(&self) -> usize;
}

/// CompletionHandler receives completions on the loop thread, one at a time.
/// It can submit follow-up requests through `submitter`.
pub trait CompletionHandler {
    fn on_complete(&mut self, submitter: &mut dyn Submitter, completion: Completion);
}

pub trait EventLoop: Submitter {
    /// run blocks until no submitted request is pending, invoking `handler`
    /// exactly once per request, in completion order.
    fn run(&mut self, handler: &mut dyn CompletionHandler) -> Result<(), LoopError>;
}

/// Backend chooses which event loop drives the requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// io_uring, falling back to blocking syscalls when the ring is not
    /// available.
    #[default]
    Auto,
    Uring,
    Blocking,
}

impl Backend {
    /// build constructs the event loop for this backend.
    pub fn build(self, entries: u32) -> Result<Box<dyn EventLoop>, InitError> {
        match self {
            Self::Uring => Ok(Box::new(Reactor::new(entries)?)),
            Self::Blocking => Ok(Box::new(BlockingLoop::new())),
            Self::Auto => match Reactor::new(entries) {
                Ok(reactor) => Ok(Box::new(reactor)),
                Err(err) => {
                    // stderr carries the copy diagnostics, so this stays below warn
                    tracing::info!(error = %err, "io_uring unavailable, using blocking syscalls");
                    Ok(Box::new(BlockingLoop::new()))
                }
            },
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Uring => "uring",
            Self::Blocking => "blocking",
        })
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "uring" | "io_uring" => Ok(Self::Uring),
            "blocking" => Ok(Self::Blocking),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}
