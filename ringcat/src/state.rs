//! The copy state machine.
//!
//! `CopyState::advance` is a pure transition function: given the current
//! phase and what just happened, it yields the next phase and the single
//! action the controller has to carry out. It never touches the buffer or
//! the event loop, which keeps every transition testable on its own.
//!
//! ```text
//! Idle -> Opening -> Failed | Reading
//! Reading -> Failed | Closing (EOF) | Writing
//! Writing -> Failed | Reading
//! Closing -> Closed
//! ```

use std::fmt;
use std::os::fd::RawFd;

use ringcat_reactor::{Completion, OpKind};

use crate::error::CopyError;

/// SourceHandle is the descriptor of the opened source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceHandle(RawFd);

impl SourceHandle {
    pub fn raw(self) -> RawFd {
        self.0
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyState {
    #[default]
    Idle,
    Opening,
    Reading(SourceHandle),
    Writing(SourceHandle),
    Closing,
    Closed,
    Failed(CopyError),
}

/// Event is the input of the state machine: the initial trigger or the
/// signed result of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Opened(i32),
    ReadDone(i32),
    Written(i32),
    Closed(i32),
}

impl From<Completion> for Event {
    fn from(completion: Completion) -> Self {
        match completion.kind {
            OpKind::Open => Self::Opened(completion.result),
            OpKind::Read => Self::ReadDone(completion.result),
            OpKind::Write => Self::Written(completion.result),
            OpKind::Close => Self::Closed(completion.result),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitOpen,
    /// read into the whole buffer
    SubmitRead(SourceHandle),
    /// write the first `len` bytes of the buffer
    SubmitWrite(usize),
    SubmitClose(SourceHandle),
    Report(CopyError),
    Nothing,
    /// the event does not belong to the current phase
    Ignore,
}

impl CopyState {
    pub fn advance(self, event: Event) -> (CopyState, Action) {
        match (self, event) {
            (Self::Idle, Event::Start) => (Self::Opening, Action::SubmitOpen),

            (Self::Opening, Event::Opened(res)) if res < 0 => {
                Self::fail(CopyError::Open(res))
            }
            (Self::Opening, Event::Opened(fd)) => {
                let src = SourceHandle(fd);
                (Self::Reading(src), Action::SubmitRead(src))
            }

            (Self::Reading(_), Event::ReadDone(res)) if res < 0 => {
                Self::fail(CopyError::Read(res))
            }
            (Self::Reading(src), Event::ReadDone(0)) => (Self::Closing, Action::SubmitClose(src)),
            (Self::Reading(src), Event::ReadDone(n)) => {
                (Self::Writing(src), Action::SubmitWrite(n as usize))
            }

            (Self::Writing(_), Event::Written(res)) if res < 0 => {
                Self::fail(CopyError::Write(res))
            }
            (Self::Writing(src), Event::Written(_)) => (Self::Reading(src), Action::SubmitRead(src)),

            // The outcome was settled when the close was submitted.
            (Self::Closing, Event::Closed(_)) => (Self::Closed, Action::Nothing),

            (state, _) => (state, Action::Ignore),
        }
    }

    fn fail(err: CopyError) -> (CopyState, Action) {
        (Self::Failed(err), Action::Report(err))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed(_))
    }

    /// is_complete reports whether the whole source has been copied. That
    /// is already true while the close is still in flight.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Reading(_) => "reading",
            Self::Writing(_) => "writing",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed(_) => "failed",
        }
    }
}
