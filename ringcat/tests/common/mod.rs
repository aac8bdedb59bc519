#![allow(dead_code)]

use std::collections::VecDeque;

use ringcat_reactor::{
    Completion, CompletionHandler, EventLoop, LoopError, Op, OpKind, RequestError, Submitter,
};

pub const FAKE_FD: i32 = 42;

/// ScriptedLoop serves an in-memory source and records everything the
/// pipeline asks of it. Faults are injected by position.
#[derive(Default)]
pub struct ScriptedLoop {
    source: Vec<u8>,
    pos: usize,
    pending: VecDeque<Op>,

    /// open completes with this code instead of a descriptor
    pub open_error: Option<i32>,
    /// the read following this many data-carrying reads fails with EIO
    pub fail_read_after: Option<usize>,
    /// the write with this index (0-based) fails with EPIPE
    pub fail_write_at: Option<usize>,
    /// submissions of this kind are rejected
    pub reject: Option<OpKind>,
    /// delivered right after the completion with this index (0-based),
    /// without a matching submission
    pub stray: Option<(usize, Completion)>,
    /// run fails once this many completions have been delivered, leaving the
    /// rest pending
    pub fail_run_after: Option<usize>,

    pub submitted: Vec<OpKind>,
    pub delivered: Vec<Completion>,
    pub writes: Vec<Vec<u8>>,
    data_reads: usize,
    pub max_in_flight: usize,
    /// set if completed writes ever overtook completed reads, or reads ran
    /// more than one chunk ahead
    pub sequencing_violated: bool,
}

impl ScriptedLoop {
    pub fn new(source: impl Into<Vec<u8>>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn copied(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// pending_memory returns the address each queued op points at.
    pub fn pending_memory(&self) -> Vec<usize> {
        self.pending
            .iter()
            .map(|op| match *op {
                Op::Open { path, .. } => path as usize,
                Op::Read { buf, .. } => buf as usize,
                Op::Write { buf, .. } => buf as usize,
                Op::Close { .. } => 0,
            })
            .collect()
    }

    fn complete(&mut self, op: Op) -> i32 {
        match op {
            Op::Open { .. } => self.open_error.unwrap_or(FAKE_FD),
            Op::Read { fd, buf, len } => {
                assert_eq!(fd, FAKE_FD, "read from a descriptor that was never opened");
                if self.fail_read_after == Some(self.data_reads) {
                    return -libc::EIO;
                }

                let n = (len as usize).min(self.source.len() - self.pos);
                unsafe {
                    std::ptr::copy_nonoverlapping(self.source[self.pos..].as_ptr(), buf, n);
                }
                self.pos += n;
                if n > 0 {
                    self.data_reads += 1;
                }
                n as i32
            }
            Op::Write { buf, len, .. } => {
                if self.fail_write_at == Some(self.writes.len()) {
                    return -libc::EPIPE;
                }

                let chunk = unsafe { std::slice::from_raw_parts(buf, len as usize) };
                self.writes.push(chunk.to_vec());
                len as i32
            }
            Op::Close { fd } => {
                assert_eq!(fd, FAKE_FD);
                0
            }
        }
    }

    fn check_sequencing(&mut self) {
        let count = |kind| {
            self.delivered
                .iter()
                .filter(|c| c.kind == kind && c.result >= 0)
                .count() as i64
        };
        let diff = count(OpKind::Read) - count(OpKind::Write);
        if !(0..=1).contains(&diff) {
            self.sequencing_violated = true;
        }
    }
}

impl Submitter for ScriptedLoop {
    unsafe fn submit(&mut self, op: Op) -> Result<(), RequestError> {
        if self.reject == Some(op.kind()) {
            return Err(RequestError::Push);
        }

        self.submitted.push(op.kind());
        self.pending.push_back(op);
        self.max_in_flight = self.max_in_flight.max(self.pending.len());
        Ok(())
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl EventLoop for ScriptedLoop {
    fn run(&mut self, handler: &mut dyn CompletionHandler) -> Result<(), LoopError> {
        loop {
            if self.fail_run_after == Some(self.delivered.len()) {
                return Err(LoopError::Io(std::io::Error::from_raw_os_error(libc::EIO)));
            }
            let Some(op) = self.pending.pop_front() else {
                break;
            };

            let completion = Completion {
                kind: op.kind(),
                result: self.complete(op),
            };
            self.delivered.push(completion);
            self.check_sequencing();
            handler.on_complete(&mut *self, completion);

            if let Some((at, stray)) = self.stray {
                if at + 1 == self.delivered.len() {
                    handler.on_complete(&mut *self, stray);
                }
            }
        }
        Ok(())
    }
}

/// pattern returns `len` bytes that differ from chunk to chunk.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
