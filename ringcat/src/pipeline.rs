use std::ffi::CString;
use std::io::Write;
use std::mem;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use ringcat_reactor::{
    fs, Completion, CompletionHandler, EventLoop, LoopError, Op, OpKind, Submitter,
};

use crate::buffer::FixedBuffer;
use crate::error::CopyError;
use crate::request::Request;
use crate::state::{Action, CopyState, Event};

/// Default chunk capacity, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// CopyStats counts what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// completed reads, including the one that hit end-of-file
    pub reads: u64,
    pub writes: u64,
    /// bytes accepted by the output
    pub bytes: u64,
}

/// Pipeline copies one source file to an output descriptor, one chunk at a
/// time, with at most one request in flight.
///
/// It owns everything an in-flight request points at (the source path and
/// the buffer), and `W` receives one line per failure.
pub struct Pipeline<W> {
    path: Option<CString>,
    output: RawFd,
    state: CopyState,
    buffer: FixedBuffer,
    open_req: Request,
    read_req: Request,
    write_req: Request,
    outstanding: usize,
    stats: CopyStats,
    diagnostics: W,
}

impl<W: Write> Pipeline<W> {
    /// # Panics
    /// Panics if `chunk_size` is zero.
    pub fn new(path: impl AsRef<Path>, output: RawFd, chunk_size: usize, diagnostics: W) -> Self {
        // A path with an interior NUL cannot be opened; it fails at start.
        let path = CString::new(path.as_ref().as_os_str().as_bytes()).ok();

        Self {
            path,
            output,
            state: CopyState::Idle,
            buffer: FixedBuffer::with_capacity(chunk_size),
            open_req: Request::new(OpKind::Open),
            read_req: Request::new(OpKind::Read),
            write_req: Request::new(OpKind::Write),
            outstanding: 0,
            stats: CopyStats::default(),
            diagnostics,
        }
    }

    /// drive starts the copy and runs `ev` until nothing is pending.
    ///
    /// The pipeline stays borrowed for the whole run, which is what keeps
    /// the memory of every in-flight request alive.
    ///
    /// # Errors
    ///
    /// Returns the loop's error if it stops before draining. Requests it
    /// still holds keep pointing at the path and the buffer, so those are
    /// leaked and replaced before returning; the pipeline can then be
    /// dropped safely, but the copy is not resumable.
    pub fn drive(&mut self, ev: &mut dyn EventLoop) -> Result<(), LoopError> {
        self.start(&mut *ev);
        if let Err(err) = ev.run(&mut *self) {
            if ev.in_flight() > 0 {
                tracing::warn!(in_flight = ev.in_flight(), state = self.state.name(), "abandoning in-flight requests");
                self.abandon_in_flight();
            }
            return Err(err);
        }

        match self.outcome() {
            Some(Ok(stats)) => {
                tracing::info!(reads = stats.reads, writes = stats.writes, bytes = stats.bytes, "copy finished");
            }
            Some(Err(err)) => {
                tracing::debug!(phase = err.phase(), code = err.code(), "copy failed");
            }
            None => {
                tracing::warn!(state = self.state.name(), "event loop drained before the copy settled");
            }
        }

        Ok(())
    }

    /// abandon_in_flight gives up the memory a stalled loop may still write
    /// into or read from, replacing it with fresh copies.
    fn abandon_in_flight(&mut self) {
        let fresh = FixedBuffer::with_capacity(self.buffer.capacity());
        mem::forget(mem::replace(&mut self.buffer, fresh));

        if let Some(path) = self.path.take() {
            self.path = Some(path.clone());
            mem::forget(path);
        }
        self.outstanding = 0;
    }

    fn start(&mut self, submitter: &mut dyn Submitter) {
        if let Some(action) = self.accept(Event::Start) {
            self.apply(submitter, action);
        }
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    pub fn stats(&self) -> CopyStats {
        self.stats
    }

    pub fn buffer(&self) -> &FixedBuffer {
        &self.buffer
    }

    /// request returns the long-lived descriptor for `kind`. Close requests
    /// are fire-and-forget and have none.
    pub fn request(&self, kind: OpKind) -> Option<&Request> {
        match kind {
            OpKind::Open => Some(&self.open_req),
            OpKind::Read => Some(&self.read_req),
            OpKind::Write => Some(&self.write_req),
            OpKind::Close => None,
        }
    }

    fn request_mut(&mut self, kind: OpKind) -> Option<&mut Request> {
        match kind {
            OpKind::Open => Some(&mut self.open_req),
            OpKind::Read => Some(&mut self.read_req),
            OpKind::Write => Some(&mut self.write_req),
            OpKind::Close => None,
        }
    }

    /// outcome is `None` until the copy has settled. A copy counts as done
    /// once its close has been submitted.
    pub fn outcome(&self) -> Option<Result<CopyStats, CopyError>> {
        match self.state {
            CopyState::Failed(err) => Some(Err(err)),
            state if state.is_complete() => Some(Ok(self.stats)),
            _ => None,
        }
    }

    pub fn into_diagnostics(self) -> W {
        self.diagnostics
    }

    /// accept moves to the state `event` leads to and returns what to do
    /// next, or `None` when the event does not belong to the current phase.
    fn accept(&mut self, event: Event) -> Option<Action> {
        let (next, action) = self.state.advance(event);
        if action == Action::Ignore {
            tracing::warn!(state = self.state.name(), ?event, "ignoring out-of-phase event");
            return None;
        }

        tracing::trace!(from = self.state.name(), to = next.name(), ?action, "transition");
        self.state = next;
        Some(action)
    }

    fn apply(&mut self, submitter: &mut dyn Submitter, action: Action) {
        match action {
            Action::SubmitOpen => match self.path.as_deref() {
                Some(path) => {
                    let op = fs::open(path, libc::O_RDONLY | libc::O_CLOEXEC, 0);
                    self.submit(submitter, op);
                }
                None => self.fail(CopyError::Open(-libc::EINVAL)),
            },
            Action::SubmitRead(src) => {
                let op = fs::read(src.raw(), self.buffer.reset());
                self.submit(submitter, op);
            }
            Action::SubmitWrite(len) => {
                let op = fs::write(self.output, self.buffer.fill(len));
                self.submit(submitter, op);
            }
            Action::SubmitClose(src) => self.submit(submitter, fs::close(src.raw())),
            Action::Report(err) => self.report(err),
            Action::Nothing | Action::Ignore => {}
        }
    }

    fn submit(&mut self, submitter: &mut dyn Submitter, op: Op) {
        let kind = op.kind();
        debug_assert_eq!(self.outstanding, 0, "{kind} submitted while another request is pending");

        // # Safety: the path and the buffer belong to self, and `drive` keeps
        // self borrowed until the loop has delivered every completion. The
        // state machine never touches the buffer while this op is pending.
        match unsafe { submitter.submit(op) } {
            Ok(()) => {
                self.outstanding += 1;
                if let Some(req) = self.request_mut(kind) {
                    req.submitted();
                }
                tracing::debug!(op = %kind, "submitted");
            }
            Err(err) => {
                tracing::warn!(op = %kind, error = %err, "submission rejected");
                let code = err.errno();
                match kind {
                    OpKind::Open => self.fail(CopyError::Open(code)),
                    OpKind::Read => self.fail(CopyError::Read(code)),
                    OpKind::Write => self.fail(CopyError::Write(code)),
                    // Everything was copied already; only the handle leaks.
                    OpKind::Close => self.state = CopyState::Closed,
                }
            }
        }
    }

    fn fail(&mut self, err: CopyError) {
        self.state = CopyState::Failed(err);
        self.report(err);
    }

    fn report(&mut self, err: CopyError) {
        if let Err(io_err) = writeln!(self.diagnostics, "{err}") {
            tracing::warn!(error = %io_err, "failed to write diagnostic");
        }
    }

    fn record(&mut self, completion: Completion) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if let Some(req) = self.request_mut(completion.kind) {
            req.complete(completion.result);
        }

        let result = completion.result;
        match completion.kind {
            OpKind::Read if result >= 0 => self.stats.reads += 1,
            OpKind::Write if result >= 0 => {
                self.stats.writes += 1;
                self.stats.bytes += result as u64;

                let offered = self.buffer.len();
                if (result as usize) < offered {
                    tracing::debug!(written = result, offered, "short write");
                }
            }
            OpKind::Close if result < 0 => {
                tracing::warn!(error = %std::io::Error::from_raw_os_error(-result), "closing the source failed");
            }
            _ => {}
        }
    }
}

impl<W: Write> CompletionHandler for Pipeline<W> {
    fn on_complete(&mut self, submitter: &mut dyn Submitter, completion: Completion) {
        tracing::debug!(op = %completion.kind, result = completion.result, "completed");

        // An out-of-phase completion leaves the counters and requests alone.
        let Some(action) = self.accept(Event::from(completion)) else {
            return;
        };
        self.record(completion);
        self.apply(submitter, action);
    }
}
