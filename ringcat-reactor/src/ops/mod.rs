pub mod fs;

use std::fmt;
use std::os::fd::RawFd;

use libc::c_char;

/// OpKind tags every request and its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Open,
    Read,
    Write,
    Close,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
            Self::Close => "close",
        }
    }

    /// user_data is the tag carried through the ring. Zero is left unused so
    /// that an untagged entry is never mistaken for a request.
    pub(crate) fn user_data(self) -> u64 {
        match self {
            Self::Open => 1,
            Self::Read => 2,
            Self::Write => 3,
            Self::Close => 4,
        }
    }

    pub(crate) fn from_user_data(udata: u64) -> Option<Self> {
        match udata {
            1 => Some(Self::Open),
            2 => Some(Self::Read),
            3 => Some(Self::Write),
            4 => Some(Self::Close),
            _ => None,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Op is a single asynchronous request handed to an event loop.
///
/// The pointers refer to memory owned by whoever built the op. See
/// [crate::Submitter::submit] for how long that memory has to stay put.
#[derive(Debug, Clone, Copy)]
pub enum Op {
    Open {
        path: *const c_char,
        flags: i32,
        mode: u32,
    },
    Read {
        fd: RawFd,
        buf: *mut u8,
        len: u32,
    },
    Write {
        fd: RawFd,
        buf: *const u8,
        len: u32,
    },
    Close {
        fd: RawFd,
    },
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Open { .. } => OpKind::Open,
            Self::Read { .. } => OpKind::Read,
            Self::Write { .. } => OpKind::Write,
            Self::Close { .. } => OpKind::Close,
        }
    }

    /// entry builds the io_uring submission entry for this op, tagged with
    /// its kind.
    pub(crate) fn entry(&self) -> io_uring::squeue::Entry {
        use io_uring::{opcode, types};

        let entry = match *self {
            Self::Open { path, flags, mode } => {
                opcode::OpenAt::new(types::Fd(libc::AT_FDCWD), path)
                    .flags(flags)
                    .mode(mode)
                    .build()
            }
            // Kernel will cast the offset to loff_t which is signed => -1,
            // so reads and writes follow the file position.
            Self::Read { fd, buf, len } => opcode::Read::new(types::Fd(fd), buf, len)
                .offset(u64::MAX)
                .build(),
            Self::Write { fd, buf, len } => opcode::Write::new(types::Fd(fd), buf, len)
                .offset(u64::MAX)
                .build(),
            Self::Close { fd } => opcode::Close::new(types::Fd(fd)).build(),
        };

        entry.user_data(self.kind().user_data())
    }

    /// run_blocking performs the op with the matching blocking syscall and
    /// returns what a ring completion would carry: the result, or `-errno`.
    ///
    /// # Safety
    /// The pointers in the op must be valid for the duration of the call.
    pub(crate) unsafe fn run_blocking(&self) -> i32 {
        let res = match *self {
            Self::Open { path, flags, mode } => {
                libc::open(path, flags, mode as libc::c_uint) as isize
            }
            Self::Read { fd, buf, len } => libc::read(fd, buf as *mut _, len as usize),
            Self::Write { fd, buf, len } => libc::write(fd, buf as *const _, len as usize),
            Self::Close { fd } => libc::close(fd) as isize,
        };

        if res < 0 {
            -std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(libc::EIO)
        } else {
            res as i32
        }
    }
}

/// Completion is what the event loop hands back once an op is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub kind: OpKind,
    /// non-negative byte count or descriptor, or a negative error code
    pub result: i32,
}
