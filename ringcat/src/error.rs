use std::io;

use thiserror::Error;

/// Terminal failures of a copy. Each wraps the negative error code the event
/// loop delivered; `Display` is the one-line diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CopyError {
    #[error("Open error: {}", describe(.0))]
    Open(i32),
    #[error("Read error: {}", describe(.0))]
    Read(i32),
    #[error("Write error: {}", describe(.0))]
    Write(i32),
}

impl CopyError {
    pub fn code(&self) -> i32 {
        match *self {
            Self::Open(code) | Self::Read(code) | Self::Write(code) => code,
        }
    }

    pub fn phase(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
        }
    }
}

fn describe(code: &i32) -> io::Error {
    io::Error::from_raw_os_error(code.saturating_neg())
}
