use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to initialize the ring: {0}")]
    Ring(#[source] io::Error),
    #[error("failed to probe the ring: {0}")]
    Probe(#[source] io::Error),
    #[error("kernel does not support the {0} opcode")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to submit request to IO Uring")]
    Push,
}

impl RequestError {
    /// errno returns the negative error code a rejected request is reported
    /// with, the same shape a completion carries.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Push => -libc::EAGAIN,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("failed to drive the ring: {0}")]
    Io(#[from] io::Error),
}
