use std::ffi::CStr;
use std::os::fd::RawFd;

use super::Op;

/// Requests never describe more than `u32::MAX` bytes; longer slices are
/// offered partially, like any short read or write.
fn op_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

pub fn open(path: &CStr, flags: i32, mode: u32) -> Op {
    Op::Open {
        path: path.as_ptr(),
        flags,
        mode,
    }
}

pub fn read(fd: RawFd, buf: &mut [u8]) -> Op {
    Op::Read {
        fd,
        buf: buf.as_mut_ptr(),
        len: op_len(buf.len()),
    }
}

pub fn write(fd: RawFd, buf: &[u8]) -> Op {
    Op::Write {
        fd,
        buf: buf.as_ptr(),
        len: op_len(buf.len()),
    }
}

pub fn close(fd: RawFd) -> Op {
    Op::Close { fd }
}
