//! Copies real files through the real event loops.

mod common;

use std::fs::{self, File};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::path::Path;

use common::pattern;
use proptest::prelude::*;
use ringcat::{CopyError, CopyStats, Pipeline};
use ringcat_reactor::{BlockingLoop, EventLoop, Reactor};

const CAP: usize = 64;

fn write_source(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("source.bin");
    let mut file = File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

/// copy_file copies `source` into a fresh file and returns its contents with
/// the outcome and diagnostics.
fn copy_file(
    ev: &mut dyn EventLoop,
    source: &Path,
    cap: usize,
) -> (Vec<u8>, Option<Result<CopyStats, CopyError>>, String) {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.bin");
    let out = File::create(&out_path).unwrap();

    let mut pipeline = Pipeline::new(source, out.as_raw_fd(), cap, Vec::new());
    pipeline.drive(ev).unwrap();
    drop(out);

    let outcome = pipeline.outcome();
    let diag = String::from_utf8(pipeline.into_diagnostics()).unwrap();
    (fs::read(&out_path).unwrap(), outcome, diag)
}

fn reactor() -> Option<Reactor> {
    match Reactor::new(8) {
        Ok(reactor) => Some(reactor),
        Err(err) => {
            eprintln!("skipping io_uring test: {err}");
            None
        }
    }
}

#[test]
fn blocking_loop_round_trips_boundary_sizes() {
    let dir = tempfile::tempdir().unwrap();

    for size in [0, 1, CAP - 1, CAP, CAP + 1, 7 * CAP] {
        let bytes = pattern(size);
        let source = write_source(dir.path(), &bytes);

        let (copied, outcome, diag) = copy_file(&mut BlockingLoop::new(), &source, CAP);
        assert_eq!(copied, bytes, "size {size}");
        let stats = outcome.unwrap().unwrap();
        assert_eq!(stats.writes, size.div_ceil(CAP) as u64);
        assert_eq!(stats.bytes, size as u64);
        assert!(diag.is_empty());
    }
}

#[test]
fn io_uring_round_trips_boundary_sizes() {
    let Some(mut reactor) = reactor() else { return };
    let dir = tempfile::tempdir().unwrap();

    for size in [0, 1, CAP - 1, CAP, CAP + 1, 7 * CAP] {
        let bytes = pattern(size);
        let source = write_source(dir.path(), &bytes);

        let (copied, outcome, _) = copy_file(&mut reactor, &source, CAP);
        assert_eq!(copied, bytes, "size {size}");
        assert_eq!(outcome.unwrap().unwrap().writes, size.div_ceil(CAP) as u64);
    }
}

#[test]
fn missing_source_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let (copied, outcome, diag) = copy_file(&mut BlockingLoop::new(), &missing, CAP);
    assert!(copied.is_empty());
    assert_eq!(outcome, Some(Err(CopyError::Open(-libc::ENOENT))));
    assert_eq!(diag.lines().count(), 1);
    assert!(diag.starts_with("Open error: "), "{diag}");
}

#[test]
fn directory_source_fails_on_first_read() {
    let dir = tempfile::tempdir().unwrap();

    let (copied, outcome, diag) = copy_file(&mut BlockingLoop::new(), dir.path(), CAP);
    assert!(copied.is_empty());
    assert_eq!(outcome, Some(Err(CopyError::Read(-libc::EISDIR))));
    assert!(diag.starts_with("Read error: "), "{diag}");
}

#[test]
fn unwritable_output_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), &pattern(3 * CAP));
    let read_only = File::open(&source).unwrap();

    let mut pipeline = Pipeline::new(&source, read_only.as_raw_fd(), CAP, Vec::new());
    pipeline.drive(&mut BlockingLoop::new()).unwrap();

    assert_eq!(
        pipeline.outcome(),
        Some(Err(CopyError::Write(-libc::EBADF)))
    );
    assert_eq!(pipeline.stats().writes, 0);
    let diag = String::from_utf8(pipeline.into_diagnostics()).unwrap();
    assert!(diag.starts_with("Write error: "), "{diag}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_file_round_trips(bytes in proptest::collection::vec(any::<u8>(), 0..2048), cap in 1usize..300) {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), &bytes);

        let (copied, outcome, _) = copy_file(&mut BlockingLoop::new(), &source, cap);
        prop_assert_eq!(&copied, &bytes);

        let stats = outcome.unwrap().unwrap();
        prop_assert_eq!(stats.writes, bytes.len().div_ceil(cap) as u64);
        prop_assert_eq!(stats.reads, stats.writes + 1);
    }
}
