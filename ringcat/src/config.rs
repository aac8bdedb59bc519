//! Command-line configuration. Every flag has an environment fallback.

use std::path::PathBuf;

use clap::Parser;
use ringcat_reactor::Backend;

use crate::error::CopyError;
use crate::pipeline::{CopyStats, DEFAULT_CHUNK_SIZE};
use crate::telemetry::{LogFormat, LoggingConfig, DEFAULT_LOG_LEVEL};

const DEFAULT_RING_ENTRIES: u32 = 8;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ringcat",
    version,
    about = "Copy a file to standard output with completion-driven I/O"
)]
pub struct Config {
    /// File to copy.
    pub path: PathBuf,

    /// Exit with status 1 when the copy fails. Without it failures are only
    /// reported on stderr and the exit status stays 0.
    #[arg(long, env = "RINGCAT_STRICT")]
    pub strict: bool,

    /// Bytes moved per read/write cycle.
    #[arg(long, env = "RINGCAT_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Event loop backend: auto, uring or blocking.
    #[arg(long, env = "RINGCAT_BACKEND", default_value_t = Backend::Auto)]
    pub backend: Backend,

    /// Submission queue size of the io_uring backend.
    #[arg(long, env = "RINGCAT_RING_ENTRIES", default_value_t = DEFAULT_RING_ENTRIES, value_parser = clap::value_parser!(u32).range(1..))]
    pub ring_entries: u32,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, env = "RINGCAT_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[arg(long, env = "RINGCAT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn logging(&self) -> LoggingConfig<'_> {
        LoggingConfig {
            level: &self.log_level,
            format: self.log_format,
        }
    }

    /// exit_status maps the outcome of a run onto the process exit status.
    /// Failures only count in strict mode.
    pub fn exit_status(&self, outcome: Option<Result<CopyStats, CopyError>>) -> u8 {
        match outcome {
            Some(Ok(_)) => 0,
            _ if !self.strict => 0,
            _ => 1,
        }
    }
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1 byte".to_string()),
        Ok(n) => Ok(n),
        Err(err) => Err(err.to_string()),
    }
}
