use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ringcat::config::Config;
use ringcat::{telemetry, Pipeline};

fn main() -> Result<ExitCode> {
    let config = Config::parse();
    telemetry::init_logging(&config.logging())?;

    let mut ev = config
        .backend
        .build(config.ring_entries)
        .context("failed to set up the event loop")?;

    let mut pipeline = Pipeline::new(
        &config.path,
        libc::STDOUT_FILENO,
        config.chunk_size,
        io::stderr(),
    );
    pipeline
        .drive(ev.as_mut())
        .context("event loop failed")?;

    Ok(ExitCode::from(config.exit_status(pipeline.outcome())))
}
