//! Copies one file to an already-open descriptor through a completion-driven
//! event loop.
//!
//! The loop itself lives in `ringcat-reactor`; this crate holds the copy
//! state machine ([state]), the controller that drives it ([pipeline]) and the
//! ambient pieces the binary needs.

pub mod buffer;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod state;
pub mod telemetry;

pub use buffer::FixedBuffer;
pub use error::CopyError;
pub use pipeline::{CopyStats, Pipeline, DEFAULT_CHUNK_SIZE};
pub use request::Request;
pub use state::{Action, CopyState, Event, SourceHandle};
