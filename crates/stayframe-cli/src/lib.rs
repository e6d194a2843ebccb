//! Replay tooling for Stayframe host page traces.
//!
//! A recorded trace (the events one host page delivered to its booking
//! iframe binding) is replayed against a fresh [`stayframe_host::EmbedBinding`]
//! and every resulting host action is written as a JSON line. Replays run in
//! virtual time by default and in wall-clock time on request.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod replay;
pub mod system_env;
pub mod trace;

pub use error::CliError;
pub use replay::{ReplaySummary, replay};
pub use system_env::SystemEnv;
pub use trace::{RecordedEvent, Trace, TraceEntry};
