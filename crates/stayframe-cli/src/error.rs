//! CLI error types.

use std::{io, path::PathBuf};

use stayframe_host::BindingError;
use thiserror::Error;

/// Errors that stop a replay.
#[derive(Debug, Error)]
pub enum CliError {
    /// The trace file could not be read.
    #[error("failed to read trace {path}: {source}")]
    ReadTrace {
        /// Path given on the command line.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The trace is not valid JSON or does not match the trace format.
    #[error("invalid trace: {0}")]
    ParseTrace(#[from] serde_json::Error),

    /// Events must be recorded in time order.
    #[error("event {index} at {at_ms} ms precedes the previous event at {previous_ms} ms")]
    OutOfOrder {
        /// Position in the trace.
        index: usize,
        /// Offending timestamp.
        at_ms: u64,
        /// Timestamp of the event before it.
        previous_ms: u64,
    },

    /// A modal event names an action the host modal does not have.
    #[error("event {index}: unknown modal action {action:?}")]
    UnknownModalAction {
        /// Position in the trace.
        index: usize,
        /// The unknown `data-action` value.
        action: String,
    },

    /// The recorded host configuration was rejected.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// Writing replayed actions failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// Returns true if the trace itself is at fault, as opposed to the
    /// environment the replay runs in.
    pub fn is_trace_error(&self) -> bool {
        match self {
            Self::ParseTrace(_) | Self::OutOfOrder { .. } | Self::UnknownModalAction { .. } => true,
            Self::Binding(e) => e.is_config(),
            Self::ReadTrace { .. } | Self::Output(_) => false,
        }
    }
}
