//! Embedded app error types.

use stayframe_proto::TransportError;
use thiserror::Error;

/// Errors from setting up the embedded app.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration could not be parsed.
    #[error("invalid embed configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// Origin allow-list rejected an entry.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<serde_json::Error> for EmbedError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config { reason: e.to_string() }
    }
}
