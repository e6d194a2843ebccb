//! Host binding error types.

use stayframe_proto::TransportError;
use thiserror::Error;

/// Errors from setting up or configuring a host binding.
///
/// Runtime input never produces these: inbound messages that cannot be used
/// are logged and dropped inside the binding.
#[derive(Debug, Error)]
pub enum BindingError {
    /// Host configuration could not be parsed.
    #[error("invalid host configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },

    /// Origin allow-list rejected an entry.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The iframe `src` base is not a usable URL.
    #[error("invalid embed URL {url}: {reason}")]
    EmbedUrl {
        /// The rejected URL.
        url: String,
        /// Description of the problem.
        reason: String,
    },
}

impl BindingError {
    /// Returns true if the error comes from host-supplied configuration
    /// rather than the protocol layer.
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config { .. } | Self::EmbedUrl { .. } => true,
            Self::Transport(e) => matches!(e, TransportError::InvalidOrigin { .. }),
        }
    }
}

impl From<serde_json::Error> for BindingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_origin_is_config() {
        let err = BindingError::from(TransportError::InvalidOrigin { origin: "nope".to_string() });
        assert!(err.is_config());
    }

    #[test]
    fn embed_url_display() {
        let err = BindingError::EmbedUrl {
            url: "book".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert_eq!(err.to_string(), "invalid embed URL book: relative URL without a base");
    }
}
