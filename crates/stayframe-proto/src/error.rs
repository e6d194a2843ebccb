//! Transport error types.

use thiserror::Error;

/// Reasons a received value is not acted on.
///
/// None of these are fatal. Receivers log them and keep their last known
/// good state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Sender origin is not in the receiver's allow-list.
    #[error("origin not allowed: {origin}")]
    DisallowedOrigin {
        /// The rejected origin.
        origin: String,
    },

    /// The value is not an envelope at all.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with it.
        reason: String,
    },

    /// Envelope `type` is not part of the protocol.
    #[error("unrecognized message type: {kind}")]
    UnknownType {
        /// The received type string.
        kind: String,
    },

    /// A recognised message carried an unusable payload.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload {
        /// Wire type of the message.
        kind: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A height that is not a finite positive number.
    #[error("invalid height in {kind}: {raw}")]
    InvalidHeight {
        /// Wire type of the message.
        kind: &'static str,
        /// The offending value as received.
        raw: String,
    },

    /// An allow-list entry that is not a valid tuple origin.
    #[error("invalid origin in allow-list: {origin}")]
    InvalidOrigin {
        /// The rejected entry.
        origin: String,
    },
}

impl TransportError {
    /// Returns true for measurement errors (bad height values).
    ///
    /// Measurement errors are worth a warning; unknown types are routine on
    /// a busy host page that receives messages from other widgets.
    pub fn is_measurement(&self) -> bool {
        matches!(self, Self::InvalidHeight { .. })
    }

    /// Returns true if the value was simply not addressed to us.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::UnknownType { .. } | Self::MalformedEnvelope { .. })
    }
}
