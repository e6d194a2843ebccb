//! Stayframe wire protocol.
//!
//! Every message exchanged between the embedded booking app and its host
//! page travels as a JSON envelope `{type, data?, source?}` through
//! `postMessage`. This crate owns that envelope, the typed [`Message`] set
//! and the origin discipline both sides follow.
//!
//! # Receiving
//!
//! Receivers never act on a raw value. They call [`decode`] with the sender
//! origin and their own [`OriginAllowList`]; anything that is not a
//! recognised message from an allowed origin comes back as a
//! [`TransportError`] which the caller logs and drops.
//!
//! # Components
//!
//! - [`TransportMessage`]: raw serde envelope
//! - [`Message`]: typed message set, wire-exact type names
//! - [`OriginAllowList`]: normalised origin allow-list, fails closed
//! - [`EmbedParams`]: query parameters carried by the iframe `src`
//! - [`TransportError`]: classification of everything a receiver drops

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod error;
mod message;
mod origin;
mod params;

pub use envelope::TransportMessage;
pub use error::TransportError;
pub use message::{
    BookingSummary, GuestDetails, HeightSource, HeightUpdated, Message, ModalKind, RequestHeight,
};
pub use origin::OriginAllowList;
pub use params::EmbedParams;
use serde_json::Value;

/// Decode a message received from `origin`.
///
/// The origin check runs before the payload is looked at, so a disallowed
/// sender never reaches payload parsing.
pub fn decode(
    origin: &str,
    raw: &Value,
    allowed: &OriginAllowList,
) -> Result<Message, TransportError> {
    if !allowed.allows(origin) {
        return Err(TransportError::DisallowedOrigin { origin: origin.to_string() });
    }

    let envelope = TransportMessage::from_value(raw)?;
    Message::from_envelope(&envelope)
}

/// Encode a message into the JSON value handed to `postMessage`.
pub fn encode(message: &Message) -> Value {
    message.to_envelope().into_value()
}
