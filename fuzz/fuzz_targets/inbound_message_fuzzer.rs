//! Fuzz target for the inbound message decoder
//!
//! Every `message` event a host or embedded window receives goes through
//! [`stayframe_proto::decode`]. Anything on the page can post to those
//! windows, so the decoder sees attacker-controlled data.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input parsed as JSON, reaching `decode` whenever it
//!   is valid JSON
//! - Shaped values: envelopes built from known `type` names with fuzzed
//!   `height`, `source` and `data` fields
//! - Origins: allowed origins, near misses (scheme, port, trailing path) and
//!   garbage strings
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Disallowed origins are rejected before the payload is looked at
//! - Decoded heights are finite and positive
//! - Re-encoding a decoded message decodes to the same message

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value, json};
use stayframe_proto::{Message, OriginAllowList, TransportError, decode, encode};

const ALLOWED: [&str; 2] = ["https://book.stayframe.io", "https://widget.stayframe.io"];

const TYPES: [&str; 15] = [
    "iframe-height",
    "request-height",
    "height-updated",
    "content-visibility-change",
    "window-resize",
    "resize",
    "startHeightTracking",
    "OPEN_GUEST_MODAL",
    "OPEN_PAYMENT_MODAL",
    "OPEN_CONFIRMATION_MODAL",
    "GUEST_DETAILS_SUBMITTED",
    "GO_BACK_TO_GUEST_DETAILS",
    "MAKE_ANOTHER_BOOKING",
    "MODAL_CLOSED",
    "CLOSE_MODAL",
];

const SOURCES: [&str; 8] = [
    "postMessage",
    "iframe-message",
    "initial-load",
    "state-change",
    "resize-adjustment",
    "external-api",
    "scroll-related",
    "booking-app",
];

#[derive(Debug, Arbitrary)]
enum FuzzOrigin {
    Allowed(bool),
    HttpScheme,
    WithPort(u16),
    WithPath,
    Other(String),
}

impl FuzzOrigin {
    fn render(&self) -> String {
        match self {
            Self::Allowed(first) => ALLOWED[usize::from(!*first)].to_string(),
            Self::HttpScheme => "http://book.stayframe.io".to_string(),
            Self::WithPort(port) => format!("https://book.stayframe.io:{port}"),
            Self::WithPath => "https://book.stayframe.io/embed".to_string(),
            Self::Other(s) => s.clone(),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl FuzzNumber {
    fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => json!(n),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Null => Value::Null,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct ShapedMessage {
    kind: u8,
    height: Option<FuzzNumber>,
    source: Option<u8>,
    nested: bool,
    data_fields: Vec<(String, FuzzNumber)>,
}

impl ShapedMessage {
    fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("type".into(), json!(TYPES[usize::from(self.kind) % TYPES.len()]));

        let mut data = Map::new();
        for (key, value) in &self.data_fields {
            data.insert(key.clone(), value.to_value());
        }
        if let Some(height) = &self.height {
            let target = if self.nested { &mut data } else { &mut fields };
            target.insert("height".into(), height.to_value());
        }
        if let Some(source) = self.source {
            fields.insert("source".into(), json!(SOURCES[usize::from(source) % SOURCES.len()]));
        }
        if !data.is_empty() {
            fields.insert("data".into(), Value::Object(data));
        }
        Value::Object(fields)
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzPayload {
    Raw(Vec<u8>),
    Shaped(ShapedMessage),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    origin: FuzzOrigin,
    payload: FuzzPayload,
}

fn check_height(height: f64) {
    assert!(height.is_finite() && height > 0.0, "decoded invalid height {height}");
}

fuzz_target!(|input: FuzzInput| {
    let Ok(allowed) = OriginAllowList::new(ALLOWED) else {
        return;
    };

    let value = match &input.payload {
        FuzzPayload::Raw(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => value,
            Err(_) => return,
        },
        FuzzPayload::Shaped(shaped) => shaped.to_value(),
    };
    let origin = input.origin.render();

    match decode(&origin, &value, &allowed) {
        Ok(message) => {
            assert!(allowed.allows(&origin), "accepted message from {origin}");

            match &message {
                Message::IframeHeight { height, .. } | Message::Resize { height, .. } => {
                    check_height(*height);
                },
                _ => {},
            }

            let reencoded = encode(&message);
            match decode(&origin, &reencoded, &allowed) {
                Ok(again) => assert_eq!(again, message, "re-encode changed {reencoded}"),
                Err(e) => panic!("re-encoded message rejected: {e}"),
            }
        },
        Err(TransportError::DisallowedOrigin { .. }) => {
            assert!(!allowed.allows(&origin));
        },
        Err(_) => {
            assert!(allowed.allows(&origin), "payload parsed before origin check");
        },
    }
});
