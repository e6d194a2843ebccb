//! Raw message envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::TransportError;

/// The JSON envelope every cross-window message uses.
///
/// Height-style messages put their fields next to `type` (`{type:
/// 'iframe-height', height: 900}`), modal messages nest them under `data`.
/// Both layouts are accepted; top-level fields win when a name appears in
/// both places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportMessage {
    /// Wire message type, case-sensitive.
    #[serde(rename = "type")]
    pub kind: String,

    /// Nested payload.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// Sender tag: an app id for `resize`, a height source for
    /// `iframe-height`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,

    /// Remaining top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransportMessage {
    /// Create an envelope with only a type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), data: None, source: None, extra: Map::new() }
    }

    /// Set the nested payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the sender tag.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a top-level field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Parse an envelope out of an arbitrary JSON value.
    pub fn from_value(raw: &Value) -> Result<Self, TransportError> {
        let Value::Object(fields) = raw else {
            return Err(TransportError::MalformedEnvelope {
                reason: format!("expected an object, got {}", json_kind(raw)),
            });
        };

        match fields.get("type") {
            Some(Value::String(_)) => {},
            Some(other) => {
                return Err(TransportError::MalformedEnvelope {
                    reason: format!("`type` must be a string, got {}", json_kind(other)),
                });
            },
            None => {
                return Err(TransportError::MalformedEnvelope {
                    reason: "missing `type`".to_string(),
                });
            },
        }

        // `source` is free-form on the wire; only keep it when it is a string.
        let mut fields = fields.clone();
        if fields.get("source").is_some_and(|s| !s.is_string()) {
            fields.remove("source");
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| TransportError::MalformedEnvelope { reason: e.to_string() })
    }

    /// Convert into the JSON value posted across windows.
    pub fn into_value(self) -> Value {
        let mut fields = self.extra;
        fields.insert("type".to_string(), Value::String(self.kind));
        if let Some(data) = self.data {
            fields.insert("data".to_string(), data);
        }
        if let Some(source) = self.source {
            fields.insert("source".to_string(), Value::String(source));
        }
        Value::Object(fields)
    }

    /// Look up a payload field, top level first, then inside `data`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra
            .get(name)
            .or_else(|| self.data.as_ref().and_then(Value::as_object).and_then(|d| d.get(name)))
    }

    /// All payload fields merged into one object, top level winning.
    pub fn merged_fields(&self) -> Map<String, Value> {
        let mut merged = match &self.data {
            Some(Value::Object(data)) => data.clone(),
            _ => Map::new(),
        };
        for (name, value) in &self.extra {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_top_level_fields() {
        let envelope =
            TransportMessage::from_value(&json!({"type": "resize", "height": 640, "source": "app"}))
                .unwrap();

        assert_eq!(envelope.kind, "resize");
        assert_eq!(envelope.source.as_deref(), Some("app"));
        assert_eq!(envelope.field("height"), Some(&json!(640)));
    }

    #[test]
    fn top_level_field_wins_over_data() {
        let envelope = TransportMessage::from_value(
            &json!({"type": "window-resize", "minHeight": 520, "data": {"minHeight": 420}}),
        )
        .unwrap();

        assert_eq!(envelope.field("minHeight"), Some(&json!(520)));
        assert_eq!(envelope.merged_fields().get("minHeight"), Some(&json!(520)));
    }

    #[test]
    fn falls_back_to_data_fields() {
        let envelope =
            TransportMessage::from_value(&json!({"type": "iframe-height", "data": {"height": 700}}))
                .unwrap();

        assert_eq!(envelope.field("height"), Some(&json!(700)));
    }

    #[test]
    fn non_object_is_malformed() {
        let err = TransportMessage::from_value(&json!("iframe-height")).unwrap_err();
        assert_eq!(err.to_string(), "malformed envelope: expected an object, got a string");
    }

    #[test]
    fn missing_type_is_malformed() {
        let err = TransportMessage::from_value(&json!({"height": 10})).unwrap_err();
        assert!(matches!(err, TransportError::MalformedEnvelope { .. }));
    }

    #[test]
    fn non_string_source_is_dropped() {
        let envelope =
            TransportMessage::from_value(&json!({"type": "resize", "height": 1, "source": 7}))
                .unwrap();
        assert_eq!(envelope.source, None);
    }

    #[test]
    fn into_value_places_tag_and_source() {
        let value =
            TransportMessage::new("resize").with_source("app").with_field("height", json!(10))
                .into_value();

        assert_eq!(value, json!({"type": "resize", "source": "app", "height": 10}));
    }
}
