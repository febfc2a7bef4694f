use serde::Serialize;
use serde_json::{json, Value};

use crate::kind::{MessageKind, END, ERROR, LOG};

static NULL: Value = Value::Null;

/// One control message carried by the side channel.
///
/// Produced either by decoding one JSON line or synthesized by the parser
/// when a chunk is plain diagnostic text.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Type name. `None` when the record had no string `type` field.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<String>,
    /// Opaque payload; `Null` when the record had none.
    pub payload: Value,
    /// Source line this message was decoded from.
    #[serde(skip)]
    raw: Option<String>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.msg_type == other.msg_type && self.payload == other.payload
    }
}

impl Message {
    /// Create a message with an arbitrary type name.
    pub fn new(msg_type: impl Into<String>, payload: Value) -> Self {
        Self {
            msg_type: Some(msg_type.into()),
            payload,
            raw: None,
        }
    }

    /// Build a message from any decoded JSON value.
    ///
    /// Non-object values and objects without a string `type` become untyped
    /// messages.
    pub fn from_value(value: Value, raw: &str) -> Self {
        let (msg_type, payload) = match value {
            Value::Object(mut map) => {
                let msg_type = match map.remove("type") {
                    Some(Value::String(name)) => Some(name),
                    _ => None,
                };
                (msg_type, map.remove("payload").unwrap_or(Value::Null))
            }
            _ => (None, Value::Null),
        };
        Self {
            msg_type,
            payload,
            raw: Some(raw.to_owned()),
        }
    }

    /// Create an `end` message.
    pub fn end() -> Self {
        Self::new(END, json!({}))
    }

    /// Create a `log` message.
    pub fn log(entry: impl Into<Value>) -> Self {
        Self::new(LOG, json!({ "entry": entry.into() }))
    }

    /// Create an `error` message without a code.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(ERROR, json!({ "error": text.into() }))
    }

    /// Create an `error` message carrying a machine-readable code.
    pub fn error_with_code(text: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(ERROR, json!({ "error": text.into(), "code": code.into() }))
    }

    /// Type name, if the message has one.
    pub fn type_name(&self) -> Option<&str> {
        self.msg_type.as_deref()
    }

    /// Built-in classification of this message's type.
    pub fn kind(&self) -> MessageKind {
        MessageKind::classify(self.type_name())
    }

    /// `payload.entry`, or `Null`.
    pub fn entry(&self) -> &Value {
        self.payload.get("entry").unwrap_or(&NULL)
    }

    /// `payload.code` when it is a string.
    pub fn code(&self) -> Option<&str> {
        self.payload.get("code").and_then(Value::as_str)
    }

    /// Text to surface on the output when this message is handled as an error.
    ///
    /// Falls back to the source line, then to the serialized payload, for
    /// records that carry no `payload.error`.
    pub fn error_text(&self) -> String {
        match self.payload.get("error") {
            Some(Value::String(text)) => text.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => self
                .raw
                .clone()
                .unwrap_or_else(|| self.payload.to_string()),
        }
    }

    /// The line this message was decoded from, if any.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Serialize as one wire record (without the trailing newline).
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_extracts_type_and_payload() {
        let line = r#"{"type":"log","payload":{"entry":"x"}}"#;
        let value: Value = serde_json::from_str(line).unwrap();
        let msg = Message::from_value(value, line);

        assert_eq!(msg.type_name(), Some("log"));
        assert_eq!(msg.entry(), &json!("x"));
        assert_eq!(msg.raw(), Some(line));
        assert_eq!(msg, Message::log("x"));
    }

    #[test]
    fn non_string_type_is_untyped() {
        let line = r#"{"type":7,"payload":{"error":"x"}}"#;
        let msg = Message::from_value(serde_json::from_str(line).unwrap(), line);
        assert_eq!(msg.kind(), MessageKind::Untyped);
        assert_eq!(msg.error_text(), "x");
    }

    #[test]
    fn scalar_value_is_untyped_with_null_payload() {
        let msg = Message::from_value(json!(42), "42");
        assert_eq!(msg.msg_type, None);
        assert!(msg.payload.is_null());
        assert_eq!(msg.error_text(), "42");
    }

    #[test]
    fn error_text_prefers_payload_error() {
        assert_eq!(Message::error("boom").error_text(), "boom");
        let structured = Message::new("error", json!({ "error": { "stack": "s" } }));
        assert_eq!(structured.error_text(), r#"{"stack":"s"}"#);
    }

    #[test]
    fn error_text_falls_back_to_source_line() {
        let line = r#"{"type":"writeHead","payload":{"status":500}}"#;
        let msg = Message::from_value(serde_json::from_str(line).unwrap(), line);
        assert_eq!(msg.error_text(), line);

        let built = Message::new("custom", json!({ "a": 1 }));
        assert_eq!(built.error_text(), r#"{"a":1}"#);
    }

    #[test]
    fn code_and_entry_accessors() {
        let msg = Message::error_with_code("missing", "MODULE_NOT_FOUND");
        assert_eq!(msg.code(), Some("MODULE_NOT_FOUND"));
        assert!(msg.entry().is_null());
        assert_eq!(Message::error("x").code(), None);
    }

    #[test]
    fn to_line_matches_wire_shape() {
        let line = Message::end().to_line().unwrap();
        assert_eq!(line, r#"{"type":"end","payload":{}}"#);
        assert!(!Message::log("a\nb").to_line().unwrap().contains('\n'));
    }
}
