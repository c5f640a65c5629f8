use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const RESULT_TYPE: &str = "result";
pub const ACK_TYPE: &str = "ack";

/// Key the backend issued for one booking attempt; routes the tracking channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for BookingId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Frame pushed by the tracking server: `{"type": "...", "payload": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl InboundMessage {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self { kind: kind.into(), payload }
    }

    /// Decode a text frame. Anything that is not a JSON object with a `type`
    /// becomes an untyped message, which the tracker treats as a failure.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Unreadable frame on tracking channel: {}", e);
                Self::new("", Value::Null)
            }
        }
    }

    pub fn is_result(&self) -> bool {
        self.kind == RESULT_TYPE
    }

    pub fn ticket_id(&self) -> Option<String> {
        ticket_id_of(&self.payload)
    }

    /// Server-provided failure text: `message`, then `error` (replayed failures)
    pub fn failure_message(&self) -> Option<&str> {
        ["message", "error"]
            .iter()
            .filter_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
    }

    /// The payload, unless the server sent none
    pub fn payload(&self) -> Option<&Value> {
        match &self.payload {
            Value::Null => None,
            other => Some(other),
        }
    }
}

/// `ticket_id` of a result payload. Empty strings and zero count as absent.
pub fn ticket_id_of(payload: &Value) -> Option<String> {
    match payload.get("ticket_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Frame sent back to the tracking server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: String,
}

impl OutboundFrame {
    pub fn ack() -> Self {
        Self { kind: ACK_TYPE.to_string() }
    }

    pub fn to_json(&self) -> String {
        // A struct of one string field always serializes
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"type":"{}"}}"#, self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_result_frame() {
        let msg = InboundMessage::parse(
            r#"{"type":"result","payload":{"ticket_id":"T1","price":150000}}"#,
        );
        assert!(msg.is_result());
        assert_eq!(msg.ticket_id().as_deref(), Some("T1"));
        assert_eq!(msg.failure_message(), None);
    }

    #[test]
    fn test_failure_message_prefers_message_over_error() {
        let msg = InboundMessage::new("error", json!({"message": "Hết ghế", "error": "x"}));
        assert_eq!(msg.failure_message(), Some("Hết ghế"));

        let replayed = InboundMessage::new("error", json!({"error": "Seat lock expired"}));
        assert_eq!(replayed.failure_message(), Some("Seat lock expired"));

        let empty = InboundMessage::new("error", json!({"message": ""}));
        assert_eq!(empty.failure_message(), None);
    }

    #[test]
    fn test_garbage_frame_is_untyped() {
        let msg = InboundMessage::parse("not json");
        assert!(!msg.is_result());
        assert!(msg.payload().is_none());
    }

    #[test]
    fn test_ticket_id_presence() {
        assert_eq!(ticket_id_of(&json!({"ticket_id": ""})), None);
        assert_eq!(ticket_id_of(&json!({"ticket_id": null})), None);
        assert_eq!(ticket_id_of(&json!({"ticket_id": 0})), None);
        assert_eq!(ticket_id_of(&json!({"ticket_id": 17})).as_deref(), Some("17"));
        assert_eq!(ticket_id_of(&json!({"price": 100})), None);
    }

    #[test]
    fn test_ack_frame() {
        assert_eq!(OutboundFrame::ack().to_json(), r#"{"type":"ack"}"#);
        assert_eq!(BookingId::from(42u64).as_str(), "42");
    }
}
