//! Reply envelope shared by every request/response event.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Result;

/// Status code the backend uses for success.
pub const STATUS_OK: u16 = 200;

/// `{success, errormessage, response}` envelope.
///
/// `success` is an HTTP-like status code, not a boolean. Older backend builds
/// omit `response` on failure; a missing field decodes as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketResponse<T = Value> {
    /// Status code, [`STATUS_OK`] on success.
    pub success: u16,
    /// Human-readable failure reason. Empty on success.
    #[serde(default)]
    pub errormessage: String,
    /// Payload.
    pub response: Option<T>,
}

impl<T> SocketResponse<T> {
    /// Whether the backend reported success.
    pub fn is_ok(&self) -> bool {
        self.success == STATUS_OK
    }
}

impl SocketResponse<Value> {
    /// Parse a raw ack payload into an untyped envelope.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decode the payload as `T`.
    ///
    /// A `null` or missing payload yields `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.response {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Conversation;

    #[test]
    fn decodes_typed_payload() {
        let raw = json!({
            "success": 200,
            "errormessage": "",
            "response": [{"chatId": "g1", "type": 1, "name": "ops", "channelId": "ch1"}],
        });
        let envelope = SocketResponse::from_value(raw).expect("envelope");
        assert!(envelope.is_ok());

        let items: Vec<Conversation> = envelope.decode().expect("decode").unwrap_or_default();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_group("ch1"));
    }

    #[test]
    fn missing_response_is_none() {
        let raw = json!({"success": 401, "errormessage": "unauthorized"});
        let envelope = SocketResponse::from_value(raw).expect("envelope");
        assert!(!envelope.is_ok());
        assert_eq!(envelope.decode::<Vec<Conversation>>().expect("decode"), None);
    }
}
