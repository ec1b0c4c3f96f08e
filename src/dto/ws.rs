use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::bindings::{KeyPressRequest, KeyPressResponse};

#[derive(Debug, Deserialize, Serialize)]
/// Messages accepted from input WebSocket clients.
#[serde(tag = "type")]
pub enum InputInboundMessage {
    #[serde(rename = "key_press")]
    KeyPress(KeyPressRequest),
    #[serde(other)]
    Unknown,
}

impl InputInboundMessage {
    /// Parse and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, InboundMessageError> {
        let message: Self = serde_json::from_str(text)?;
        if let Self::KeyPress(press) = &message {
            press.validate()?;
        }
        Ok(message)
    }
}

/// Reasons an inbound frame is dropped.
#[derive(Debug, thiserror::Error)]
pub enum InboundMessageError {
    #[error("malformed message: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid message: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Serialize)]
/// Acknowledgement sent back for every key press frame.
#[serde(tag = "type", rename = "ack")]
pub struct KeyPressAck {
    #[serde(flatten)]
    pub outcome: KeyPressResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_press_frame_is_parsed() {
        let message =
            InputInboundMessage::from_json_str(r#"{"type": "key_press", "code": 90, "key": "z"}"#)
                .unwrap();
        let InputInboundMessage::KeyPress(press) = message else {
            panic!("expected key press");
        };
        assert_eq!(press.code, 90);
        assert_eq!(press.key, "z");
    }

    #[test]
    fn unknown_frames_are_tolerated() {
        assert!(matches!(
            InputInboundMessage::from_json_str(r#"{"type": "ping"}"#).unwrap(),
            InputInboundMessage::Unknown
        ));
    }

    #[test]
    fn invalid_frames_are_rejected() {
        assert!(InputInboundMessage::from_json_str("not json").is_err());
        assert!(
            InputInboundMessage::from_json_str(r#"{"type": "key_press", "code": 1, "key": ""}"#)
                .is_err()
        );
    }

    #[test]
    fn ack_is_tagged() {
        let ack = KeyPressAck {
            outcome: KeyPressResponse::ignored(),
        };
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["type"], json!("ack"));
        assert_eq!(value["consumed"], json!(false));
    }
}
