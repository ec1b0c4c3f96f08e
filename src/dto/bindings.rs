use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        config::LaneBindingDto,
        validation::{validate_key_symbol, validate_lane_code},
    },
    state::keybinds::KeyPress,
};

#[derive(Debug, Deserialize)]
/// Path parameters of `/bindings/{lane}/start`.
pub struct LanePath {
    pub lane: u8,
}

impl Validate for LanePath {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_lane_code(self.lane) {
            errors.add("lane", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Reply to a binding start.
pub struct BindingStartedResponse {
    pub lane: u8,
    pub label: String,
    /// Lane whose pending request was replaced by this one.
    pub abandoned_lane: Option<u8>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
/// A key press reported by the client.
pub struct KeyPressRequest {
    /// Platform key code.
    pub code: u32,
    /// Platform key symbol (`z`, ` `, `Shift`...).
    pub key: String,
}

impl Validate for KeyPressRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_key_symbol(&self.key) {
            errors.add("key", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<KeyPressRequest> for KeyPress {
    fn from(value: KeyPressRequest) -> Self {
        KeyPress::new(value.code, value.key)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Outcome of a key press.
pub struct KeyPressResponse {
    /// When true the client must suppress the default handling of the key.
    pub consumed: bool,
    /// Confirmation message when the press was bound.
    pub message: Option<String>,
    /// New binding of the lane that received the key.
    pub binding: Option<LaneBindingDto>,
    /// Lane that lost the key to this binding.
    pub evicted_lane: Option<u8>,
}

impl KeyPressResponse {
    pub fn ignored() -> Self {
        Self {
            consumed: false,
            message: None,
            binding: None,
            evicted_lane: None,
        }
    }
}
