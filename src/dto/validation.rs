//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::keybinds::Lane;

/// Longest key symbol accepted from clients.
const MAX_KEY_SYMBOL_LEN: usize = 32;

/// Validates that a lane code is one of the seven playable lanes (11 to 17).
pub fn validate_lane_code(code: u8) -> Result<(), ValidationError> {
    Lane::from_code(code).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("lane_code");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a key symbol is present and short.
///
/// A single space is a valid symbol.
pub fn validate_key_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        let mut err = ValidationError::new("key_symbol_empty");
        err.message = Some("Key symbol must not be empty".into());
        return Err(err);
    }

    if symbol.chars().count() > MAX_KEY_SYMBOL_LEN {
        let mut err = ValidationError::new("key_symbol_length");
        err.message = Some(
            format!("Key symbol must be at most {MAX_KEY_SYMBOL_LEN} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lane_code() {
        for code in 11..=17 {
            assert!(validate_lane_code(code).is_ok());
        }
        assert!(validate_lane_code(10).is_err());
        assert!(validate_lane_code(18).is_err());
        assert!(validate_lane_code(0).is_err());
    }

    #[test]
    fn test_validate_key_symbol() {
        assert!(validate_key_symbol("z").is_ok());
        assert!(validate_key_symbol(" ").is_ok());
        assert!(validate_key_symbol("ArrowLeft").is_ok());
        assert!(validate_key_symbol("").is_err());
        assert!(validate_key_symbol(&"x".repeat(33)).is_err());
    }
}
