//! Who the player is: sign-in collaborator and the local implementation.

mod local;

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use utoipa::ToSchema;

pub use self::local::LocalIdentity;

/// Result alias for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Opaque identifier of an authenticated player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, used to derive display names.
    pub fn prefix(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign-in failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("sign-in token was rejected")]
    InvalidToken,
    #[error("anonymous sign-in is disabled")]
    AnonymousDisabled,
}

/// Authentication collaborator.
pub trait IdentityProvider: Send + Sync {
    /// Sign in with a fresh anonymous identity.
    fn sign_in_anonymous(&self) -> BoxFuture<'static, IdentityResult<UserId>>;
    /// Sign in with a pre-issued token.
    fn sign_in_with_token(&self, token: String) -> BoxFuture<'static, IdentityResult<UserId>>;
    /// Follow the signed-in user; `None` while signed out.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_takes_leading_characters() {
        let id = UserId::new("abcdef");
        assert_eq!(id.prefix(4), "abcd");
        assert_eq!(UserId::new("ab").prefix(4), "ab");
        assert_eq!(UserId::new("ünïcode").prefix(3), "ünï");
    }
}
