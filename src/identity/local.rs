use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::{IdentityError, IdentityProvider, IdentityResult, UserId};
use crate::config::AppConfig;

/// In-process identity provider.
///
/// Anonymous users get a random UUID; tokens resolve through a fixed table.
#[derive(Clone)]
pub struct LocalIdentity {
    inner: Arc<LocalIdentityInner>,
}

struct LocalIdentityInner {
    tokens: HashMap<String, UserId>,
    allow_anonymous: bool,
    current: watch::Sender<Option<UserId>>,
}

impl LocalIdentity {
    pub fn new(tokens: HashMap<String, String>, allow_anonymous: bool) -> Self {
        let (current, _rx) = watch::channel(None);
        let tokens = tokens
            .into_iter()
            .map(|(token, user)| (token, UserId::new(user)))
            .collect();
        Self {
            inner: Arc::new(LocalIdentityInner {
                tokens,
                allow_anonymous,
                current,
            }),
        }
    }

    /// Provider accepting the tokens listed in the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.auth_tokens.clone(), config.allow_anonymous)
    }

    fn publish(&self, user: Option<UserId>) {
        self.inner.current.send_replace(user);
    }
}

impl IdentityProvider for LocalIdentity {
    fn sign_in_anonymous(&self) -> BoxFuture<'static, IdentityResult<UserId>> {
        let identity = self.clone();
        Box::pin(async move {
            if !identity.inner.allow_anonymous {
                return Err(IdentityError::AnonymousDisabled);
            }
            let user = UserId::new(Uuid::new_v4().simple().to_string());
            info!(user = %user, "signed in anonymously");
            identity.publish(Some(user.clone()));
            Ok(user)
        })
    }

    fn sign_in_with_token(&self, token: String) -> BoxFuture<'static, IdentityResult<UserId>> {
        let identity = self.clone();
        Box::pin(async move {
            let user = identity
                .inner
                .tokens
                .get(&token)
                .cloned()
                .ok_or(IdentityError::InvalidToken)?;
            info!(user = %user, "signed in with token");
            identity.publish(Some(user.clone()));
            Ok(user)
        })
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.inner.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(allow_anonymous: bool) -> LocalIdentity {
        LocalIdentity::new(
            HashMap::from([("secret".to_string(), "player-one".to_string())]),
            allow_anonymous,
        )
    }

    #[tokio::test]
    async fn known_token_resolves_to_user() {
        let identity = identity(true);
        let user = identity.sign_in_with_token("secret".into()).await.unwrap();
        assert_eq!(user.as_str(), "player-one");
        assert_eq!(*identity.subscribe().borrow(), Some(user));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let identity = identity(true);
        assert_eq!(
            identity.sign_in_with_token("nope".into()).await,
            Err(IdentityError::InvalidToken)
        );
        assert_eq!(*identity.subscribe().borrow(), None);
    }

    #[tokio::test]
    async fn anonymous_users_are_distinct() {
        let identity = identity(true);
        let first = identity.sign_in_anonymous().await.unwrap();
        let second = identity.sign_in_anonymous().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
    }

    #[tokio::test]
    async fn anonymous_can_be_disabled() {
        assert_eq!(
            identity(false).sign_in_anonymous().await,
            Err(IdentityError::AnonymousDisabled)
        );
    }

    #[tokio::test]
    async fn sign_in_notifies_subscribers() {
        let identity = identity(true);
        let mut rx = identity.subscribe();
        let user = identity
            .sign_in_with_token("secret".to_string())
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(user));
    }
}
