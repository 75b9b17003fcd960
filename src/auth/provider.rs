//! Identity provider boundary.
//!
//! Authentication itself lives outside this crate; the session layer
//! only needs sign-in/sign-out entry points and a feed of identity
//! changes. [`MemoryIdentityProvider`] implements the boundary for
//! tests and demos.

use super::{
    errors::{AuthError, AuthResult},
    models::{Credentials, Identity},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

/// External identity provider.
///
/// `identity_changes` yields the current identity (or `None`)
/// immediately on subscription and again on every sign-in/sign-out,
/// mirroring an auth-state listener that fires at startup.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new identity and sign it in.
    async fn sign_up(&self, credentials: Credentials) -> AuthResult<Identity>;

    /// Sign in with an email/password pair.
    async fn sign_in(&self, credentials: Credentials) -> AuthResult<Identity>;

    /// Sign in through an external federated provider.
    async fn sign_in_external(&self) -> AuthResult<Identity>;

    /// Sign out the current identity.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Watch the current identity. The receiver's initial value is
    /// the identity at subscription time.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;
}

struct Account {
    password: String,
    identity: Identity,
}

/// In-memory identity provider for tests and demos.
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<Identity>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
        }
    }

    fn validate(credentials: &Credentials) -> AuthResult<()> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if credentials.password.len() < 6 {
            return Err(AuthError::WeakPassword(
                "must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, credentials: Credentials) -> AuthResult<Identity> {
        Self::validate(&credentials)?;

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&credentials.email) {
            return Err(AuthError::EmailTaken);
        }

        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            display_name: None,
            email: Some(credentials.email.clone()),
        };
        accounts.insert(
            credentials.email.clone(),
            Account {
                password: credentials.password,
                identity: identity.clone(),
            },
        );
        drop(accounts);

        let _ = self.current.send(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, credentials: Credentials) -> AuthResult<Identity> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(&credentials.email)
            .ok_or(AuthError::InvalidCredentials)?;
        if account.password != credentials.password {
            return Err(AuthError::InvalidCredentials);
        }
        let identity = account.identity.clone();
        drop(accounts);

        let _ = self.current.send(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_external(&self) -> AuthResult<Identity> {
        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            display_name: Some("External User".to_string()),
            email: None,
        };
        let _ = self.current.send(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let _ = self.current.send(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_round_trip() {
        let provider = MemoryIdentityProvider::new();
        let created = provider
            .sign_up(credentials("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let signed_in = provider
            .sign_in(credentials("ada@example.com", "hunter22"))
            .await
            .unwrap();
        assert_eq!(created.uid, signed_in.uid);
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up(credentials("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let err = provider
            .sign_in(credentials("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up(credentials("ada@example.com", "hunter22"))
            .await
            .unwrap();

        let err = provider
            .sign_up(credentials("ada@example.com", "other-pass"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::EmailTaken);
    }

    #[tokio::test]
    async fn identity_changes_track_sign_in_and_out() {
        let provider = MemoryIdentityProvider::new();
        let mut changes = provider.identity_changes();
        assert!(changes.borrow().is_none());

        let identity = provider.sign_in_external().await.unwrap();
        changes.changed().await.unwrap();
        assert_eq!(
            changes.borrow().as_ref().map(|id| id.uid.clone()),
            Some(identity.uid)
        );

        provider.sign_out().await.unwrap();
        changes.changed().await.unwrap();
        assert!(changes.borrow().is_none());
    }
}
