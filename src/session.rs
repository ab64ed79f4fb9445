//! The signed-in identity, shared by every shelf store of one client.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::domain::UserId;
use crate::services::{AuthError, AuthService};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl Identity {
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Upper-cased first letter of the username, shown in the navigation bar.
    #[must_use]
    pub fn initial(&self) -> String {
        self.username
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// Cheap-clone handle on the current identity.
///
/// Created once per client and passed to every store; clones observe the same
/// identity and are notified when it changes.
#[derive(Debug, Clone)]
pub struct Session {
    identity: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: Arc::new(watch::Sender::new(None)),
        }
    }

    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Arc::new(watch::Sender::new(Some(identity))),
        }
    }

    pub async fn sign_in(
        &self,
        auth: &dyn AuthService,
        username: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let login = auth.login(username, password).await?;
        let identity = Identity::new(login.user_id, login.username);

        info!(user = %identity.username, "Signed in");
        self.set(Some(identity.clone()));
        Ok(identity)
    }

    pub fn sign_out(&self) {
        if let Some(identity) = self.identity() {
            info!(user = %identity.username, "Signed out");
        }
        self.set(None);
    }

    /// Publishes `identity`; subscribers are only woken when it differs.
    pub fn set(&self, identity: Option<Identity>) {
        self.identity.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.identity.borrow().as_ref().map(|identity| identity.user_id)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}
