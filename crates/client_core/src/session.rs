//! Session credential context shared by the controllers.
//!
//! The credential lives from `login` to `logout`. Controllers only read it,
//! and the profile screen watches it to reload after a re-login.

use std::{fmt, sync::Arc};

use tokio::sync::watch;
use tracing::info;
use zeroize::Zeroize;

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn bearer(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

#[derive(Clone)]
pub struct SessionContext {
    credential: Arc<watch::Sender<Option<Credential>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            credential: Arc::new(tx),
        }
    }

    /// Installs a credential. Re-installing the same token is not a change.
    pub fn login(&self, token: impl Into<String>) {
        let next = Credential::new(token);
        let changed = self.credential.send_if_modified(|current| {
            if current.as_ref() == Some(&next) {
                false
            } else {
                *current = Some(next);
                true
            }
        });
        if changed {
            info!("session: credential installed");
        }
    }

    pub fn logout(&self) {
        let changed = self.credential.send_if_modified(|current| current.take().is_some());
        if changed {
            info!("session: credential cleared");
        }
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.credential.subscribe()
    }
}
