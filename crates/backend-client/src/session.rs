//! Authentication state shared by everything talking to the backend.

use tokio::sync::watch;
use tracing::info;

/// Holds the session token. Signing out is visible to every subscriber,
/// so dependent caches can clear themselves.
#[derive(Debug)]
pub struct Session {
    token: watch::Sender<Option<String>>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        let (token, _) = watch::channel(token.filter(|t| !t.is_empty()));
        Self { token }
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.token.send_replace(Some(token.into()));
        info!("Signed in");
    }

    /// Forget the token. Returns whether a token was present.
    pub fn sign_out(&self) -> bool {
        let signed_out = self.token.send_if_modified(|token| token.take().is_some());
        if signed_out {
            info!("Signed out");
        }
        signed_out
    }

    /// Receiver that observes sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}
