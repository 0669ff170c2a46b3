//! Session gate: token holding, validation, and teardown.
//!
//! The client has no account model of its own; a session is nothing more
//! than "this token was accepted by a read against the sales listing".
//! A network error and a rejected token collapse to the same
//! unauthenticated outcome, and either one clears the stored credential.
//! No expiry is tracked locally: a stored token is re-validated with the
//! same probe every time the application initializes.

use tracing::{info, warn};
use zeroize::Zeroize;

use crate::{api, storage};

/// The session context handed to everything that talks to the remote API.
/// Explicit state object; there are no ambient globals.
#[derive(Debug, Default)]
pub struct Session {
    token: String,
    authenticated: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the order screen is unlocked.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The current token. Empty when logged out.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Start-of-life transition: pick up a previously stored token, if
    /// any, and re-validate it with the probe. Returns the resulting
    /// authenticated flag.
    pub async fn initialize(&mut self, base_url: &str) -> bool {
        match storage::get_token() {
            Some(stored) => self.submit_token(base_url, &stored).await,
            None => {
                self.authenticated = false;
                false
            }
        }
    }

    /// Validate an operator-supplied token by reading the sales listing.
    ///
    /// Success persists the token and unlocks the order screen; any
    /// failure clears both the stored and the in-memory credential. An
    /// empty token is not even sent.
    pub async fn submit_token(&mut self, base_url: &str, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        match api::probe_sales_listing(base_url, token).await {
            Ok(()) => {
                self.set_token(token);
                self.authenticated = true;
                if let Err(e) = storage::set_token(token) {
                    warn!(error = %e, "failed to persist token; session continues in-memory");
                }
                info!("token accepted");
                true
            }
            Err(e) => {
                warn!(error = %e, "token validation failed");
                self.clear();
                false
            }
        }
    }

    /// End-of-life transition: drop the credential everywhere and return
    /// to the token-entry screen.
    pub fn logout(&mut self) {
        info!("logging out");
        self.clear();
    }

    fn set_token(&mut self, token: &str) {
        self.token.zeroize();
        self.token = token.to_string();
    }

    fn clear(&mut self) {
        if let Err(e) = storage::clear_token() {
            warn!(error = %e, "failed to clear stored token");
        }
        self.token.zeroize();
        self.token = String::new();
        self.authenticated = false;
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn fresh_session_is_unauthenticated() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), "");
    }

    #[tokio::test]
    async fn blank_token_is_not_submitted() {
        // An unroutable base URL proves no request is attempted: a probe
        // would fail, but a blank token short-circuits first.
        let mut session = Session::new();
        assert!(!session.submit_token("http://127.0.0.1:9", "   ").await);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    #[serial]
    async fn failed_validation_clears_the_credential() {
        let previous = storage::get_token();
        if storage::set_token("stale-token").is_err() {
            eprintln!("skipping: no usable OS credential store");
            return;
        }

        let mut session = Session::new();
        let ok = session.submit_token("http://127.0.0.1:9", "some-token").await;
        assert!(!ok);
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), "");
        assert_eq!(storage::get_token(), None);

        if let Some(prev) = previous {
            let _ = storage::set_token(&prev);
        }
    }

    #[tokio::test]
    #[serial]
    async fn initialize_without_stored_token_stays_locked() {
        let previous = storage::get_token();
        if storage::clear_token().is_err() {
            eprintln!("skipping: no usable OS credential store");
            return;
        }

        let mut session = Session::new();
        assert!(!session.initialize("http://127.0.0.1:9").await);
        assert!(!session.is_authenticated());

        if let Some(prev) = previous {
            let _ = storage::set_token(&prev);
        }
    }

    #[tokio::test]
    #[serial]
    async fn logout_clears_state_and_storage() {
        let previous = storage::get_token();
        if storage::set_token("about-to-log-out").is_err() {
            eprintln!("skipping: no usable OS credential store");
            return;
        }

        let mut session = Session {
            token: "about-to-log-out".into(),
            authenticated: true,
        };
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), "");
        assert_eq!(storage::get_token(), None);

        if let Some(prev) = previous {
            let _ = storage::set_token(&prev);
        }
    }
}
