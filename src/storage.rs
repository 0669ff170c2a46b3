//! Durable token storage using the OS credential store.
//!
//! On Windows this uses DPAPI (via the `keyring` crate), on macOS Keychain,
//! and on Linux the kernel keyutils. The API token is the only credential
//! this client persists: it is read once at startup, written after a
//! successful validation, and removed on logout or validation failure.

use keyring::Entry;
use tracing::warn;

const SERVICE_NAME: &str = "tablecrm-cashier";

/// The single credential key: the last accepted TableCRM API token.
const KEY_API_TOKEN: &str = "api_token";

/// Retrieve the stored API token. Returns `None` when no token has been
/// stored (or the platform returns a "not found" error).
pub fn get_token() -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, KEY_API_TOKEN) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(token) => Some(token),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(error = %e, "keyring: failed to read token");
            None
        }
    }
}

/// Store the API token after a successful validation.
pub fn set_token(token: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, KEY_API_TOKEN).map_err(|e| e.to_string())?;
    entry.set_password(token).map_err(|e| e.to_string())?;
    Ok(())
}

/// Delete the stored API token. Silently succeeds if no token is stored.
pub fn clear_token() -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, KEY_API_TOKEN).map_err(|e| e.to_string())?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
