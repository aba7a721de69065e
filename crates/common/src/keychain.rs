// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Keychain management module - router password storage outside the profile file

use keyring::Entry;

use crate::error::{Error, Result};

/// Keychain service name, router names are used as account names
pub const KEYCHAIN_SERVICE: &str = "router-tray";

/// Environment variable disabling all keychain access
pub const SKIP_KEYRING_ENV: &str = "ROUTER_TRAY_SKIP_KEYRING";

/// Backend holding router passwords keyed by router name
pub trait SecretStore: Send + Sync {
    /// Fetch the secret for `account`, `None` when no entry exists
    fn get(&self, account: &str) -> Result<Option<String>>;

    fn set(&self, account: &str, secret: &str) -> Result<()>;

    /// Remove the secret. Succeeds when the entry does not exist.
    fn remove(&self, account: &str) -> Result<()>;
}

/// Secret store backed by the platform keychain
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(KEYCHAIN_SERVICE)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, account: &str) -> Result<Entry> {
        Entry::new(&self.service, account)
            .map_err(|e| Error::Keychain(format!("Failed to create keychain entry: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keychain(format!(
                "Failed to retrieve password from keychain: {}",
                e
            ))),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<()> {
        self.entry(account)?
            .set_password(secret)
            .map_err(|e| Error::Keychain(format!("Failed to store password in keychain: {}", e)))
    }

    fn remove(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Keychain(format!(
                "Failed to remove password from keychain: {}",
                e
            ))),
        }
    }
}

/// Returns `true` if ROUTER_TRAY_SKIP_KEYRING is set to 1 or true
fn should_skip_keyring() -> bool {
    if let Ok(val) = std::env::var(SKIP_KEYRING_ENV) {
        matches!(val.as_str(), "1" | "true" | "True" | "TRUE")
    } else {
        false
    }
}

/// Check if the keychain is usable.
///
/// Creating an entry does not persist anything, it only exercises the
/// platform backend (DBus session and Secret Service on Linux).
pub fn is_keychain_available() -> bool {
    if should_skip_keyring() {
        return false;
    }

    Entry::new(KEYCHAIN_SERVICE, "__availability_test__").is_ok()
}
