// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - Router Store
// Sole owner of the router collection and of its profile file

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::keychain::{is_keychain_available, KeyringStore, SecretStore};
use crate::profile::{RouterProfile, SaveRouterPayload};
use crate::settings::{PasswordStorage, Settings};

/// Where new passwords are written
pub enum PasswordVault {
    /// Inline in the profile file
    File,
    /// External secret store keyed by router name
    Keychain(Box<dyn SecretStore>),
}

impl PasswordVault {
    /// Resolve the configured backend, falling back to file storage when the
    /// keychain cannot be reached
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.password_storage {
            PasswordStorage::File => PasswordVault::File,
            PasswordStorage::Keyring if is_keychain_available() => {
                PasswordVault::Keychain(Box::new(KeyringStore::new()))
            }
            PasswordStorage::Keyring => {
                warn!("Keychain unavailable, storing router passwords in the profile file");
                PasswordVault::File
            }
        }
    }

    fn secrets(&self) -> Option<&dyn SecretStore> {
        match self {
            PasswordVault::File => None,
            PasswordVault::Keychain(store) => Some(store.as_ref()),
        }
    }
}

impl fmt::Debug for PasswordVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordVault::File => f.write_str("File"),
            PasswordVault::Keychain(_) => f.write_str("Keychain"),
        }
    }
}

/// Password held for a router
#[derive(Clone, PartialEq, Eq)]
enum Secret {
    None,
    Inline(Zeroizing<String>),
    /// Kept in the keychain under the router name
    Keychain,
}

impl Secret {
    fn is_stored(&self) -> bool {
        !matches!(self, Secret::None)
    }
}

#[derive(Clone)]
struct StoredRouter {
    name: String,
    address: String,
    login: String,
    secret: Secret,
}

impl StoredRouter {
    fn to_profile(&self) -> RouterProfile {
        RouterProfile {
            name: self.name.clone(),
            address: self.address.clone(),
            login: self.login.clone(),
            password: None,
            password_stored: self.secret.is_stored(),
        }
    }
}

impl fmt::Debug for StoredRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredRouter")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("login", &self.login)
            .field("password_stored", &self.secret.is_stored())
            .finish()
    }
}

/// On-disk layout of the profile file
#[derive(Debug, Default, Serialize, Deserialize)]
struct RoutersFile {
    #[serde(default)]
    routers: Vec<RouterRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RouterRecord {
    name: String,
    address: String,
    #[serde(default)]
    login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    /// Password lives in the keychain
    #[serde(default, skip_serializing_if = "is_false")]
    password_stored: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

enum StoreState {
    Uninitialized,
    Loaded(Vec<StoredRouter>),
}

/// Profile file that could not be loaded
struct LoadFailure {
    error: Error,
    /// The file was moved aside, starting empty cannot overwrite it
    quarantined: bool,
}

impl LoadFailure {
    fn unreadable(error: Error) -> Self {
        Self {
            error,
            quarantined: false,
        }
    }
}

/// Keychain change applied ahead of a file write, undone if the write fails
struct KeychainUndo {
    account: String,
    previous: Option<Zeroizing<String>>,
}

/// Authoritative router collection.
///
/// The collection is loaded from the profile file on first use and written
/// back before every mutating call returns. A single mutex covers
/// load, mutate and persist.
pub struct RouterStore {
    path: PathBuf,
    vault: PasswordVault,
    state: Mutex<StoreState>,
}

impl RouterStore {
    pub fn new(path: impl Into<PathBuf>, vault: PasswordVault) -> Self {
        Self {
            path: path.into(),
            vault,
            state: Mutex::new(StoreState::Uninitialized),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let vault = PasswordVault::from_settings(settings);
        info!(
            "Router store at {} (passwords: {:?})",
            settings.routers_file.display(),
            vault
        );
        Self::new(settings.routers_file.clone(), vault)
    }

    /// Path of the profile file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), StoreState::Loaded(_))
    }

    /// All routers in display order, passwords redacted
    pub fn list(&self) -> Result<Vec<RouterProfile>> {
        let mut state = self.lock();
        let routers = Self::ensure_loaded(&mut *state, || self.load())?;
        Ok(routers.iter().map(StoredRouter::to_profile).collect())
    }

    /// Full profile including the password, for in-process consumers
    pub fn credentials(&self, name: &str) -> Result<RouterProfile> {
        let mut state = self.lock();
        let routers = Self::ensure_loaded(&mut *state, || self.load())?;
        let router = routers
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let password = match &router.secret {
            Secret::None => String::new(),
            Secret::Inline(password) => password.to_string(),
            Secret::Keychain => match self.vault.secrets() {
                Some(secrets) => secrets.get(&router.name)?.ok_or_else(|| {
                    Error::Keychain(format!(
                        "Password for '{}' is missing from the keychain",
                        router.name
                    ))
                })?,
                None => {
                    return Err(Error::Keychain(format!(
                        "Password for '{}' is kept in the keychain but keychain storage is disabled",
                        router.name
                    )))
                }
            },
        };

        let mut profile = router.to_profile();
        profile.password = Some(password);
        Ok(profile)
    }

    /// Create a router, or update/rename the one named by
    /// `payload.original_name`. Nothing changes unless the whole operation,
    /// including the file write, succeeds.
    pub fn save(&self, payload: &SaveRouterPayload) -> Result<()> {
        let mut state = self.lock();
        let routers = Self::ensure_loaded(&mut *state, || self.load())?;
        let (name, address) = payload.normalized()?;

        let existing = match payload.original_name.as_deref() {
            None => {
                if routers.iter().any(|r| r.name == name) {
                    return Err(Error::DuplicateName(name));
                }
                None
            }
            Some(original) => {
                let pos = routers
                    .iter()
                    .position(|r| r.name == original)
                    .ok_or_else(|| Error::NotFound(original.to_string()))?;
                if name != original && routers.iter().any(|r| r.name == name) {
                    return Err(Error::DuplicateName(name));
                }
                Some(pos)
            }
        };

        let previous = existing.map(|pos| routers[pos].clone());
        let renamed_from = previous
            .as_ref()
            .filter(|p| p.name != name)
            .map(|p| p.name.clone());

        let (secret, undo) = self.resolve_secret(&name, payload, previous.as_ref())?;

        let router = StoredRouter {
            name: name.clone(),
            address,
            login: payload.login.clone(),
            secret,
        };

        let mut updated = routers.clone();
        match existing {
            Some(pos) => updated[pos] = router,
            None => updated.push(router),
        }

        if let Err(e) = self.persist(&updated) {
            if let Some(undo) = undo {
                self.rollback_keychain(undo);
            }
            return Err(e);
        }

        // The keychain entry under the old name was copied or is stale
        if let Some(original) = &renamed_from {
            if previous.as_ref().is_some_and(|p| p.secret == Secret::Keychain) {
                self.remove_keychain_entry(original);
            }
        }

        match &renamed_from {
            Some(original) => info!("Renamed router '{}' to '{}'", original, name),
            None if previous.is_some() => info!("Updated router '{}'", name),
            None => info!("Added router '{}'", name),
        }

        *routers = updated;
        Ok(())
    }

    /// Remove the router with exactly this name
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        let routers = Self::ensure_loaded(&mut *state, || self.load())?;

        let pos = routers
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let mut updated = routers.clone();
        let removed = updated.remove(pos);
        self.persist(&updated)?;

        if removed.secret == Secret::Keychain {
            self.remove_keychain_entry(&removed.name);
        }

        info!("Deleted router '{}'", name);
        *routers = updated;
        Ok(())
    }

    /// Discard the in-memory collection and load the profile file again
    pub fn reload(&self) -> Result<()> {
        let mut state = self.lock();
        *state = StoreState::Uninitialized;
        Self::ensure_loaded(&mut *state, || self.load())?;
        debug!("Reloaded routers from {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Mutations only commit after a successful persist, so the state
        // behind a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load on first use.
    ///
    /// A quarantined file degrades to an empty collection and the error is
    /// returned to the call that triggered the load. A file that cannot be
    /// read at all keeps the store uninitialized, so every call fails and
    /// nothing is written over it.
    fn ensure_loaded<'a>(
        state: &'a mut StoreState,
        load: impl FnOnce() -> std::result::Result<Vec<StoredRouter>, LoadFailure>,
    ) -> Result<&'a mut Vec<StoredRouter>> {
        if let StoreState::Uninitialized = state {
            match load() {
                Ok(routers) => *state = StoreState::Loaded(routers),
                Err(LoadFailure {
                    error,
                    quarantined: true,
                }) => {
                    warn!("Failed to load routers, starting with an empty list: {}", error);
                    *state = StoreState::Loaded(Vec::new());
                    return Err(error);
                }
                Err(LoadFailure {
                    error,
                    quarantined: false,
                }) => {
                    warn!("Failed to load routers: {}", error);
                    return Err(error);
                }
            }
        }

        match state {
            StoreState::Loaded(routers) => Ok(routers),
            StoreState::Uninitialized => unreachable!("store state initialized above"),
        }
    }

    fn load(&self) -> std::result::Result<Vec<StoredRouter>, LoadFailure> {
        if !self.path.exists() {
            debug!("Profile file does not exist: {}", self.path.display());
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path).map_err(|e| {
            LoadFailure::unreadable(Error::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            )))
        })?;

        let parsed = String::from_utf8(bytes)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                let contents = Zeroizing::new(contents);
                toml::from_str::<RoutersFile>(&contents).map_err(|e| e.to_string())
            });
        let file = match parsed {
            Ok(file) => file,
            Err(e) => {
                let error =
                    Error::Storage(format!("Failed to parse {}: {}", self.path.display(), e));
                return Err(LoadFailure {
                    error,
                    quarantined: self.quarantine(),
                });
            }
        };

        let mut routers: Vec<StoredRouter> = Vec::with_capacity(file.routers.len());
        for record in file.routers {
            if record.name.trim().is_empty() || record.address.trim().is_empty() {
                warn!("Skipping router record with empty name or address");
                continue;
            }
            if routers.iter().any(|r| r.name == record.name) {
                warn!("Skipping duplicate router record '{}'", record.name);
                continue;
            }

            let secret = match record.password {
                Some(password) if !password.is_empty() => Secret::Inline(Zeroizing::new(password)),
                _ if record.password_stored => Secret::Keychain,
                _ => Secret::None,
            };

            routers.push(StoredRouter {
                name: record.name,
                address: record.address,
                login: record.login,
                secret,
            });
        }

        debug!("Loaded {} router(s) from {}", routers.len(), self.path.display());
        Ok(routers)
    }

    /// Move an unparsable profile file aside so the next write keeps it.
    /// Returns false when the file is still in place.
    fn quarantine(&self) -> bool {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "routers.toml".to_string());
        let target = self.path.with_file_name(format!(
            "{}.corrupt-{}",
            file_name,
            Utc::now().format("%Y%m%d%H%M%S")
        ));

        match fs::rename(&self.path, &target) {
            Ok(()) => {
                warn!("Moved unreadable profile file to {}", target.display());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to move unreadable profile file {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }

    /// Decide the secret for the record being saved, applying keychain
    /// writes up front. Returns the undo record for those writes.
    fn resolve_secret(
        &self,
        name: &str,
        payload: &SaveRouterPayload,
        previous: Option<&StoredRouter>,
    ) -> Result<(Secret, Option<KeychainUndo>)> {
        let secrets = self.vault.secrets();

        if let Some(password) = payload.new_password() {
            return match secrets {
                Some(secrets) => {
                    let undo = KeychainUndo {
                        account: name.to_string(),
                        previous: secrets.get(name)?.map(Zeroizing::new),
                    };
                    secrets.set(name, password)?;
                    Ok((Secret::Keychain, Some(undo)))
                }
                None => Ok((Secret::Inline(Zeroizing::new(password.to_string())), None)),
            };
        }

        let Some(previous) = previous else {
            return Ok((Secret::None, None));
        };

        // Keep the stored password. A keychain entry follows a rename.
        match (&previous.secret, secrets) {
            (Secret::Keychain, Some(secrets)) if previous.name != name => {
                let Some(password) = secrets.get(&previous.name)?.map(Zeroizing::new) else {
                    return Ok((Secret::None, None));
                };
                let undo = KeychainUndo {
                    account: name.to_string(),
                    previous: secrets.get(name)?.map(Zeroizing::new),
                };
                secrets.set(name, &password)?;
                Ok((Secret::Keychain, Some(undo)))
            }
            (secret, _) => Ok((secret.clone(), None)),
        }
    }

    fn rollback_keychain(&self, undo: KeychainUndo) {
        let Some(secrets) = self.vault.secrets() else {
            return;
        };
        let result = match &undo.previous {
            Some(previous) => secrets.set(&undo.account, previous),
            None => secrets.remove(&undo.account),
        };
        if let Err(e) = result {
            warn!("Failed to roll back keychain entry '{}': {}", undo.account, e);
        }
    }

    fn remove_keychain_entry(&self, account: &str) {
        if let Some(secrets) = self.vault.secrets() {
            if let Err(e) = secrets.remove(account) {
                warn!("Failed to remove keychain entry '{}': {}", account, e);
            }
        }
    }

    fn persist(&self, routers: &[StoredRouter]) -> Result<()> {
        let inline_empty = matches!(self.vault, PasswordVault::File);
        let file = RoutersFile {
            routers: routers
                .iter()
                .map(|r| RouterRecord {
                    name: r.name.clone(),
                    address: r.address.clone(),
                    login: r.login.clone(),
                    password: match &r.secret {
                        Secret::Inline(password) => Some(password.to_string()),
                        Secret::None if inline_empty => Some(String::new()),
                        _ => None,
                    },
                    password_stored: r.secret == Secret::Keychain,
                })
                .collect(),
        };

        let contents = Zeroizing::new(toml::to_string_pretty(&file)?);
        write_atomic(&self.path, contents.as_bytes()).map_err(|e| {
            Error::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        debug!("Saved {} router(s) to {}", routers.len(), self.path.display());
        Ok(())
    }
}

/// Write through a sibling temp file, fsync, then rename over `path`
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "routers.toml".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| {
        let mut file = create_private(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Create a file readable only by the current user (Unix)
fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keychain::memory::MemorySecretStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn file_store(temp_dir: &TempDir) -> RouterStore {
        RouterStore::new(temp_dir.path().join("routers.toml"), PasswordVault::File)
    }

    /// Secret store shared between the test and the store under test
    struct SharedSecrets(Arc<MemorySecretStore>);

    impl SecretStore for SharedSecrets {
        fn get(&self, account: &str) -> Result<Option<String>> {
            self.0.get(account)
        }
        fn set(&self, account: &str, secret: &str) -> Result<()> {
            self.0.set(account, secret)
        }
        fn remove(&self, account: &str) -> Result<()> {
            self.0.remove(account)
        }
    }

    fn keychain_store(path: PathBuf) -> (RouterStore, Arc<MemorySecretStore>) {
        let secrets = Arc::new(MemorySecretStore::default());
        let vault = PasswordVault::Keychain(Box::new(SharedSecrets(secrets.clone())));
        (RouterStore::new(path, vault), secrets)
    }

    fn names(store: &RouterStore) -> Vec<String> {
        store.list().unwrap().into_iter().map(|r| r.name).collect()
    }

    fn password_of(store: &RouterStore, name: &str) -> String {
        store.credentials(name).unwrap().password.unwrap()
    }

    #[test]
    fn test_store_is_lazy() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        assert!(!store.is_loaded());

        assert!(store.list().unwrap().is_empty());
        assert!(store.is_loaded());
        // Reading never creates the file
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_then_list_redacts_password() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store
            .save(&SaveRouterPayload::create("r1", "192.168.1.1", "admin", "x"))
            .unwrap();

        let routers = store.list().unwrap();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].name, "r1");
        assert_eq!(routers[0].address, "192.168.1.1");
        assert_eq!(routers[0].login, "admin");
        assert_eq!(routers[0].password, None);
        assert!(routers[0].password_stored);

        assert_eq!(password_of(&store, "r1"), "x");
    }

    #[test]
    fn test_rename_preserves_position_and_password() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "192.168.1.1", "admin", "x")).unwrap();
        store.save(&SaveRouterPayload::create("r2", "192.168.2.1", "admin", "y")).unwrap();
        store.save(&SaveRouterPayload::create("r3", "192.168.3.1", "admin", "z")).unwrap();

        let rename = SaveRouterPayload::update("r1", "r1-renamed", "192.168.1.1", "admin")
            .with_password("");
        store.save(&rename).unwrap();

        assert_eq!(names(&store), vec!["r1-renamed", "r2", "r3"]);
        assert!(matches!(store.credentials("r1"), Err(Error::NotFound(_))));
        assert_eq!(password_of(&store, "r1-renamed"), "x");
    }

    #[test]
    fn test_update_replaces_password_when_given() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "old")).unwrap();
        store
            .save(&SaveRouterPayload::update("r1", "r1", "10.0.0.2", "root").with_password("new"))
            .unwrap();

        let profile = store.credentials("r1").unwrap();
        assert_eq!(profile.address, "10.0.0.2");
        assert_eq!(profile.login, "root");
        assert_eq!(profile.password.as_deref(), Some("new"));
    }

    #[test]
    fn test_create_duplicate_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x")).unwrap();
        let err = store
            .save(&SaveRouterPayload::create("r1", "10.0.0.9", "other", "y"))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateName(_)));
        let routers = store.list().unwrap();
        assert_eq!(routers.len(), 1);
        assert_eq!(routers[0].address, "10.0.0.1");
        assert_eq!(password_of(&store, "r1"), "x");
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "", "")).unwrap();
        store.save(&SaveRouterPayload::create("r2", "10.0.0.2", "", "")).unwrap();

        let err = store
            .save(&SaveRouterPayload::update("r1", "r2", "10.0.0.1", ""))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(names(&store), vec!["r1", "r2"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("Home", "10.0.0.1", "", "")).unwrap();
        store.save(&SaveRouterPayload::create("home", "10.0.0.2", "", "")).unwrap();
        assert_eq!(names(&store), vec!["Home", "home"]);
    }

    #[test]
    fn test_update_unknown_original_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        let err = store
            .save(&SaveRouterPayload::update("ghost", "ghost", "10.0.0.1", ""))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_validation_leaves_storage_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        let err = store
            .save(&SaveRouterPayload::create("  ", "10.0.0.1", "", ""))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = store
            .save(&SaveRouterPayload::create("r1", "   ", "", ""))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(!store.path().exists());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_normalizes_name_and_address() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store
            .save(&SaveRouterPayload::create(" r1 ", "http://192.168.1.1/", "admin", ""))
            .unwrap();
        let routers = store.list().unwrap();
        assert_eq!(routers[0].name, "r1");
        assert_eq!(routers[0].address, "http://192.168.1.1");
        assert!(!routers[0].password_stored);
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "", "")).unwrap();
        store.save(&SaveRouterPayload::create("r2", "10.0.0.2", "", "")).unwrap();

        store.delete("r1").unwrap();
        assert_eq!(names(&store), vec!["r2"]);

        let err = store.delete("r1").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(names(&store), vec!["r2"]);

        // Persisted
        let reopened = file_store(&temp_dir);
        assert_eq!(names(&reopened), vec!["r2"]);
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("office", "10.1.0.1", "admin", "p@ss=\"1\"")).unwrap();
        store.save(&SaveRouterPayload::create("home", "192.168.1.1", "", "")).unwrap();
        store.save(&SaveRouterPayload::create("lab", "lab.local", "root", "")).unwrap();

        let reopened = file_store(&temp_dir);
        for name in ["office", "home", "lab"] {
            assert_eq!(
                reopened.credentials(name).unwrap(),
                store.credentials(name).unwrap()
            );
        }
        assert_eq!(names(&reopened), vec!["office", "home", "lab"]);
        assert_eq!(password_of(&reopened, "office"), "p@ss=\"1\"");
        assert_eq!(password_of(&reopened, "home"), "");
        assert_eq!(reopened.credentials("home").unwrap().login, "");
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        fs::write(&path, "[[routers]\nname = ").unwrap();

        let store = RouterStore::new(path.clone(), PasswordVault::File);
        assert!(matches!(store.list(), Err(Error::Storage(_))));
        assert!(store.list().unwrap().is_empty());

        // The unreadable file was moved aside, not overwritten
        assert!(!path.exists());
        let quarantined = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with("routers.toml.corrupt-"));
        assert!(quarantined);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "", "")).unwrap();
        assert_eq!(names(&store), vec!["r1"]);
    }

    #[test]
    fn test_non_utf8_file_is_quarantined() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        let original = b"[[routers]]\nname = \"r\xff\"\naddress = \"10.0.0.1\"\n".to_vec();
        fs::write(&path, &original).unwrap();

        let store = RouterStore::new(path.clone(), PasswordVault::File);
        assert!(matches!(store.list(), Err(Error::Storage(_))));

        store.save(&SaveRouterPayload::create("new", "10.0.0.2", "", "")).unwrap();
        assert_eq!(names(&store), vec!["new"]);

        // The original bytes survive next to the new profile file
        let quarantined: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("routers.toml.corrupt-"))
            .collect();
        assert_eq!(quarantined.len(), 1);
        assert_eq!(fs::read(quarantined[0].path()).unwrap(), original);
    }

    #[test]
    fn test_unreadable_file_blocks_writes() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the profile file should be cannot be read
        let path = temp_dir.path().join("routers.toml");
        fs::create_dir(&path).unwrap();

        let store = RouterStore::new(path.clone(), PasswordVault::File);
        assert!(matches!(store.list(), Err(Error::Storage(_))));
        assert!(!store.is_loaded());

        let err = store
            .save(&SaveRouterPayload::create("r1", "10.0.0.1", "", ""))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(store.list().is_err());
        assert!(path.is_dir());
    }

    #[test]
    fn test_load_skips_duplicate_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        fs::write(
            &path,
            r#"
[[routers]]
name = "r1"
address = "10.0.0.1"

[[routers]]
name = "r1"
address = "10.0.0.2"

[[routers]]
name = "r2"
address = "10.0.0.3"
login = "admin"
"#,
        )
        .unwrap();

        let store = RouterStore::new(path, PasswordVault::File);
        let routers = store.list().unwrap();
        assert_eq!(routers.len(), 2);
        assert_eq!(routers[0].address, "10.0.0.1");
        assert_eq!(routers[1].login, "admin");
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        let other = file_store(&temp_dir);

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "", "")).unwrap();
        assert!(other.list().unwrap().len() == 1);

        store.save(&SaveRouterPayload::create("r2", "10.0.0.2", "", "")).unwrap();
        assert_eq!(names(&other), vec!["r1"]);

        other.reload().unwrap();
        assert_eq!(names(&other), vec!["r1", "r2"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_profile_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_concurrent_saves_serialize() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(file_store(&temp_dir));

        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    let name = format!("r{}", i);
                    store
                        .save(&SaveRouterPayload::create(&name, "10.0.0.1", "", ""))
                        .unwrap();
                });
            }
        });

        assert_eq!(store.list().unwrap().len(), 8);
        let reopened = file_store(&temp_dir);
        assert_eq!(reopened.list().unwrap().len(), 8);
    }

    #[test]
    fn test_keychain_passwords_stay_out_of_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        let (store, secrets) = keychain_store(path.clone());

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "hunter2")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("hunter2"));
        assert!(contents.contains("password_stored = true"));
        assert_eq!(secrets.get_raw("r1").as_deref(), Some("hunter2"));
        assert_eq!(password_of(&store, "r1"), "hunter2");
    }

    #[test]
    fn test_keychain_entry_follows_rename_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let (store, secrets) = keychain_store(temp_dir.path().join("routers.toml"));

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x")).unwrap();
        store.save(&SaveRouterPayload::update("r1", "r1-renamed", "10.0.0.1", "admin")).unwrap();

        assert_eq!(secrets.get_raw("r1"), None);
        assert_eq!(secrets.get_raw("r1-renamed").as_deref(), Some("x"));
        assert_eq!(password_of(&store, "r1-renamed"), "x");

        store.delete("r1-renamed").unwrap();
        assert_eq!(secrets.get_raw("r1-renamed"), None);
    }

    #[test]
    fn test_keychain_failure_leaves_store_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        let (store, secrets) = keychain_store(path.clone());

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        secrets.set_fail_writes(true);
        let err = store
            .save(&SaveRouterPayload::create("r2", "10.0.0.2", "admin", "y"))
            .unwrap_err();
        assert!(matches!(err, Error::Keychain(_)));

        assert_eq!(names(&store), vec!["r1"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_file_write_failure_rolls_back_keychain() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the profile directory should be
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let (store, secrets) = keychain_store(blocker.join("routers.toml"));

        let err = store
            .save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(secrets.get_raw("r1"), None);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_missing_keychain_entry_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let (store, secrets) = keychain_store(temp_dir.path().join("routers.toml"));

        store.save(&SaveRouterPayload::create("r1", "10.0.0.1", "admin", "x")).unwrap();
        secrets.remove("r1").unwrap();

        assert!(store.list().unwrap()[0].password_stored);
        assert!(matches!(store.credentials("r1"), Err(Error::Keychain(_))));
    }

    #[test]
    fn test_inline_password_honoured_in_keychain_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("routers.toml");
        fs::write(
            &path,
            "[[routers]]\nname = \"r1\"\naddress = \"10.0.0.1\"\nlogin = \"admin\"\npassword = \"legacy\"\n",
        )
        .unwrap();

        let (store, _secrets) = keychain_store(path);
        assert_eq!(password_of(&store, "r1"), "legacy");
    }
}
