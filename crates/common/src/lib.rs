// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - Common Library
// Router store, tray menu projection and the command surface

pub mod commands;
pub mod coordinator;
pub mod error;
pub mod keychain;
pub mod menu;
pub mod profile;
pub mod settings;
pub mod store;

pub use commands::{Command, CommandError, CommandHandler, CommandResult, Response};
pub use coordinator::{MenuBackend, TrayCoordinator, TrayRefresh};
pub use error::{Error, ErrorKind, Result};
pub use keychain::{is_keychain_available, KeyringStore, SecretStore};
pub use menu::{MenuAction, MenuEntry, TrayMenu};
pub use profile::{RouterProfile, SaveRouterPayload};
pub use settings::{PasswordStorage, Settings};
pub use store::{PasswordVault, RouterStore};
