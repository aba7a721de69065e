// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router profile structures shared by the store, the tray and the CLI

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named router connection record as seen by presentation layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterProfile {
    /// Unique router name (primary key)
    pub name: String,
    /// Hostname or IP of the router web interface
    pub address: String,
    /// Login name, may be empty
    #[serde(default)]
    pub login: String,
    /// Stored password. Only populated by `RouterStore::credentials`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether a non-empty password is held for this router
    #[serde(default)]
    pub password_stored: bool,
}

impl RouterProfile {
    /// URL of the router web interface
    pub fn web_url(&self) -> String {
        if self.address.starts_with("http://") || self.address.starts_with("https://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        }
    }
}

/// Create/update request issued by a presentation layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRouterPayload {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub login: String,
    /// New password. `None` or empty keeps the stored one on update.
    #[serde(default)]
    pub password: Option<String>,
    /// Name of the entry being edited; absent for a new router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl SaveRouterPayload {
    /// Payload for a new router
    pub fn create(name: &str, address: &str, login: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            login: login.to_string(),
            password: Some(password.to_string()),
            original_name: None,
        }
    }

    /// Payload editing the router currently named `original_name`
    pub fn update(original_name: &str, name: &str, address: &str, login: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            login: login.to_string(),
            password: None,
            original_name: Some(original_name.to_string()),
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// The password supplied by the caller, if it is non-empty
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Validate and normalize the editable fields.
    ///
    /// Returns `(name, address)` trimmed, with trailing slashes removed from
    /// the address.
    pub fn normalized(&self) -> Result<(String, String)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Router name cannot be empty".to_string()));
        }

        let address = self.address.trim().trim_end_matches('/').trim_end();
        if address.is_empty() {
            return Err(Error::Validation(
                "Router address cannot be empty".to_string(),
            ));
        }

        Ok((name.to_string(), address.to_string()))
    }
}
