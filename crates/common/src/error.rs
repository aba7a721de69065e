// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Error types for Router Tray

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid router profile: {0}")]
    Validation(String),

    #[error("Router with this name already exists: {0}")]
    DuplicateName(String),

    #[error("Router not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Failure category reported to presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DuplicateName,
    NotFound,
    Storage,
}

impl Error {
    /// Classify this error. Everything that is not a caller mistake
    /// (I/O, parsing, keychain, configuration) is a storage failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::DuplicateName(_) => ErrorKind::DuplicateName,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Storage(_)
            | Error::Keychain(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Toml(_)
            | Error::TomlSerialize(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
