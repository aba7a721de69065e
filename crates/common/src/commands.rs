// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - Command Surface
// Request/response commands consumed by presentation layers

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::coordinator::TrayRefresh;
use crate::error::{Error, ErrorKind};
use crate::profile::{RouterProfile, SaveRouterPayload};
use crate::store::RouterStore;

/// Typed failure rendered by the presentation layer as a status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<Error> for CommandError {
    fn from(err: Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Command addressed by name, e.g.
/// `{"command": "delete_router", "args": {"name": "r1"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    ListRouters,
    SaveRouter { payload: SaveRouterPayload },
    DeleteRouter { name: String },
    RefreshTray,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok {
        #[serde(default)]
        data: Value,
    },
    Error {
        error: CommandError,
    },
}

/// Entry point for presentation layers
#[derive(Clone)]
pub struct CommandHandler {
    store: Arc<RouterStore>,
    tray: Option<Arc<dyn TrayRefresh>>,
}

impl CommandHandler {
    pub fn new(store: Arc<RouterStore>) -> Self {
        Self { store, tray: None }
    }

    pub fn with_tray(mut self, tray: Arc<dyn TrayRefresh>) -> Self {
        self.tray = Some(tray);
        self
    }

    pub fn store(&self) -> &Arc<RouterStore> {
        &self.store
    }

    pub fn list_routers(&self) -> CommandResult<Vec<RouterProfile>> {
        self.store.list().map_err(|e| report("list_routers", e))
    }

    pub fn save_router(&self, payload: SaveRouterPayload) -> CommandResult<()> {
        self.store.save(&payload).map_err(|e| report("save_router", e))
    }

    pub fn delete_router(&self, name: &str) -> CommandResult<()> {
        self.store.delete(name).map_err(|e| report("delete_router", e))
    }

    /// Rebuild the tray menu. Failures are logged and otherwise ignored.
    pub fn refresh_tray(&self) {
        match &self.tray {
            Some(tray) => {
                if let Err(e) = tray.refresh() {
                    warn!("refresh_tray failed: {:#}", e);
                }
            }
            None => debug!("refresh_tray: no tray attached"),
        }
    }

    /// Re-read the profile file and rebuild the tray. When the file cannot
    /// be read the tray keeps its current menu.
    pub fn reload_and_refresh(&self) -> CommandResult<()> {
        self.store.reload().map_err(|e| report("reload", e))?;
        self.refresh_tray();
        Ok(())
    }

    pub fn dispatch(&self, command: Command) -> CommandResult<Value> {
        match command {
            Command::ListRouters => {
                let routers = self.list_routers()?;
                serde_json::to_value(routers).map_err(|e| CommandError::from(Error::from(e)))
            }
            Command::SaveRouter { payload } => self.save_router(payload).map(|_| Value::Null),
            Command::DeleteRouter { name } => self.delete_router(&name).map(|_| Value::Null),
            Command::RefreshTray => {
                self.refresh_tray();
                Ok(Value::Null)
            }
        }
    }

    /// Handle a JSON request and produce a JSON response
    pub fn dispatch_json(&self, request: &str) -> String {
        let response = match serde_json::from_str::<Command>(request) {
            Ok(command) => match self.dispatch(command) {
                Ok(data) => Response::Ok { data },
                Err(error) => Response::Error { error },
            },
            Err(e) => Response::Error {
                error: CommandError {
                    kind: ErrorKind::Validation,
                    message: format!("Invalid request: {}", e),
                },
            },
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","error":{{"kind":"storage","message":"{}"}}}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }
}

fn report(command: &str, err: Error) -> CommandError {
    warn!("{} failed: {}", command, err);
    CommandError::from(err)
}
