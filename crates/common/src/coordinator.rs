// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - Tray Coordinator
// Projects the router store into the active tray menu

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::menu::TrayMenu;
use crate::store::RouterStore;

/// Platform tray able to show a menu
pub trait MenuBackend: Send + Sync {
    /// Replace the active menu
    fn install(&self, menu: TrayMenu) -> Result<()>;
}

/// Anything that can rebuild the tray on request
pub trait TrayRefresh: Send + Sync {
    fn refresh(&self) -> Result<()>;
}

pub struct TrayCoordinator<B> {
    store: Arc<RouterStore>,
    backend: B,
    installed: Mutex<Option<TrayMenu>>,
}

impl<B: MenuBackend> TrayCoordinator<B> {
    pub fn new(store: Arc<RouterStore>, backend: B) -> Self {
        Self {
            store,
            backend,
            installed: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<RouterStore> {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Last menu successfully installed
    pub fn installed_menu(&self) -> Option<TrayMenu> {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rebuild the menu from the store and install it.
    ///
    /// On failure the previously installed menu stays active.
    pub fn refresh(&self) -> Result<()> {
        let result = self.rebuild();
        if let Err(e) = &result {
            warn!("Tray refresh failed, keeping previous menu: {:#}", e);
        }
        result
    }

    fn rebuild(&self) -> Result<()> {
        // Held across read and install so a stale snapshot never lands last
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);

        let routers = self.store.list().context("Failed to read routers")?;
        let menu = TrayMenu::from_routers(&routers);

        self.backend
            .install(menu.clone())
            .context("Failed to install tray menu")?;

        debug!("Tray menu refreshed with {} router(s)", routers.len());
        *installed = Some(menu);
        Ok(())
    }
}

impl<B: MenuBackend> TrayRefresh for TrayCoordinator<B> {
    fn refresh(&self) -> Result<()> {
        TrayCoordinator::refresh(self)
    }
}
