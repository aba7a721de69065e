// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// System tray icon implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use ksni::menu::StandardItem;
use router_tray_common::{MenuAction, MenuBackend, MenuEntry, TrayMenu};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, warn};

use crate::launcher::Launcher;
use crate::notifications;

/// Requests from the tray thread to the main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// Reload the profile file and rebuild the menu
    Refresh,
    /// Icon clicked: refresh, then show the router count
    Activate,
    Quit,
}

/// Tray icon service
pub struct TrayIcon {
    menu: TrayMenu,
    launcher: Launcher,
    events: UnboundedSender<TrayEvent>,
}

impl TrayIcon {
    pub fn new(launcher: Launcher, events: UnboundedSender<TrayEvent>) -> Self {
        Self {
            menu: TrayMenu::placeholder(),
            launcher,
            events,
        }
    }

    fn send(&self, event: TrayEvent) {
        if self.events.send(event).is_err() {
            warn!("Main loop is gone, dropping tray event {:?}", event);
        }
    }

    fn open_settings(&self) {
        if let Err(e) = self.launcher.open_settings() {
            warn!("Failed to open settings: {:#}", e);
            notifications::show_error_notification("Cannot open settings", &format!("{:#}", e));
        }
    }

    fn handle_action(&mut self, action: &MenuAction) {
        match action {
            MenuAction::OpenRouter { name, url } => {
                if let Err(e) = self.launcher.open_url(url) {
                    warn!("Failed to open router '{}': {:#}", name, e);
                    notifications::show_error_notification(
                        &format!("Cannot open {}", name),
                        &format!("{:#}", e),
                    );
                }
            }
            MenuAction::OpenSettings | MenuAction::AddRouter => self.open_settings(),
            MenuAction::Refresh => self.send(TrayEvent::Refresh),
            MenuAction::Quit => self.send(TrayEvent::Quit),
        }
    }

    fn menu_items(&self) -> Vec<ksni::MenuItem<Self>> {
        self.menu
            .entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Separator => ksni::MenuItem::Separator,
                MenuEntry::Item {
                    label,
                    enabled,
                    action,
                    ..
                } => {
                    let mut item = StandardItem {
                        label: label.clone(),
                        enabled: *enabled,
                        ..Default::default()
                    };
                    if let Some(action) = action.clone() {
                        item.activate = Box::new(move |this: &mut Self| this.handle_action(&action));
                    }
                    ksni::MenuItem::Standard(item)
                }
            })
            .collect()
    }
}

impl ksni::Tray for TrayIcon {
    fn icon_name(&self) -> String {
        "network-wired".to_string()
    }

    fn title(&self) -> String {
        self.menu.title.clone()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.menu.tooltip.clone(),
            ..Default::default()
        }
    }

    fn id(&self) -> String {
        "router-tray".to_string()
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::ApplicationStatus
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        self.menu_items()
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.send(TrayEvent::Activate);
    }

    fn secondary_activate(&mut self, _x: i32, _y: i32) {
        self.open_settings();
    }
}

/// Menu backend driving the ksni tray service
pub struct KsniBackend {
    handle: Mutex<ksni::Handle<TrayIcon>>,
    running: Arc<AtomicBool>,
}

impl MenuBackend for KsniBackend {
    fn install(&self, menu: TrayMenu) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            anyhow::bail!("Tray service is not running");
        }

        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        handle.update(move |tray: &mut TrayIcon| {
            tray.menu = menu;
        });
        Ok(())
    }
}

/// Start the tray service on its own thread (ksni needs a dedicated thread)
pub fn spawn_tray(launcher: Launcher, events: UnboundedSender<TrayEvent>) -> Result<KsniBackend> {
    let service = ksni::TrayService::new(TrayIcon::new(launcher, events));
    let handle = service.handle();

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    std::thread::Builder::new()
        .name("tray".to_string())
        .spawn(move || {
            if let Err(e) = service.run() {
                error!("Tray service stopped: {}", e);
            }
            flag.store(false, Ordering::SeqCst);
        })
        .context("Failed to start tray thread")?;

    Ok(KsniBackend {
        handle: Mutex::new(handle),
        running,
    })
}
