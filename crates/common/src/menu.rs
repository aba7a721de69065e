// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

//! Platform-neutral tray menu model built from the router list

use crate::profile::RouterProfile;

pub const APP_TITLE: &str = "Router Tray";

/// What happens when a menu item is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Open the router web interface
    OpenRouter { name: String, url: String },
    OpenSettings,
    AddRouter,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item {
        id: String,
        label: String,
        enabled: bool,
        action: Option<MenuAction>,
    },
    Separator,
}

impl MenuEntry {
    fn action(id: &str, label: &str, action: MenuAction) -> Self {
        MenuEntry::Item {
            id: id.to_string(),
            label: label.to_string(),
            enabled: true,
            action: Some(action),
        }
    }

    fn info(id: &str, label: &str) -> Self {
        MenuEntry::Item {
            id: id.to_string(),
            label: label.to_string(),
            enabled: false,
            action: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            MenuEntry::Item { id, .. } => Some(id),
            MenuEntry::Separator => None,
        }
    }
}

/// Complete tray contents: title, tooltip and menu entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayMenu {
    pub title: String,
    pub tooltip: String,
    pub entries: Vec<MenuEntry>,
}

impl TrayMenu {
    /// Build the menu for the given routers, in collection order
    pub fn from_routers(routers: &[RouterProfile]) -> Self {
        let mut entries = Vec::new();

        if routers.is_empty() {
            entries.push(MenuEntry::info("info:no_routers", "No routers configured."));
            entries.push(MenuEntry::Separator);
            entries.push(MenuEntry::action("add_router", "Add Router...", MenuAction::AddRouter));
            entries.push(MenuEntry::action("quit", "Quit", MenuAction::Quit));

            return Self {
                title: APP_TITLE.to_string(),
                tooltip: format!("{} - no routers", APP_TITLE),
                entries,
            };
        }

        for router in routers {
            entries.push(MenuEntry::action(
                &format!("router:{}", router.name),
                &format!("{} ({})", router.name, router.address),
                MenuAction::OpenRouter {
                    name: router.name.clone(),
                    url: router.web_url(),
                },
            ));
        }

        entries.push(MenuEntry::Separator);
        entries.push(MenuEntry::action("settings", "Open...", MenuAction::OpenSettings));
        entries.push(MenuEntry::action("refresh", "Refresh", MenuAction::Refresh));
        entries.push(MenuEntry::Separator);
        entries.push(MenuEntry::action("quit", "Quit", MenuAction::Quit));

        let count = match routers.len() {
            1 => "1 router".to_string(),
            n => format!("{} routers", n),
        };

        Self {
            title: APP_TITLE.to_string(),
            tooltip: format!("{} - {}", APP_TITLE, count),
            entries,
        }
    }

    /// Menu shown before the first successful refresh
    pub fn placeholder() -> Self {
        Self {
            title: APP_TITLE.to_string(),
            tooltip: APP_TITLE.to_string(),
            entries: vec![
                MenuEntry::info("info:loading", "Loading routers..."),
                MenuEntry::Separator,
                MenuEntry::action("quit", "Quit", MenuAction::Quit),
            ],
        }
    }
}
