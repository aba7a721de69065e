// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - System Tray
// Router list in the system tray, backed by the router store

use std::sync::Arc;

use anyhow::{Context, Result};
use router_tray_common::{CommandHandler, RouterStore, Settings, TrayCoordinator};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod launcher;
mod notifications;
mod tray;
mod watcher;

use launcher::Launcher;
use tray::TrayEvent;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "router_tray=info,router_tray_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Router Tray {} starting...", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("Failed to load settings")?;
    let store = Arc::new(RouterStore::from_settings(&settings));

    // Tray thread -> main loop
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let backend = tray::spawn_tray(Launcher::from_settings(&settings), event_tx)?;
    let coordinator = Arc::new(TrayCoordinator::new(store.clone(), backend));
    let commands = CommandHandler::new(store).with_tray(coordinator.clone());

    // Initial menu
    {
        let commands = commands.clone();
        tokio::task::spawn_blocking(move || commands.refresh_tray())
            .await
            .context("Initial tray refresh panicked")?;
    }

    tokio::spawn(watcher::watch_profile_file(
        commands.clone(),
        Duration::from_secs(settings.poll_interval_secs),
    ));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event @ (TrayEvent::Refresh | TrayEvent::Activate)) => {
                    let commands = commands.clone();
                    let coordinator = coordinator.clone();
                    tokio::task::spawn_blocking(move || {
                        if let Err(e) = commands.reload_and_refresh() {
                            notifications::show_error_notification(
                                "Cannot read router list",
                                &e.message,
                            );
                            return;
                        }
                        if event == TrayEvent::Activate {
                            if let Some(menu) = coordinator.installed_menu() {
                                notifications::show_status_notification(&menu.tooltip);
                            }
                        }
                    });
                }
                Some(TrayEvent::Quit) | None => break,
            },
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Router Tray exiting");
    Ok(())
}
