// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Profile file watcher - picks up edits made by other front-ends

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use router_tray_common::CommandHandler;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

/// Last observed modification time and size of a file
#[derive(Debug)]
pub struct FileWatch {
    path: PathBuf,
    last: Option<(SystemTime, u64)>,
}

impl FileWatch {
    pub fn new(path: PathBuf) -> Self {
        let last = signature(&path);
        Self { path, last }
    }

    /// Returns true when the file changed since the previous call
    pub fn changed(&mut self) -> bool {
        let current = signature(&self.path);
        if current != self.last {
            self.last = current;
            true
        } else {
            false
        }
    }

    /// Record the current state without reporting it as a change
    pub fn rescan(&mut self) {
        self.last = signature(&self.path);
    }
}

fn signature(path: &Path) -> Option<(SystemTime, u64)> {
    let metadata = fs::metadata(path).ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}

/// Reload the store and rebuild the tray whenever the profile file changes
pub async fn watch_profile_file(commands: CommandHandler, poll_interval: Duration) {
    let mut watch = FileWatch::new(commands.store().path().to_path_buf());
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !watch.changed() {
            continue;
        }

        debug!("Profile file changed: {}", commands.store().path().display());
        let commands = commands.clone();
        // Failures are logged by the command handler, the old menu stays
        let reload = tokio::task::spawn_blocking(move || commands.reload_and_refresh());
        if let Err(e) = reload.await {
            warn!("Reload task failed: {}", e);
        }

        // A quarantined file disappears; that is not an edit to pick up
        watch.rescan();
    }
}
