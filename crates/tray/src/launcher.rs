// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// External program launching for tray actions

use std::process::Command;

use anyhow::{Context, Result};
use router_tray_common::Settings;
use tracing::debug;

/// Launches the settings front-end and router web interfaces
#[derive(Debug, Clone, Default)]
pub struct Launcher {
    open_command: Option<String>,
    browser_command: Option<String>,
}

impl Launcher {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            open_command: settings.open_command.clone(),
            browser_command: settings.browser_command.clone(),
        }
    }

    /// Launch the configured settings front-end
    pub fn open_settings(&self) -> Result<()> {
        let command = self
            .open_command
            .as_deref()
            .context("No open_command configured in config.toml")?;
        let (program, args) = split_command(command).context("open_command is empty")?;

        debug!("Launching {}", command);
        Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("Failed to launch {}", program))?;
        Ok(())
    }

    /// Open a router web interface in the browser
    pub fn open_url(&self, url: &str) -> Result<()> {
        let (program, mut args) = match self.browser_command.as_deref() {
            Some(command) => split_command(command).context("browser_command is empty")?,
            None => default_opener(),
        };
        args.push(url);

        debug!("Opening {} with {}", url, program);
        Command::new(program)
            .args(&args)
            .spawn()
            .with_context(|| format!("Failed to open {}", url))?;
        Ok(())
    }
}

/// Split a configured command line into program and arguments
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn default_opener() -> (&'static str, Vec<&'static str>) {
    if cfg!(target_os = "macos") {
        ("open", Vec::new())
    } else if cfg!(target_os = "windows") {
        ("explorer", Vec::new())
    } else {
        ("xdg-open", Vec::new())
    }
}
