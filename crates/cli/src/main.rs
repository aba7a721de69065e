// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Router Tray Contributors

// Router Tray - CLI Client
// Command-line front-end for the router profile list

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use dialoguer::{Confirm, Input, Password};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use router_tray_common::{
    CommandHandler, RouterProfile, RouterStore, SaveRouterPayload, Settings,
};

#[derive(Parser)]
#[command(name = "router-tray-cli")]
#[command(about = "Manage Router Tray router profiles", long_about = None)]
#[command(version)]
struct Cli {
    /// Profile file to use instead of the configured one
    #[arg(long, global = true)]
    routers_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all routers
    List {
        /// Output as JSON for scripting
        #[arg(short, long)]
        json: bool,
    },

    /// Add a new router
    Add {
        /// Router name
        name: String,

        /// Router address (hostname or IP)
        #[arg(short, long)]
        address: Option<String>,

        /// Login name
        #[arg(short, long)]
        login: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Skip interactive prompts (use provided args only)
        #[arg(short = 'y', long)]
        non_interactive: bool,
    },

    /// Edit or rename a router
    Edit {
        /// Current router name
        name: String,

        /// New name
        #[arg(short = 'n', long)]
        rename: Option<String>,

        /// New address
        #[arg(short, long)]
        address: Option<String>,

        /// New login
        #[arg(short, long)]
        login: Option<String>,

        /// New password (the stored one is kept when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Skip interactive prompts (use provided args only)
        #[arg(short = 'y', long)]
        non_interactive: bool,
    },

    /// Delete a router
    Delete {
        /// Router name
        name: String,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show a router
    Show {
        /// Router name
        name: String,
    },

    /// Run a raw JSON command, e.g. '{"command":"list_routers"}'
    Exec {
        /// JSON request
        request: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(path) = cli.routers_file {
        settings.routers_file = path;
    }
    debug!("Using profile file {}", settings.routers_file.display());
    let commands = CommandHandler::new(Arc::new(RouterStore::from_settings(&settings)));

    match cli.command {
        Commands::List { json } => list_routers(&commands, json),
        Commands::Add {
            name,
            address,
            login,
            password,
            non_interactive,
        } => add_router(&commands, name, address, login, password, non_interactive),
        Commands::Edit {
            name,
            rename,
            address,
            login,
            password,
            non_interactive,
        } => edit_router(
            &commands,
            name,
            rename,
            address,
            login,
            password,
            non_interactive,
        ),
        Commands::Delete { name, yes } => delete_router(&commands, name, yes),
        Commands::Show { name } => show_router(&commands, name),
        Commands::Exec { request } => {
            println!("{}", commands.dispatch_json(&request));
            Ok(())
        }
    }
}

fn list_routers(commands: &CommandHandler, json: bool) -> Result<()> {
    let routers = commands.list_routers()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&routers)?);
        return Ok(());
    }

    if routers.is_empty() {
        println!("{}", "No routers configured.".yellow());
        println!("Add one with: {}", "router-tray-cli add <name>".cyan());
        return Ok(());
    }

    print_routers_table(&routers);
    Ok(())
}

fn print_routers_table(routers: &[RouterProfile]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Address").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Login").add_attribute(Attribute::Bold).fg(Color::Cyan),
        Cell::new("Password").add_attribute(Attribute::Bold).fg(Color::Cyan),
    ]);

    for router in routers {
        let login = if router.login.is_empty() {
            "-".to_string()
        } else {
            router.login.clone()
        };
        table.add_row(vec![
            Cell::new(&router.name).fg(Color::Green),
            Cell::new(&router.address),
            Cell::new(login),
            Cell::new(password_label(router)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{}", table);
    println!();
    println!("{} router(s)", routers.len().to_string().cyan());
    println!();
}

fn password_label(router: &RouterProfile) -> &'static str {
    if router.password_stored {
        "stored"
    } else {
        "none"
    }
}

fn add_router(
    commands: &CommandHandler,
    name: String,
    address: Option<String>,
    login: Option<String>,
    password: Option<String>,
    non_interactive: bool,
) -> Result<()> {
    println!("{}", "Adding router".bold().green());

    let address = match address {
        Some(address) => address,
        None if non_interactive => anyhow::bail!("Address is required in non-interactive mode"),
        None => Input::new()
            .with_prompt("Router address (hostname or IP)")
            .interact_text()?,
    };

    let login = match login {
        Some(login) => login,
        None if non_interactive => String::new(),
        None => Input::new()
            .with_prompt("Login")
            .default("admin".to_string())
            .allow_empty(true)
            .interact_text()?,
    };

    let password = match password {
        Some(password) => password,
        None if non_interactive => String::new(),
        None => Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()?,
    };

    commands.save_router(SaveRouterPayload::create(&name, &address, &login, &password))?;
    commands.refresh_tray();

    println!("{}", format!("Router '{}' added", name.trim()).green());
    Ok(())
}

fn find_router(commands: &CommandHandler, name: &str) -> Result<RouterProfile> {
    commands
        .list_routers()?
        .into_iter()
        .find(|r| r.name == name)
        .with_context(|| format!("Router '{}' not found", name))
}

#[allow(clippy::too_many_arguments)]
fn edit_router(
    commands: &CommandHandler,
    name: String,
    rename: Option<String>,
    address: Option<String>,
    login: Option<String>,
    password: Option<String>,
    non_interactive: bool,
) -> Result<()> {
    let current = find_router(commands, &name)?;
    let interactive = !non_interactive
        && rename.is_none()
        && address.is_none()
        && login.is_none()
        && password.is_none();

    let mut payload = if interactive {
        let new_name: String = Input::new()
            .with_prompt("Name")
            .default(current.name.clone())
            .interact_text()?;
        let new_address: String = Input::new()
            .with_prompt("Address")
            .default(current.address.clone())
            .interact_text()?;
        let new_login: String = Input::new()
            .with_prompt("Login")
            .default(current.login.clone())
            .allow_empty(true)
            .interact_text()?;
        SaveRouterPayload::update(&current.name, &new_name, &new_address, &new_login)
    } else {
        SaveRouterPayload::update(
            &current.name,
            rename.as_deref().unwrap_or(&current.name),
            address.as_deref().unwrap_or(&current.address),
            login.as_deref().unwrap_or(&current.login),
        )
    };

    if let Some(password) = password {
        payload = payload.with_password(&password);
    } else if interactive
        && Confirm::new()
            .with_prompt("Change password?")
            .default(false)
            .interact()?
    {
        let password = Password::new()
            .with_prompt("New password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?;
        payload = payload.with_password(&password);
    }

    let new_name = payload.name.trim().to_string();
    commands.save_router(payload)?;
    commands.refresh_tray();

    if new_name != name {
        println!("{}", format!("Router '{}' renamed to '{}'", name, new_name).green());
    } else {
        println!("{}", format!("Router '{}' updated", name).green());
    }
    Ok(())
}

fn delete_router(commands: &CommandHandler, name: String, yes: bool) -> Result<()> {
    // Fail early on unknown names before asking for confirmation
    find_router(commands, &name)?;

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete router '{}'?",
                name.yellow()
            ))
            .default(false)
            .interact()?;

        if !confirm {
            println!("{}", "Deletion cancelled".dimmed());
            return Ok(());
        }
    }

    commands.delete_router(&name)?;
    commands.refresh_tray();

    println!("{}", format!("Router '{}' deleted", name).green());
    Ok(())
}

fn show_router(commands: &CommandHandler, name: String) -> Result<()> {
    let router = find_router(commands, &name)?;

    println!();
    println!("{}", format!("Router: {}", router.name).bold().green());
    println!("  Address:  {}", router.address);
    println!("  Web UI:   {}", router.web_url().cyan());
    println!(
        "  Login:    {}",
        if router.login.is_empty() { "-" } else { &router.login }
    );
    println!("  Password: {}", password_label(&router).dimmed());
    println!();
    Ok(())
}
