#![warn(missing_docs)]

//! Entry point for the `launchkeys` binary.

mod cli;
mod commands;
mod error;

use std::process;

use clap::Parser;
use tracing::{debug, error};

use crate::{
    cli::{Cli, Commands},
    commands::Settings,
    error::Result,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen command.
fn run() -> Result<()> {
    let Cli {
        log,
        settings,
        command,
    } = Cli::parse();
    logging::init(&log.spec());

    let path = config::resolve_settings_path(settings.as_deref());
    debug!(settings = %path.display(), "settings_path_resolved");
    let settings = Settings::open(&path);

    let output = match command.unwrap_or(Commands::Run) {
        Commands::Run => {
            commands::run(&settings)?;
            return Ok(());
        }
        Commands::List => commands::list(&settings.bindings()),
        Commands::Assign { slot, path } => commands::assign(&settings.bindings(), slot, &path)?,
        Commands::Clear { slot } => commands::clear(&settings.bindings(), slot)?,
        Commands::Launch { slot } => commands::launch(
            &settings.bindings(),
            mac_apps::system_ops(),
            settings.policy(login_item::system_service()),
            slot,
        )?,
        Commands::Behavior { value } => {
            commands::behavior(&settings.policy(login_item::system_service()), value)?
        }
        Commands::Login { value } => commands::login(
            &settings.policy(login_item::system_service()),
            value.map(cli::Toggle::enabled),
        )?,
    };
    println!("{output}");
    Ok(())
}
