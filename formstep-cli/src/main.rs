//! `formstep`: fill in multi-step forms from the terminal.
//!
//! Usage: formstep <COMMAND>
//! - fill: run a form, resuming its draft
//! - validate: check a definition file
//! - forms: list bundled forms
//! - drafts: list, show or clear saved drafts
//! - submissions: list what the backend has stored
//! - health: check the backend
//! - config: show or create the configuration

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod logging;

use cli::Cli;
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.overrides())?;

    match logging::init(&config.log_dir) {
        Ok(path) => tracing::info!(log = %path.display(), api = %config.api_base_url, "formstep starting"),
        Err(err) => eprintln!("Warning: logging disabled: {err:#}"),
    }

    let result = commands::execute(cli.command, &config);
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    result
}
