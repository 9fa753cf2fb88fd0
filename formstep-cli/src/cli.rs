//! Command-line arguments.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use formstep::SchemaSource;
use std::path::{Path, PathBuf};

use crate::config::{FrontendKind, Overrides};

/// Fill in multi-step forms from the terminal
#[derive(Debug, Parser)]
#[command(name = "formstep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the forms backend
    #[arg(long, global = true, env = "FORMSTEP_API_URL")]
    pub api_url: Option<String>,

    /// Directory for saved drafts
    #[arg(long, global = true)]
    pub draft_dir: Option<PathBuf>,

    /// Frontend used by `fill`
    #[arg(long, global = true)]
    pub frontend: Option<FrontendKind>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill in a form, resuming its draft if there is one
    Fill {
        #[command(flatten)]
        source: SourceArgs,

        /// Keep the draft in memory only
        #[arg(long)]
        no_drafts: bool,

        /// Plain prompts without colors (selects the dialoguer frontend)
        #[arg(long)]
        plain: bool,
    },

    /// Check a form definition file and describe it
    Validate {
        file: PathBuf,
    },

    /// List the bundled forms
    Forms,

    /// Inspect or discard saved drafts
    Drafts {
        #[command(subcommand)]
        command: DraftsCommand,
    },

    /// List submissions stored by the backend
    Submissions {
        /// Only show this form type
        #[arg(long)]
        form_type: Option<String>,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the backend is reachable
    Health,

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum DraftsCommand {
    /// List draft files
    List,
    /// Print the saved draft of a form
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Delete the saved draft of a form
    Clear {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Write ./.formstep/config.toml instead of the user config
        #[arg(long)]
        project: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Where a form definition comes from. Exactly one must be given.
#[derive(Debug, Clone, Default, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// A JSON file, an http(s) URL, or a bundled form name
    pub form: Option<String>,

    /// Local JSON definition
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Definition document by URL or path on the backend
    #[arg(long)]
    pub url: Option<String>,

    /// Definition stored by the backend under this slug
    #[arg(long)]
    pub slug: Option<String>,

    /// Form bundled with formstep
    #[arg(long)]
    pub bundled: Option<String>,
}

impl SourceArgs {
    pub fn to_source(&self) -> Result<SchemaSource> {
        if let Some(path) = &self.file {
            return Ok(SchemaSource::File(path.clone()));
        }
        if let Some(url) = &self.url {
            return Ok(SchemaSource::Url(url.clone()));
        }
        if let Some(slug) = &self.slug {
            return Ok(SchemaSource::Remote(slug.clone()));
        }
        if let Some(name) = &self.bundled {
            return Ok(SchemaSource::Bundled(name.clone()));
        }
        match &self.form {
            Some(form) => Ok(guess_source(form)),
            None => bail!("No form given"),
        }
    }
}

fn guess_source(form: &str) -> SchemaSource {
    if form.starts_with("http://") || form.starts_with("https://") {
        SchemaSource::Url(form.to_string())
    } else if form.ends_with(".json") || Path::new(form).is_file() {
        SchemaSource::File(PathBuf::from(form))
    } else {
        SchemaSource::Bundled(form.to_string())
    }
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_base_url: self.api_url.clone(),
            draft_dir: self.draft_dir.clone(),
            frontend: self.frontend,
        }
    }
}
