//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::AgentContext;
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_PATH;

/// Platform manageability agent: drives Intel AMT activation
#[derive(Parser)]
#[command(
    name = "pma",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to the agent configuration file
    #[arg(long, global = true, env = "PMA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile AMT activation every heartbeat until stopped
    Run,

    /// Run a single reconciliation step
    Once,

    /// Show the AMT state reported by the activation tool
    Amtinfo {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    CheckConfig,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command
    /// fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli { config, command } = self;
        let app = AgentContext::load(config)?;
        app.init_tracing();

        match command {
            Command::Run => commands::run::run(&app).await,
            Command::Once => commands::run::once(&app).await,
            Command::Amtinfo { json } => commands::amtinfo::run(&app, json).await,
            Command::CheckConfig => Ok(commands::check_config::run(&app)),
        }
    }
}
