//! # fieldkit CLI Module
//!
//! This module implements the CLI interface for fieldkit.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize storage
//! - `status` - Show workspace counts
//! - `report` - Create, list, trash, restore and purge reports
//! - `validate` - Evaluate a draft file without saving
//! - `save` - Explicitly save a draft file
//! - `passive` - Record and list passive equipment
//! - `export` - Export a report as JSON
//! - `plan` - Look up a node in the plan

mod commands;

use crate::config::{Backend, Config};
use clap::{Parser, Subcommand};
use fieldkit_core::FieldError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// fieldkit - Field Inspection Server
///
/// Records node and amplifier inspections, decides when each one is
/// complete and saves it as soon as it is.
#[derive(Parser, Debug)]
#[command(name = "fieldkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./fieldkit.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Root directory for report folders and photos
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Plan CSV with node and technology columns
    #[arg(long, global = true)]
    pub plan: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<Config, FieldError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            config.storage.database = database.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(plan) = &self.plan {
            config.plan.csv = Some(plan.clone());
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
        Ok(config)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize storage
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show workspace status
    Status,

    /// Manage reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },

    /// Evaluate a draft JSON file without saving it
    Validate {
        /// Path to the draft file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Save a draft JSON file, rejecting incomplete or conflicting assets
    Save {
        /// Path to the draft file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Manage passive equipment observations
    Passive {
        #[command(subcommand)]
        action: PassiveCommand,
    },

    /// Export a report with assets, photos and passives
    Export {
        /// Report ID
        #[arg(short, long)]
        report: u64,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Query the plan table
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },
}

/// Report subcommands.
#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Create a report
    Create {
        /// Report name
        #[arg(short, long)]
        name: String,

        /// Node the report covers
        #[arg(long)]
        node: String,
    },

    /// List reports
    List {
        /// List the trash instead of active reports
        #[arg(long)]
        trashed: bool,
    },

    /// Move a report to the trash
    Trash { id: u64 },

    /// Bring a report back from the trash
    Restore { id: u64 },

    /// Delete a report with its assets, photos and folder
    Purge { id: u64 },
}

/// Passive equipment subcommands.
#[derive(Subcommand, Debug)]
pub enum PassiveCommand {
    /// Record a passive item
    Add {
        /// Report ID
        #[arg(short, long)]
        report: u64,

        /// Street address or pole reference
        #[arg(short, long)]
        address: String,

        /// tap, splitter, coupler, power-inserter or terminator
        #[arg(short, long)]
        kind: String,

        /// Free-text observation
        #[arg(short, long, default_value = "")]
        observation: String,
    },

    /// List passive items of a report
    List {
        /// Report ID
        #[arg(short, long)]
        report: u64,
    },
}

/// Plan subcommands.
#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Show the plan row for a node
    Check {
        /// Node name
        #[arg(short, long)]
        node: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), FieldError> {
    let config = cli.resolve_config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&config, host, port).await,
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Report { action }) => cmd_report(&config, json_mode, action),
        Some(Commands::Validate { file }) => cmd_validate(&config, json_mode, &file),
        Some(Commands::Save { file }) => cmd_save(&config, json_mode, &file),
        Some(Commands::Passive { action }) => cmd_passive(&config, json_mode, action),
        Some(Commands::Export { report, output }) => cmd_export(&config, report, &output),
        Some(Commands::Plan {
            action: PlanCommand::Check { node },
        }) => cmd_plan_check(&config, json_mode, &node),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "fieldkit",
            "--config",
            "/nonexistent/ignored.toml",
            "status",
        ]);
        // An explicit config file that does not exist is an error.
        assert!(cli.resolve_config().is_err());

        let cli = Cli::parse_from([
            "fieldkit",
            "--backend",
            "memory",
            "--database",
            "other.db",
            "--plan",
            "plan.csv",
            "status",
        ]);
        let config = cli.resolve_config().expect("config");
        assert_eq!(config.storage.backend, Backend::Memory);
        assert_eq!(config.storage.database, PathBuf::from("other.db"));
        assert_eq!(config.plan.csv, Some(PathBuf::from("plan.csv")));
    }

    #[test]
    fn nested_subcommands_parse() {
        let cli = Cli::parse_from(["fieldkit", "report", "create", "-n", "Zona", "--node", "N-1"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Report {
                action: ReportCommand::Create { .. }
            })
        ));

        let cli = Cli::parse_from(["fieldkit", "-q", "plan", "check", "--node", "N-1"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Some(Commands::Plan { .. })));
    }
}
