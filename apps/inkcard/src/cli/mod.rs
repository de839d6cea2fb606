//! # Inkcard CLI
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create an empty card database
//! - `import-template` - Load a template from a JSON file
//! - `import-card` - Load a card from a JSON file
//! - `templates` - List stored templates
//! - `cards` - List an owner's cards
//! - `render` - Print a card's render tree
//! - `print` - Print a card's print layout and safety report
//! - `vcard` - Export a card as a vCard
//! - `share` - Print a card's public URL
//! - `stats` - Print a card's view counters

mod commands;

use crate::config::{Config, ConfigError};
use clap::{Parser, Subcommand};
use inkcard_core::CardError;
use std::path::PathBuf;
use thiserror::Error;

pub use commands::*;

// =============================================================================
// ERRORS
// =============================================================================

/// Failures surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Card(#[from] CardError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot encode output: {0}")]
    Output(#[source] serde_json::Error),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Inkcard - digital business cards
///
/// Binds cards to layout templates and exports them for screen, print and
/// address books.
#[derive(Parser, Debug)]
#[command(name = "inkcard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./inkcard.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the card database (overrides [store].path)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides [server].host)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Public base URL used in share links (overrides [server].site_base)
        #[arg(long)]
        site_base: Option<String>,
    },

    /// Initialize a new empty database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Import a template from a JSON file
    ImportTemplate {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import a card from a JSON file
    ImportCard {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List stored templates
    Templates,

    /// List the cards of an owner
    Cards { owner: String },

    /// Show the render tree of a card
    Render { card_id: String },

    /// Show the print layout of a card
    Print { card_id: String },

    /// Export a card as a vCard
    Vcard {
        card_id: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the public URL of a card
    Share { card_id: String },

    /// Show view counters of a card
    Stats { card_id: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.store.path = database;
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server {
            host,
            port,
            site_base,
        }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(site_base) = site_base {
                config.server.site_base = site_base;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::ImportTemplate { file }) => cmd_import_template(&config, &file, json_mode).await,
        Some(Commands::ImportCard { file }) => cmd_import_card(&config, &file, json_mode).await,
        Some(Commands::Cards { owner }) => cmd_cards(&config, &owner, json_mode).await,
        Some(Commands::Render { card_id }) => cmd_render(&config, &card_id, json_mode).await,
        Some(Commands::Print { card_id }) => cmd_print(&config, &card_id, json_mode).await,
        Some(Commands::Vcard { card_id, output }) => {
            cmd_vcard(&config, &card_id, output.as_deref()).await
        }
        Some(Commands::Share { card_id }) => cmd_share(&config, &card_id, json_mode).await,
        Some(Commands::Stats { card_id }) => cmd_stats(&config, &card_id, json_mode).await,
        // No subcommand: list templates
        Some(Commands::Templates) | None => cmd_templates(&config, json_mode).await,
    }
}
