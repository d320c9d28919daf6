//! pollx CLI
//!
//! Command-line driver for the poll repository. Poll trees go in and come
//! out as JSON on stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "pollx")]
#[command(about = "pollx - Poll aggregate storage", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log profile (development or production); logging is off when unset
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,
    /// Create a poll
    Create(commands::poll::CreateArgs),
    /// Print every poll as JSON
    List,
    /// Print one poll as JSON
    Show(commands::poll::IdArgs),
    /// Upsert a poll tree read from a JSON file
    Import(commands::poll::ImportArgs),
    /// Write one poll as JSON to a file or stdout
    Export(commands::poll::ExportArgs),
    /// Delete a poll and everything it owns
    Delete(commands::poll::IdArgs),
    /// Grant a user access to a poll
    Grant(commands::access::GrantArgs),
    /// Revoke a user's access to a poll
    Revoke(commands::access::GrantArgs),
    /// List access grants on a poll
    Grants(commands::poll::IdArgs),
    /// Local user directory
    User(commands::user::UserArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = config::Config::resolve(cli.db, cli.config, cli.log).and_then(|config| {
        if let Some(profile) = config.log_profile {
            pollx_core::logging_facility::init(profile);
        }
        match cli.command {
            Commands::Init => commands::init(&config),
            Commands::Create(args) => commands::poll::create(&config, args),
            Commands::List => commands::poll::list(&config),
            Commands::Show(args) => commands::poll::show(&config, args),
            Commands::Import(args) => commands::poll::import(&config, args),
            Commands::Export(args) => commands::poll::export(&config, args),
            Commands::Delete(args) => commands::poll::delete(&config, args),
            Commands::Grant(args) => commands::access::grant(&config, args),
            Commands::Revoke(args) => commands::access::revoke(&config, args),
            Commands::Grants(args) => commands::access::list(&config, args),
            Commands::User(args) => commands::user::execute(&config, args),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
