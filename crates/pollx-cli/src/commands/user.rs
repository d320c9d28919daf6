//! Local user directory commands

use clap::{Args, Subcommand};
use pollx_core::{Role, User};

use super::{open_directory, print_json, CommandResult};
use crate::config::Config;

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a user and print it
    Add(AddArgs),
    /// Print every user
    List,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// SUPER_ADMIN, POLL_ADMIN, REGULAR_USER or TEMPORARY
    #[arg(long, default_value = "REGULAR_USER")]
    pub role: String,
}

pub fn execute(config: &Config, args: UserArgs) -> CommandResult {
    let directory = open_directory(config)?;
    match args.command {
        UserCommand::Add(add) => {
            let role: Role = add.role.parse()?;
            let user = User::new(add.name, add.email, role);
            directory.create(&user)?;
            print_json(&user)
        }
        UserCommand::List => print_json(&directory.list()?),
    }
}
