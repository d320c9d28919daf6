//! Access grant commands

use clap::Args;
use pollx_core::Access;
use serde_json::json;

use super::{open_repository, parse_id, print_json, CommandResult};
use crate::commands::poll::IdArgs;
use crate::config::Config;

#[derive(Debug, Args)]
pub struct GrantArgs {
    /// Poll identifier
    pub poll: String,

    /// User identifier
    pub user: String,
}

fn grant_json(access: &Access) -> serde_json::Value {
    json!({
        "token": access.token.expose(),
        "user_id": access.user.id,
        "user_name": access.user.name,
        "poll_id": access.poll_id,
    })
}

/// Prints the grant including its token; the token is the credential
pub fn grant(config: &Config, args: GrantArgs) -> CommandResult {
    let repo = open_repository(config)?;
    let access = repo.grant_access(parse_id(&args.user, "user")?, parse_id(&args.poll, "poll")?)?;
    repo.close()?;
    print_json(&grant_json(&access))
}

pub fn revoke(config: &Config, args: GrantArgs) -> CommandResult {
    let repo = open_repository(config)?;
    repo.revoke_access(parse_id(&args.user, "user")?, parse_id(&args.poll, "poll")?)?;
    repo.close()?;
    println!("Revoked access of {} to {}", args.user, args.poll);
    Ok(())
}

pub fn list(config: &Config, args: IdArgs) -> CommandResult {
    let repo = open_repository(config)?;
    let grants = repo.list_access(parse_id(&args.id, "poll")?)?;
    repo.close()?;
    let rendered: Vec<_> = grants.iter().map(grant_json).collect();
    print_json(&rendered)
}
