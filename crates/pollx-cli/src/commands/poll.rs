//! Poll commands

use std::path::PathBuf;

use clap::Args;
use pollx_core::Poll;

use super::{open_repository, parse_id, print_json, CommandResult};
use crate::config::Config;

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    /// Identifier of the administering user (see `pollx user add`)
    #[arg(long)]
    pub admin: String,

    /// SubPoll title; repeat for several
    #[arg(long = "sub-poll")]
    pub sub_polls: Vec<String>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Poll identifier
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON file holding one poll tree
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Poll identifier
    pub id: String,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn create(config: &Config, args: CreateArgs) -> CommandResult {
    let mut repo = open_repository(config)?;
    let admin = repo
        .directory()
        .require_user(parse_id(&args.admin, "admin")?)?;

    let mut poll = Poll::new(admin, args.name);
    for title in args.sub_polls {
        poll.add_sub_poll(title, "");
    }
    repo.upsert_poll(&poll)?;
    repo.close()?;

    print_json(&poll)
}

pub fn list(config: &Config) -> CommandResult {
    let repo = open_repository(config)?;
    let polls = repo.get_polls()?;
    repo.close()?;
    print_json(&polls)
}

pub fn show(config: &Config, args: IdArgs) -> CommandResult {
    let repo = open_repository(config)?;
    let poll = repo.get_poll(parse_id(&args.id, "poll")?)?;
    repo.close()?;
    print_json(&poll)
}

pub fn import(config: &Config, args: ImportArgs) -> CommandResult {
    let data = std::fs::read(&args.file)
        .map_err(|e| format!("cannot read {}: {}", args.file.display(), e))?;
    let poll = Poll::from_json(&data)?;

    let mut repo = open_repository(config)?;
    let report = repo.upsert_poll(&poll)?;
    repo.close()?;

    let total = report.total();
    println!(
        "Imported poll {} ({} inserted, {} updated, {} deleted)",
        poll.id(),
        total.inserted,
        total.updated,
        total.deleted
    );
    Ok(())
}

pub fn export(config: &Config, args: ExportArgs) -> CommandResult {
    let repo = open_repository(config)?;
    let poll = repo.get_poll(parse_id(&args.id, "poll")?)?;
    repo.close()?;

    let json = poll.to_json()?;
    match args.output {
        Some(path) => std::fs::write(&path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

pub fn delete(config: &Config, args: IdArgs) -> CommandResult {
    let mut repo = open_repository(config)?;
    let poll_id = parse_id(&args.id, "poll")?;
    let report = repo.delete_poll(poll_id)?;
    repo.close()?;

    println!(
        "Deleted poll {} ({} sub-polls, {} options, {} votes)",
        poll_id, report.sub_polls.deleted, report.options.deleted, report.votes.deleted
    );
    Ok(())
}
