//! `qnotes` - CLI for quicknotes
//!
//! This binary provides the command-line interface for listing, adding,
//! generating and deleting flashcard notes.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;

use quicknotes::cli::{Cli, Command, ConfigCommand, ListCommand, StatusCommand};
use quicknotes::config::RemoteBackend;
use quicknotes::session::{store_from_config, Session, StaticIdentity};
use quicknotes::storage::LocalCache;
use quicknotes::{init_logging, Config, HttpSummarizer, Note, StoreState};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;
    if let Some(user) = cli.user {
        config.session.user_id = user;
    }

    match cli.command {
        Command::Status(status_cmd) => handle_status(&config, &status_cmd)?,
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
        Command::List(list_cmd) => {
            let session = open_session(&config).await?;
            session.load().await?;
            print_notes(&session.state(), &list_cmd)?;
            return Ok(report_outcome(&session.state()));
        }
        Command::Add(add_cmd) => {
            let session = open_session(&config).await?;
            let note = session
                .new_note(add_cmd.title, add_cmd.content.unwrap_or_default())
                .await?;
            if session.state().error.is_none() {
                println!("Added note {}", note.id);
            }
            return Ok(report_outcome(&session.state()));
        }
        Command::Generate(generate_cmd) => {
            let session = open_session(&config).await?;
            let summarizer = HttpSummarizer::new(
                &config.summarizer.endpoint,
                &config.summarizer.default_title,
                config.summarizer_timeout(),
            )?;
            let note = session
                .summarize_into_note(&summarizer, &generate_cmd.text)
                .await?;
            if session.state().error.is_none() {
                println!("Added note {}: {}", note.id, note.title);
            }
            return Ok(report_outcome(&session.state()));
        }
        Command::Delete(delete_cmd) => {
            let session = open_session(&config).await?;
            session.delete(&delete_cmd.id).await?;
            if session.state().error.is_none() {
                println!("Deleted note {}", delete_cmd.id);
            }
            return Ok(report_outcome(&session.state()));
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Validate configuration, build the store and show cached notes.
async fn open_session(config: &Config) -> Result<Session> {
    config.validate()?;
    let store = Arc::new(store_from_config(config).context("failed to set up note store")?);
    let session = Session::open(&StaticIdentity::new(&config.session.user_id), store)?;
    session.restore().await?;
    Ok(session)
}

/// Print the recorded failure, if any, and pick the exit code.
fn report_outcome(state: &StoreState) -> ExitCode {
    match failure_message(state) {
        Some(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

fn failure_message(state: &StoreState) -> Option<String> {
    state
        .error
        .as_ref()
        .map(|error| format!("error: {} failed: {}", error.kind, error.message))
}

fn print_notes(state: &StoreState, cmd: &ListCommand) -> Result<()> {
    let limit = cmd.limit.unwrap_or(usize::MAX);
    let notes: Vec<&Note> = state.notes.iter().take(limit).collect();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }
    for note in notes {
        println!("{}", format_note(note));
    }
    Ok(())
}

fn format_note(note: &Note) -> String {
    let when = DateTime::from_timestamp_millis(note.created_at).map_or_else(
        || note.created_at.to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    );
    let mut line = format!("{}  {}  {}", note.id, when, note.title);
    if let Some(first) = note.content.lines().find(|l| !l.trim().is_empty()) {
        line.push_str("\n    ");
        line.push_str(first.trim());
    }
    line
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> Result<()> {
    let remote = match config.remote.backend {
        RemoteBackend::None => "none".to_string(),
        RemoteBackend::Http => config.remote.base_url.clone(),
    };
    let database_path = config.database_path();
    let stats = if config.cache.enabled && database_path.exists() {
        let cache = LocalCache::open(&database_path)?;
        Some(cache.stats(&config.session.user_id)?)
    } else {
        None
    };

    if cmd.json {
        let status = serde_json::json!({
            "user_id": config.session.user_id,
            "remote": remote,
            "id_policy": config.sync.id_policy,
            "cache_enabled": config.cache.enabled,
            "database_path": database_path,
            "cached_notes": stats.as_ref().map(|s| s.cached_notes),
            "newest_created_at": stats.as_ref().and_then(|s| s.newest_created_at),
            "db_size_bytes": stats.as_ref().map(|s| s.db_size_bytes),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("qnotes status");
        println!("-------------");
        println!("User:          {}", config.session.user_id);
        println!("Remote:        {remote}");
        println!("Id policy:     {:?}", config.sync.id_policy);
        println!("Cache:         {}", database_path.display());
        match &stats {
            Some(stats) => {
                println!("Cached notes:  {}", stats.cached_notes);
                if let Some(newest) = stats.newest_created_at {
                    println!("Newest note:   {newest}");
                }
                println!("Database size: {} bytes", stats.db_size_bytes);
            }
            None if config.cache.enabled => println!("Cached notes:  0 (no database yet)"),
            None => println!("Cached notes:  cache disabled"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Session]");
                println!("  User id:            {}", config.session.user_id);
                println!();
                println!("[Remote]");
                println!("  Backend:            {:?}", config.remote.backend);
                println!("  Base URL:           {}", config.remote.base_url);
                println!("  Timeout (ms):       {}", config.remote.timeout_ms);
                println!();
                println!("[Cache]");
                println!("  Enabled:            {}", config.cache.enabled);
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Sync]");
                println!("  Id policy:          {:?}", config.sync.id_policy);
                println!();
                println!("[Summarizer]");
                println!("  Endpoint:           {}", config.summarizer.endpoint);
                println!("  Default title:      {}", config.summarizer.default_title);
                println!("  Timeout (ms):       {}", config.summarizer.timeout_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)).and_then(|c| c.validate().map(|()| c)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
