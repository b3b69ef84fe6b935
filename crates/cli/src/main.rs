mod config;
mod session;

use std::sync::Arc;

use anyhow::Result;
use api::HttpProjectApi;
use clap::Parser;
use jobs::PollStatus;
use project::ProjectDb;
use serde::Serialize;
use timeline::MusicDto;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command, ScriptCommand};
use session::{ScriptEdit, Session};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let db = ProjectDb::open_or_create(&cli.db_path())?;
    let api = Arc::new(HttpProjectApi::new(cli.api_url.clone(), cli.token.clone()));
    let mut session = Session::new(api, cli.poll_config(), db);
    let json = cli.json;

    match cli.command {
        Command::Show { id } => {
            let source = session.load(&id)?;
            let summary = session.summary();
            if json {
                print_json(&summary)?;
            } else {
                println!("{} ({:?}) from {:?}", summary.name, summary.id, source);
                println!("  status      {}", summary.status);
                println!("  language    {}  aspect {}", summary.language, summary.aspect);
                println!("  sentences   {} ({} ms)", summary.sentences, summary.script_duration_ms);
                println!("  contents    {}  tracks {}", summary.contents, summary.tracks);
                println!("  subtitles   {}", summary.subtitles_enabled);
                println!("  regenerate  {}", summary.regenerate_needed);
                println!("  export      {}", if summary.export_blocked { "blocked" } else { "ready" });
                if let Some(target) = &summary.poll_target {
                    println!("  generation  running (atv-cli watch {target})");
                }
            }
        }
        Command::Watch { id } => {
            session.fetch_remote(&id)?;
            let report = session.watch(|event| {
                if let PollStatus::Fetched(task) = &event.status {
                    eprintln!("{}: {:?} {:?}", event.project_id, task.status, task.progress);
                }
            })?;
            if json {
                print_json(&report)?;
            } else if !report.polled {
                println!("nothing to poll");
            } else if report.has_error {
                println!("generation failed");
            } else if report.gave_up {
                println!("gave up waiting; last status {:?}", report.last_status);
            } else {
                println!("done: {:?}", report.last_status);
            }
        }
        Command::Script { id, edit } => {
            session.load(&id)?;
            let edit = match edit {
                ScriptCommand::Add { at, text } => ScriptEdit::Add { at, text },
                ScriptCommand::Delete { index } => ScriptEdit::Delete { index },
                ScriptCommand::Edit { index, text } => ScriptEdit::Edit { index, text },
                ScriptCommand::Move { from, to } => ScriptEdit::Move { from, to },
            };
            session.edit_script(edit)?;
            println!("saved draft {id}");
        }
        Command::Music(args) => {
            session.load(&args.id)?;
            let music = MusicDto { id: None, name: args.name, url: Some(args.url), duration: args.duration_ms };
            session.assign_music(args.track, music)?;
            println!("saved draft {}", args.id);
        }
        Command::Drafts => {
            let rows = session.drafts()?;
            if json {
                print_json(&rows)?;
            } else {
                for row in rows {
                    let when = chrono::DateTime::from_timestamp(row.updated_at, 0)
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    let mark = if row.is_dirty() { "*" } else { " " };
                    println!("{mark} {}  {}  {}  {}", row.id, row.status, when, row.name);
                }
            }
        }
        Command::Push { id } => {
            let saved = session.push(&id)?;
            println!("pushed {} ({})", id, saved.name);
        }
        Command::Discard { id } => {
            if session.discard_draft(&id)? {
                println!("discarded {id}");
            } else {
                println!("no draft for {id}");
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
