use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use jobs::PollConfig;

#[derive(Parser, Debug)]
#[command(name = "atv-cli")]
#[command(author, version, about = "Edit article-to-video projects from the terminal", long_about = None)]
pub struct Cli {
    /// Base URL of the project API.
    #[arg(long, global = true, env = "ATV_API_URL", default_value = "http://localhost:8080/api")]
    pub api_url: String,

    /// Bearer token sent with every request.
    #[arg(long, global = true, env = "ATV_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory for the local draft database.
    #[arg(long, global = true, env = "ATV_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = 2000)]
    pub poll_interval_ms: u64,

    #[arg(long, global = true, default_value_t = 150)]
    pub poll_max_attempts: u32,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a project (local draft first) and print its summary.
    Show { id: String },
    /// Poll generation status until it settles.
    Watch { id: String },
    /// Edit the script and save the result as a draft.
    Script {
        id: String,
        #[command(subcommand)]
        edit: ScriptCommand,
    },
    /// Put music on a track.
    Music(MusicArgs),
    /// List local drafts.
    Drafts,
    /// Send a local draft to the API.
    Push { id: String },
    /// Forget a local draft.
    Discard { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ScriptCommand {
    /// Insert a sentence before position `at` (or at the end).
    Add {
        at: usize,
        #[arg(long)]
        text: String,
    },
    Delete { index: usize },
    Edit {
        index: usize,
        #[arg(long)]
        text: String,
    },
    Move { from: usize, to: usize },
}

#[derive(Args, Debug)]
pub struct MusicArgs {
    pub id: String,
    pub track: usize,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub url: String,
    #[arg(long)]
    pub duration_ms: Option<i64>,
}

impl Cli {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_attempts: self.poll_max_attempts.max(1),
            ..PollConfig::default()
        }
    }

    pub fn db_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join("drafts.sqlite"),
            None => project::default_db_path(),
        }
    }
}
