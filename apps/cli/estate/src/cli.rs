//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "estate", version, about = "Estate management console API client")]
pub struct Cli {
    /// Directory holding config.json, the session file and logs.
    #[arg(long, global = true, env = "ESTATE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Echo info/debug logs to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a session token.
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the session token.
    Logout,
    /// Show session state, roles and the API base URL.
    Status,
    /// GET a path and print the JSON response.
    Get(GetArgs),
    /// DELETE each path in order, stopping at the first failure.
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Download or view a file export.
    Export(ExportArgs),
    /// Manage the user ids selected for a batch notification.
    #[command(subcommand)]
    NotifyTargets(NotifyTargetsCommand),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub path: String,

    /// Query parameter as key=value; repeatable.
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub path: String,

    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Open in the default viewer instead of saving.
    #[arg(long)]
    pub view: bool,

    /// Save here instead of the configured download directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum NotifyTargetsCommand {
    /// Replace the stored selection.
    Store {
        #[arg(required = true)]
        user_ids: Vec<String>,
    },
    /// Print the stored selection and clear it.
    Take,
}

pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
