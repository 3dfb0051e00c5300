//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{FilterMode, PlayerId, RowFilter};
use crate::refresh::PollMode;

/// factionwatch - keep a faction's player statuses current
#[derive(Parser)]
#[command(
    name = "fw",
    about = "Rate-limited player status refresh for Torn factions",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep refreshing a list of players
    Watch(WatchArgs),

    /// Resolve one player and print the record as JSON
    Player {
        /// Player id
        id: PlayerId,
    },

    /// Fetch a faction roster and print one line per member
    Faction {
        /// Faction id (defaults to the key owner's faction)
        id: Option<u64>,
    },

    /// Manage the saved API key
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
}

/// Arguments for `fw watch`
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Player ids to watch
    #[arg(value_name = "ID")]
    pub ids: Vec<PlayerId>,

    /// Also watch every `XID=<id>` found in this file (a saved page)
    #[arg(short, long, value_name = "FILE")]
    pub page: Option<PathBuf>,

    /// Refresh a faction roster alongside players (own faction when no id)
    #[arg(short, long, value_name = "FACTION_ID", num_args = 0..=1)]
    pub faction: Option<Option<u64>>,

    /// Refresh each player once, then exit
    #[arg(long)]
    pub once: bool,

    /// Revive mode: hide players that cannot be revived
    #[arg(long, conflicts_with = "attack")]
    pub revive: bool,

    /// Attack mode: hide travelling and hospitalised players
    #[arg(long)]
    pub attack: bool,

    /// Hide idle and offline players
    #[arg(long)]
    pub hide_offline: bool,

    /// Leave hidden players out instead of marking them
    #[arg(long)]
    pub omit_hidden: bool,

    /// Developer mode: log cache decisions at info level
    #[arg(long)]
    pub dev: bool,
}

impl WatchArgs {
    pub fn filter_mode(&self) -> FilterMode {
        if self.revive {
            FilterMode::Revive
        } else if self.attack {
            FilterMode::Attack
        } else {
            FilterMode::All
        }
    }

    pub fn row_filter(&self) -> RowFilter {
        RowFilter::new(self.filter_mode(), self.hide_offline)
    }

    pub fn poll_mode(&self) -> PollMode {
        if self.once { PollMode::SinglePass } else { PollMode::Continuous }
    }
}

/// `fw key` subcommands
#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Save an API key
    Set {
        /// The API key
        key: String,
    },

    /// Remove the saved API key
    Clear,

    /// Show the saved API key (masked)
    Show,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factionwatch")
        .join("logs")
        .join("factionwatch.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}
