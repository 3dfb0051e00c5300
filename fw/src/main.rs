//! factionwatch - rate-limited player status refresh
//!
//! CLI entry point for watching players and managing the API key.

use std::fs;
use std::io::IsTerminal;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use factionwatch::api::create_client;
use factionwatch::cache::CacheStore;
use factionwatch::cli::{Cli, Command, KeyCommand, WatchArgs, generate_after_help, get_log_path};
use factionwatch::clock::SystemClock;
use factionwatch::config::Config;
use factionwatch::domain::{PlayerId, RowFilter, player_ids_from_page};
use factionwatch::refresh::{
    ConsoleReconciler, Controls, FactionScope, FetchResolver, RefreshContext, RefreshLoop, RowLine, StopReason,
    roster_member_ids,
};
use factionwatch::scheduler::RefreshQueue;
use factionwatch::settings::{Settings, SettingsStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Watch(args)) => {
            debug!(?args, "main: matched Watch command");
            cmd_watch(&config, args).await
        }
        Some(Command::Player { id }) => {
            debug!(%id, "main: matched Player command");
            cmd_player(&config, id).await
        }
        Some(Command::Faction { id }) => {
            debug!(?id, "main: matched Faction command");
            cmd_faction(&config, id).await
        }
        Some(Command::Key { command }) => {
            debug!(?command, "main: matched Key command");
            cmd_key(&config, command)
        }
        None => {
            debug!("main: no command specified, printing help");
            Cli::command().after_help(generate_after_help()).print_help()?;
            Ok(())
        }
    }
}

/// Shared handles for one invocation
fn build_context(config: &Config, controls: Controls) -> Result<RefreshContext> {
    debug!("build_context: called");
    let api = create_client(&config.api).context("Failed to create API client")?;
    Ok(RefreshContext {
        api,
        cache: CacheStore::new(),
        settings: Arc::new(config.settings_store()),
        clock: Arc::new(SystemClock),
        controls,
        config: config.refresh.clone(),
    })
}

/// Run a refresh session until it stops
async fn cmd_watch(config: &Config, args: WatchArgs) -> Result<()> {
    debug!(?args, "cmd_watch: called");
    let mut ids: Vec<PlayerId> = args.ids.clone();
    if let Some(page) = &args.page {
        let text = fs::read_to_string(page).context(format!("Failed to read page {}", page.display()))?;
        let found = player_ids_from_page(&text);
        info!(count = found.len(), page = %page.display(), "Scanned page for players");
        ids.extend(found);
    }
    let queue = RefreshQueue::from_ids(ids);
    let scope = args.faction.map(FactionScope::from);

    if queue.is_empty() && scope.is_none() {
        eyre::bail!("Nothing to watch: pass player ids, --page or --faction");
    }

    let controls = Controls::new(true, args.dev);
    let ctx = build_context(config, controls.clone())?;
    let reconciler = Arc::new(ConsoleReconciler::new(args.row_filter()).omit_hidden(args.omit_hidden));

    let mut session = RefreshLoop::new(ctx, queue, reconciler).with_mode(args.poll_mode());
    if let Some(scope) = scope {
        session = session.with_faction(scope);
    }

    spawn_interrupt_handler(controls);

    if session.queue().is_empty() && session.seed_from_roster().await.is_err() {
        // Already reported by the reconciler
        std::process::exit(1);
    }

    let summary = session.run().await;
    println!(
        "\nStopped: {} ({} refreshed, {} API calls, {} cache hits, {} deferrals)",
        summary.stop_reason, summary.reconciled, summary.remote_calls, summary.cache_hits, summary.deferrals
    );

    if matches!(summary.stop_reason, StopReason::Failed { .. }) {
        std::process::exit(1);
    }
    Ok(())
}

/// First Ctrl-C disables auto-refresh, a second one exits
fn spawn_interrupt_handler(controls: Controls) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupt received, disabling auto refresh");
        eprintln!("\nStopping after the current fetch (Ctrl-C again to quit)");
        controls.disable_auto_refresh();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

/// Resolve one player and print the record
async fn cmd_player(config: &Config, id: PlayerId) -> Result<()> {
    debug!(%id, "cmd_player: called");
    let ctx = build_context(config, Controls::new(false, false))?;
    let mut limiter = ctx.limiter();
    let resolution = FetchResolver::new(ctx)
        .resolve(id, &mut limiter)
        .await
        .context(format!("Failed to fetch player {}", id))?;

    println!("{}", serde_json::to_string_pretty(&resolution.record)?);
    Ok(())
}

/// Fetch a roster and print one row per member
async fn cmd_faction(config: &Config, id: Option<u64>) -> Result<()> {
    debug!(?id, "cmd_faction: called");
    let ctx = build_context(config, Controls::new(false, false))?;
    let mut limiter = ctx.limiter();
    let roster = FetchResolver::new(ctx)
        .fetch_roster(FactionScope::from(id), &mut limiter)
        .await
        .context("Failed to fetch faction roster")?;

    let name = roster.get("name").and_then(|v| v.as_str()).unwrap_or("Faction");
    let members = roster_member_ids(&roster);
    println!("{} ({} members)", name, members.len());

    let colorize = std::io::stdout().is_terminal();
    let filter = RowFilter::default();
    for player_id in members {
        if let Some(record) = roster["members"].get(player_id.to_string()) {
            println!("{}", RowLine::from_record(player_id, record, &filter).render(colorize));
        }
    }
    Ok(())
}

/// Manage the saved API key
fn cmd_key(config: &Config, command: KeyCommand) -> Result<()> {
    debug!(?command, "cmd_key: called");
    let store = config.settings_store();
    match command {
        KeyCommand::Set { key } => {
            let settings = Settings::with_key(key.trim());
            if !settings.has_key() {
                eyre::bail!("API key must not be empty");
            }
            store.save(&settings).context("Failed to save API key")?;
            println!("Saved API key to {}", store.path().display());
        }
        KeyCommand::Clear => {
            store.clear().context("Failed to clear API key")?;
            println!("Cleared saved API key");
        }
        KeyCommand::Show => {
            let settings = store.load().context("Failed to load settings")?;
            if settings.has_key() {
                println!("{}", settings.masked_key());
            } else {
                println!("No API key set");
            }
        }
    }
    Ok(())
}
