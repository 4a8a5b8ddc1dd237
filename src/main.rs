//! stonequarry - headless driver for rubble storage, plug-and-feather
//! quarrying and stone slabs
//!
//! Replays an interaction script against an in-memory sandbox world.

mod command_script;
mod commands;
mod config;

use anyhow::{Context, Result};
use command_script::InteractionScript;
use commands::{execute_command, parse_command, QuarrySession};
use std::{env, path::PathBuf};
use stonequarry_core::SimTick;
use stonequarry_world::{BlockEntityStore, WorldSettings};
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting stonequarry v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_usage();
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let quarry_config = config::load_quarry_config(&config_path);
    if let Err(err) = config::store_quarry_config(&quarry_config, &config_path) {
        warn!("Failed to store quarry config: {err:#}");
    }

    let mut settings = WorldSettings::default();
    quarry_config.apply_to(&mut settings);
    info!(entries = settings.len(), "Published world settings");

    let codes = config::load_allowed_codes(cli.codes.as_deref())?;
    let mut session = QuarrySession::new(quarry_config, codes)?;

    let store = match &cli.save_dir {
        Some(dir) => Some(BlockEntityStore::new(dir)?),
        None => None,
    };
    if let Some(store) = &store {
        let entities = store.load()?;
        if !entities.is_empty() {
            info!(count = entities.len(), path = %store.path().display(), "Resumed block-entities");
        }
        session.restore_entities(entities);
    }

    match &cli.script {
        Some(path) => {
            let mut script = InteractionScript::from_path(path)?;
            run_script(&mut session, &mut script);
        }
        None => warn!("No --script given; nothing to replay"),
    }

    info!(
        entities = session.entities().len(),
        blocks = session.world().block_count(),
        items = session.inventory().len(),
        "Replay finished"
    );

    if let Some(store) = &store {
        store
            .save(session.entities())
            .context("failed to save block-entities")?;
        info!(path = %store.path().display(), "Saved block-entities");
    }

    Ok(())
}

fn run_script(session: &mut QuarrySession, script: &mut InteractionScript) {
    info!(last_tick = script.last_tick().0, "Replaying interaction script");
    let mut tick = SimTick::ZERO;
    loop {
        for input in script.drain_ready_commands(tick) {
            match parse_command(&input) {
                Ok(cmd) => {
                    for line in execute_command(session, cmd).lines {
                        println!("[{}] {}", tick.0, line);
                    }
                }
                Err(err) => {
                    warn!(tick = tick.0, command = %input, "{err}");
                    println!("[{}] Error: {err}", tick.0);
                }
            }
        }
        if script.is_finished() {
            break;
        }
        tick = tick.advance(1);
    }
}

fn print_usage() {
    println!("Usage: stonequarry [--config <path>] [--codes <path>] [--script <path>] [--save <dir>]");
    println!();
    println!("  --config <path>  quarry config (default {})", config::DEFAULT_CONFIG_PATH);
    println!("  --codes <path>   allowed rock codes as JSON");
    println!("  --script <path>  interaction script to replay");
    println!("  --save <dir>     load and save block-entities in this world directory");
}

#[derive(Debug, Default)]
struct CliOptions {
    help: bool,
    config: Option<PathBuf>,
    codes: Option<PathBuf>,
    script: Option<PathBuf>,
    save_dir: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--config requires a file path");
                    }
                }
                "--codes" => {
                    if let Some(path) = args.next() {
                        opts.codes = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--codes requires a file path");
                    }
                }
                "--script" => {
                    if let Some(path) = args.next() {
                        opts.script = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--script requires a file path");
                    }
                }
                "--save" => {
                    if let Some(path) = args.next() {
                        opts.save_dir = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--save requires a directory path");
                    }
                }
                other => tracing::warn!(arg = other, "Ignoring unknown argument"),
            }
        }

        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_all_flags() {
        let opts = parse(&[
            "--config",
            "cfg.toml",
            "--codes",
            "codes.json",
            "--script",
            "run.json",
            "--save",
            "world",
        ]);
        assert!(!opts.help);
        assert_eq!(opts.config, Some(PathBuf::from("cfg.toml")));
        assert_eq!(opts.codes, Some(PathBuf::from("codes.json")));
        assert_eq!(opts.script, Some(PathBuf::from("run.json")));
        assert_eq!(opts.save_dir, Some(PathBuf::from("world")));
    }

    #[test]
    fn missing_values_and_unknown_flags_are_ignored() {
        let opts = parse(&["--bogus", "--help", "--script"]);
        assert!(opts.help);
        assert_eq!(opts.script, None);
    }

    #[test]
    fn script_replay_runs_every_tick() {
        let codes = config::load_allowed_codes(None).unwrap();
        let mut session = QuarrySession::new(Default::default(), codes).unwrap();
        let mut script = InteractionScript::from_str(
            r#"{"steps": [
                {"tick": 0, "command": "/rubble place 0 64 0"},
                {"tick": 5, "command": "/rubble add 0 64 0 game:stone-basalt 6"},
                {"tick": 5, "command": "/rubble hammer 0 64 0"}
            ]}"#,
        )
        .unwrap();
        run_script(&mut session, &mut script);
        assert!(script.is_finished());
        assert_eq!(session.entities().len(), 1);
    }
}
