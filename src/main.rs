#![forbid(unsafe_code)]

//! `playstate`: drive a play session from the command line.
//!
//! Loads configuration, opens the progress record in the data directory,
//! and either reports it, resets it, or plays one scripted session.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use playstate::cli::{resolve_config, Action, LogFormat};
use playstate::{AppError, GameController, Result, Transition};

#[derive(Debug, Parser)]
#[command(name = "playstate", about = "Play-session lifecycle and level progress", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the data directory holding the progress record.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the last finished level.
    Show,

    /// Reset progress to level 0.
    Reset,

    /// Play one session from a script of actions.
    Play {
        /// Identifier of the level being played; saved on finish.
        #[arg(long)]
        level: u32,

        /// Write progress on a background worker instead of inline.
        #[arg(long)]
        background: bool,

        /// Actions in order: `interact`, `score`, `score=N`, `fail`, `finish`.
        #[arg(required = true)]
        actions: Vec<Action>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    let config = resolve_config(args.config.as_deref(), args.data_dir)?;
    info!(data_dir = %config.data_dir.display(), "configuration loaded");

    let mut controller = GameController::from_config(&config);

    match args.command {
        Command::Show => {
            println!("{}", controller.last_finished_level());
            Ok(())
        }
        Command::Reset => {
            controller.reset_progress()?;
            println!("{}", controller.last_finished_level());
            Ok(())
        }
        Command::Play {
            level,
            background,
            actions,
        } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
            .block_on(play(&mut controller, level, background, &actions)),
    }
}

async fn play(
    controller: &mut GameController,
    level: u32,
    background: bool,
    actions: &[Action],
) -> Result<()> {
    controller.subscribe(|event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => error!(%err, "failed to encode event"),
    });

    let mut save_error = None;
    for action in actions {
        let outcome = match action {
            Action::Interact => controller.on_interaction(),
            Action::Score(Some(points)) => controller.add_score(*points),
            Action::Score(None) => controller.add_default_score(),
            Action::Fail => controller.fail(),
            Action::Finish => {
                let finished = if background {
                    controller.finish_async(level).await
                } else {
                    controller.finish(level)
                };
                match finished {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(%err, level, "progress was not saved");
                        save_error = Some(err);
                        Transition::Applied
                    }
                }
            }
        };
        info!(?action, ?outcome, level, state = %controller.state(), "action handled");
    }

    let summary = json!({
        "session": controller.snapshot(),
        "last_finished_level": controller.last_finished_level(),
        "session_over": controller.is_session_over(),
    });
    println!("{summary}");

    save_error.map_or(Ok(()), Err)
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
