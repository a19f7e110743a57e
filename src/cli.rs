//! Command-line value types for the `playstate` binary.
//!
//! Kept in the library so argument parsing and config resolution can be
//! exercised without spawning the binary.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;

use crate::config::GameConfig;
use crate::{AppError, Result};

/// Log output format, passed as `--log-format`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// One scripted gameplay step for `playstate play`.
///
/// Parsed from `interact`, `score`, `score=N`, `fail` or `finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deliver the interaction signal.
    Interact,
    /// Add `N` points, or the configured step when no amount is given.
    Score(Option<u32>),
    /// Fail the session.
    Fail,
    /// Finish the session at the level given by `--level`.
    Finish,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.split_once('=') {
            Some(("score", amount)) => amount
                .parse()
                .map(|points| Self::Score(Some(points)))
                .map_err(|err| format!("invalid score amount {amount:?}: {err}")),
            Some(_) => Err(format!("unknown action {raw:?}")),
            None => match raw {
                "interact" => Ok(Self::Interact),
                "score" => Ok(Self::Score(None)),
                "fail" => Ok(Self::Fail),
                "finish" => Ok(Self::Finish),
                other => Err(format!("unknown action {other:?}")),
            },
        }
    }
}

/// Build the effective configuration from `--config` and `--data-dir`.
///
/// `data_dir` overrides the directory read from the config file. Without a
/// config file, `data_dir` alone yields a config with default settings.
///
/// # Errors
///
/// Returns `AppError::Config` when neither argument is given, when the
/// config file cannot be loaded, or when the result fails validation.
pub fn resolve_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<GameConfig> {
    let mut config = match (path, data_dir.as_ref()) {
        (Some(path), _) => GameConfig::load_from_path(path)?,
        (None, Some(dir)) => GameConfig::with_data_dir(dir.clone()),
        (None, None) => {
            return Err(AppError::Config(
                "no data directory: pass --data-dir or --config".into(),
            ))
        }
    };

    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config.validate()?;
    Ok(config)
}
