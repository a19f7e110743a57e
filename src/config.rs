//! Game configuration parsing and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::{AppError, Result};

/// Points awarded by [`crate::controller::GameController::add_default_score`]
/// when the config does not override it.
pub const DEFAULT_SCORE_STEP: u32 = 10;

/// File name of the progress record inside the data directory.
pub const DEFAULT_SAVE_FILE_NAME: &str = "savefile.json";

fn default_save_file_name() -> String {
    DEFAULT_SAVE_FILE_NAME.into()
}

fn default_score_step() -> u32 {
    DEFAULT_SCORE_STEP
}

/// Configuration parsed from `playstate.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    /// Application-private directory holding the progress record.
    pub data_dir: PathBuf,
    /// Progress record file name; must be a bare name without separators.
    #[serde(default = "default_save_file_name")]
    pub save_file_name: String,
    /// Points awarded per default score event.
    #[serde(default = "default_score_step")]
    pub score_step: u32,
}

impl GameConfig {
    /// Build a configuration with defaults for everything except `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            save_file_name: default_save_file_name(),
            score_step: default_score_step(),
        }
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        debug!(path = %path.display(), "config file read");
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Full path of the progress record.
    #[must_use]
    pub fn save_path(&self) -> PathBuf {
        self.data_dir.join(&self.save_file_name)
    }

    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` on an empty data directory, a save file
    /// name that is not a bare file name, or a zero score step.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(AppError::Config("data_dir must not be empty".into()));
        }

        let name = Path::new(&self.save_file_name);
        let is_bare = name.file_name().is_some_and(|f| f == name.as_os_str());
        if self.save_file_name.trim().is_empty() || !is_bare {
            return Err(AppError::Config(format!(
                "save_file_name must be a bare file name, got {:?}",
                self.save_file_name
            )));
        }

        if self.score_step == 0 {
            return Err(AppError::Config(
                "score_step must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
