//! Global context for Quay operations.
//!
//! Provides centralized access to configuration and paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{load_config, project_config_path, Config};

/// Overrides the global quay directory (`~/.quay`).
pub const QUAY_HOME_ENV: &str = "QUAY_HOME";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Quay data (~/.quay/)
    home: PathBuf,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = std::env::var_os(QUAY_HOME_ENV)
            .map(PathBuf::from)
            .or_else(crate::util::config::global_config_dir)
            .unwrap_or_else(|| PathBuf::from(".quay"));

        GlobalContext {
            cwd,
            home,
            color: true,
        }
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Quay home directory (~/.quay/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// The nearest ancestor of cwd holding a `.quay` directory, else cwd.
    pub fn find_project_root(&self) -> PathBuf {
        self.cwd
            .ancestors()
            .find(|dir| dir.join(".quay").is_dir())
            .unwrap_or(&self.cwd)
            .to_path_buf()
    }

    /// Global config merged with the project's `.quay/config.toml`.
    pub fn load_config(&self) -> Config {
        load_config(
            &self.config_path(),
            &project_config_path(&self.find_project_root()),
        )
    }
}
