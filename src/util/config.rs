//! Configuration file support for Quay.
//!
//! Quay reads two configuration files:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default build configuration name.
pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Default target framework moniker.
pub const DEFAULT_FRAMEWORK: &str = "dnx451";

/// Quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution settings
    pub resolve: ResolveConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Where and how libraries are resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Directories searched for `{name}/project.json`
    pub search_paths: Vec<PathBuf>,

    /// Installed package folder
    pub packages: Option<PathBuf>,

    /// Root of the framework reference assemblies
    pub reference_assemblies: Option<PathBuf>,

    /// Global assembly cache directories
    pub gac: Vec<PathBuf>,

    /// Default target framework (e.g. `net45`, `dnxcore50`)
    pub framework: Option<String>,

    /// Runtime identifier handed to providers
    pub runtime: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default build configuration (Debug, Release)
    pub configuration: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Relative paths in `other` must already be absolute; see
    /// [`Config::rebase`].
    pub fn merge(&mut self, other: Config) {
        if !other.resolve.search_paths.is_empty() {
            self.resolve.search_paths = other.resolve.search_paths;
        }
        if other.resolve.packages.is_some() {
            self.resolve.packages = other.resolve.packages;
        }
        if other.resolve.reference_assemblies.is_some() {
            self.resolve.reference_assemblies = other.resolve.reference_assemblies;
        }
        if !other.resolve.gac.is_empty() {
            self.resolve.gac = other.resolve.gac;
        }
        if other.resolve.framework.is_some() {
            self.resolve.framework = other.resolve.framework;
        }
        if other.resolve.runtime.is_some() {
            self.resolve.runtime = other.resolve.runtime;
        }

        if other.build.configuration.is_some() {
            self.build.configuration = other.build.configuration;
        }
    }

    /// Resolve relative paths against `base`.
    pub fn rebase(mut self, base: &Path) -> Self {
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };

        self.resolve.search_paths = self.resolve.search_paths.into_iter().map(rebase).collect();
        self.resolve.gac = self.resolve.gac.into_iter().map(rebase).collect();
        self.resolve.packages = self.resolve.packages.map(rebase);
        self.resolve.reference_assemblies = self.resolve.reference_assemblies.map(rebase);
        self
    }

    pub fn framework(&self) -> &str {
        self.resolve.framework.as_deref().unwrap_or(DEFAULT_FRAMEWORK)
    }

    pub fn configuration(&self) -> &str {
        self.build
            .configuration
            .as_deref()
            .unwrap_or(DEFAULT_CONFIGURATION)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml), paths relative to the project root
/// 2. Global config (~/.quay/config.toml), paths relative to ~/.quay
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let base = global_path.parent().unwrap_or(Path::new("."));
        config.merge(Config::load_or_default(global_path).rebase(base));
    }

    // Project config overrides global
    if project_path.exists() {
        let base = project_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."));
        config.merge(Config::load_or_default(project_path).rebase(base));
    }

    config
}

/// Get the global quay config directory (~/.quay).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quay"))
}

/// Get the global config path (~/.quay/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}
