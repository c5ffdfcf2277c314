//! Configuration loading and discovery.
//!
//! Configuration is merged from, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config: `config.<ext>` in the platform config directory
//!    (`~/.config/verbump/` on Linux)
//! 3. Project config: `.verbump.<ext>` or `verbump.<ext>` in the start
//!    directory or the nearest parent, stopping at the repository boundary
//! 4. Files passed explicitly (e.g. `--config`)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`.
//!
//! # Example
//! ```no_run
//! use camino::Utf8Path;
//! use verbump_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_project_search(Utf8Path::new("."))
//!     .load()
//!     .unwrap();
//! println!("declaration key: {}", config.declaration_key());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::branch::DEFAULT_BRANCH;
use crate::declaration::DEFAULT_KEY;
use crate::error::{ConfigError, ConfigResult};
use crate::version::BumpLevel;
use crate::workflow::DEFAULT_COMMIT_MESSAGE;

/// The configuration for verbump.
///
/// Every section is optional; command-line flags override config values and
/// config values override the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Which declaration to bump and by how much.
    pub version: Option<VersionConfig>,
    /// Branch the bump is committed on.
    pub branch: Option<BranchConfig>,
    /// Commit settings.
    pub commit: Option<CommitConfig>,
}

/// Version declaration settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VersionConfig {
    /// Declaration key to rewrite (default: `APP_SHORT_VERSION`).
    pub key: Option<String>,
    /// Default bump level when `--part` is not given (default: `patch`).
    pub part: Option<BumpLevel>,
}

/// Branch settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BranchConfig {
    /// Default branch name when `--branch-name` is not given.
    pub name: Option<String>,
}

/// Commit settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommitConfig {
    /// Commit message template.
    ///
    /// Supports `{key}`, `{version}` and `{previous}` interpolation.
    pub message: Option<String>,
}

impl Config {
    /// The declaration key to rewrite.
    pub fn declaration_key(&self) -> &str {
        self.version
            .as_ref()
            .and_then(|v| v.key.as_deref())
            .unwrap_or(DEFAULT_KEY)
    }

    /// The bump level to use when none is given on the command line.
    pub fn default_part(&self) -> BumpLevel {
        self.version
            .as_ref()
            .and_then(|v| v.part)
            .unwrap_or_default()
    }

    /// The branch name to use when none is given on the command line.
    pub fn branch_name(&self) -> &str {
        self.branch
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// The commit message template.
    pub fn commit_message(&self) -> &str {
        self.commit
            .as_ref()
            .and_then(|c| c.message.as_deref())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for platform directory lookup and config file names.
const APP_NAME: &str = "verbump";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include the user config file.
    include_user_config: bool,
    /// Stop searching at a directory containing this file or directory.
    boundary_marker: Option<String>,
    /// Explicit config files, loaded last.
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader that reads user config and stops at `.git`.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for a project config file.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include the user config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a directory containing `marker`.
    ///
    /// The directory holding the marker is still searched.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file. Later files take precedence.
    ///
    /// Unlike discovered files, an explicit file must exist.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = find_user_config()
        {
            figment = merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            figment = merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            if !file.is_file() {
                return Err(ConfigError::NotFound(file.clone()));
            }
            figment = merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            key = config.declaration_key(),
            branch = config.branch_name(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from `start`.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        for dir in start.ancestors() {
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The repository root is the last directory searched.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }
        }

        None
    }
}

/// Find the user config file in the platform config directory.
fn find_user_config() -> Option<Utf8PathBuf> {
    let config_dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

/// Merge a config file into the figment, detecting format from extension.
fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// Get the user config directory path.
///
/// Returns `~/.config/verbump/` on Linux, `~/Library/Application Support/verbump/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
