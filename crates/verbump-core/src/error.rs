//! Configuration errors.
//!
//! Workflow failures live next to the code that raises them; see
//! [`crate::workflow::WorkflowError`].

use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file could not be parsed or holds an invalid value.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// A config file passed explicitly does not exist.
    #[error("config file not found: {0}")]
    NotFound(camino::Utf8PathBuf),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
