//! Finding and rewriting `KEY = X[.Y[.Z]];` version declarations.
//!
//! The first declaration in the file is authoritative: its value is the old
//! version and the base for the bump. Every declaration is then rewritten to
//! the same new version, whatever value it held. Bytes outside the matched
//! version digits pass through unchanged.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::version::{self, BumpLevel, VersionError};

/// Declaration key rewritten when none is configured.
pub const DEFAULT_KEY: &str = "APP_SHORT_VERSION";

/// Suffix appended to the file name of the backup copy.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Errors from rewriting a declaration file.
#[derive(Error, Debug)]
pub enum MutateError {
    /// The declaration key produced an unusable pattern.
    #[error("invalid declaration key `{key}`")]
    InvalidKey {
        /// The configured key.
        key: String,
    },

    /// The file could not be read as UTF-8 text.
    #[error("failed to read {path}")]
    Read {
        /// The file being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file contains no matching declaration.
    #[error("no {key} found in {path}")]
    NoDeclaration {
        /// The declaration key searched for.
        key: String,
        /// The file searched.
        path: Utf8PathBuf,
    },

    /// The declared version could not be bumped.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The backup copy could not be written. The original is untouched.
    #[error("failed to back up {path} to {backup}")]
    BackupFailed {
        /// The file being backed up.
        path: Utf8PathBuf,
        /// Where the backup was going.
        backup: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rewritten file could not be written.
    #[error("failed to write {path}")]
    Write {
        /// The file being written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for declaration rewrites.
pub type MutateResult<T> = Result<T, MutateError>;

/// Compiled matcher for one declaration key.
#[derive(Debug, Clone)]
pub struct DeclarationPattern {
    key: String,
    regex: Regex,
}

impl DeclarationPattern {
    /// Build the matcher for `key`. The key is matched literally.
    pub fn new(key: &str) -> MutateResult<Self> {
        if key.trim().is_empty() {
            return Err(MutateError::InvalidKey { key: key.into() });
        }
        let pattern = format!(
            r"({}\s*=\s*)([0-9]+(?:\.[0-9]+){{0,2}})(\s*;)",
            regex::escape(key)
        );
        let regex =
            Regex::new(&pattern).map_err(|_| MutateError::InvalidKey { key: key.into() })?;
        Ok(Self {
            key: key.to_string(),
            regex,
        })
    }

    /// The declaration key this pattern matches.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// The in-memory result of rewriting declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The full rewritten text.
    pub text: String,
    /// Version text of the first declaration, verbatim.
    pub old: String,
    /// The bumped version.
    pub new: String,
    /// Number of declarations rewritten.
    pub count: usize,
}

/// Rewrite every declaration in `text`, bumping from the first one.
///
/// Returns `None` if `text` contains no declaration.
pub fn rewrite(
    text: &str,
    pattern: &DeclarationPattern,
    level: BumpLevel,
) -> Result<Option<Rewrite>, VersionError> {
    let Some(first) = pattern.regex.captures(text) else {
        return Ok(None);
    };
    let old = first[2].to_string();
    let new = version::bump_declared(&old, level)?.to_string();

    let count = pattern.regex.find_iter(text).count();
    let text = pattern
        .regex
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], new, &caps[3])
        })
        .into_owned();

    Ok(Some(Rewrite {
        text,
        old,
        new,
        count,
    }))
}

/// Outcome of bumping the declarations in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    /// The declaration file.
    pub file: Utf8PathBuf,
    /// Version text of the first declaration before the bump.
    pub old: String,
    /// The version every declaration now holds.
    pub new: String,
    /// Number of declarations rewritten (at least one).
    pub count: usize,
    /// Backup copy of the original file; `None` in a dry run.
    pub backup: Option<Utf8PathBuf>,
}

/// Sibling backup path: the file name with [`BACKUP_SUFFIX`] appended.
pub fn backup_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut backup = path.as_str().to_string();
    backup.push_str(BACKUP_SUFFIX);
    Utf8PathBuf::from(backup)
}

/// Bump every declaration in the file at `path`.
///
/// Outside a dry run the original is copied to [`backup_path`] before it is
/// overwritten. The backup is never removed. A dry run reads and computes only.
#[instrument(skip(pattern), fields(%path, key = pattern.key(), %level, dry_run))]
pub fn bump_version_in_file(
    path: &Utf8Path,
    pattern: &DeclarationPattern,
    level: BumpLevel,
    dry_run: bool,
) -> MutateResult<MutationResult> {
    let text = fs::read_to_string(path).map_err(|source| MutateError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let rewrite = rewrite(&text, pattern, level)?.ok_or_else(|| MutateError::NoDeclaration {
        key: pattern.key().to_string(),
        path: path.to_path_buf(),
    })?;
    debug!(old = %rewrite.old, new = %rewrite.new, count = rewrite.count, "computed bump");

    if dry_run {
        return Ok(MutationResult {
            file: path.to_path_buf(),
            old: rewrite.old,
            new: rewrite.new,
            count: rewrite.count,
            backup: None,
        });
    }

    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|source| MutateError::BackupFailed {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;

    fs::write(path, &rewrite.text).map_err(|source| MutateError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        old = %rewrite.old,
        new = %rewrite.new,
        count = rewrite.count,
        %backup,
        "declarations updated"
    );
    Ok(MutationResult {
        file: path.to_path_buf(),
        old: rewrite.old,
        new: rewrite.new,
        count: rewrite.count,
        backup: Some(backup),
    })
}
