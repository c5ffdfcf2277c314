//! Repository state checks that must pass before anything is modified.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::git::{Git, GitError};

/// Errors from the repository guard.
#[derive(Error, Debug)]
pub enum GuardError {
    /// The working tree or index has uncommitted changes.
    #[error("working tree is dirty; commit or stash changes, or pass --allow-dirty")]
    DirtyWorkingTree {
        /// Output of `git status --porcelain` at the time of the check.
        status: String,
    },

    /// A git query failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Snapshot of the repository, queried fresh on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryState {
    /// Checked-out branch, or `None` for a detached HEAD.
    pub branch: Option<String>,
    /// Whether there are no staged or unstaged changes.
    pub clean: bool,
}

/// Query the current branch and working-tree cleanliness.
#[instrument]
pub fn inspect(git: &Git<'_>) -> Result<RepositoryState, GitError> {
    Ok(RepositoryState {
        branch: git.current_branch()?,
        clean: git.is_clean()?,
    })
}

/// Fail unless the working tree is clean.
///
/// With `allow_dirty` the check is skipped entirely and no git command runs.
#[instrument]
pub fn ensure_clean(git: &Git<'_>, allow_dirty: bool) -> Result<(), GuardError> {
    if allow_dirty {
        debug!("dirty check skipped");
        return Ok(());
    }

    if git.is_clean()? {
        return Ok(());
    }

    let status = git.status_porcelain()?;
    warn!(files = status.lines().count(), "working tree is dirty");
    Err(GuardError::DirtyWorkingTree { status })
}
