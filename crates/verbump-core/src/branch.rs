//! Switching to (or creating) the branch the bump is committed on.
//!
//! Each [`BranchAction`] has an ordered list of command forms. The first form
//! the installed git accepts wins, so a git without `switch` falls back to
//! `checkout`. Whatever the commands report, the branch checked out afterwards
//! is the only success criterion.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::git::{Git, GitError};

/// Default branch the bump is committed on.
pub const DEFAULT_BRANCH: &str = "chore/bump-version";

/// Errors from branch selection.
#[derive(Error, Debug)]
pub enum BranchError {
    /// The branch could not be switched to or created.
    #[error("failed to switch/create branch \"{branch}\": {reason}")]
    SwitchFailed {
        /// The requested branch.
        branch: String,
        /// What went wrong.
        reason: String,
    },

    /// A git query failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result alias for branch operations.
pub type BranchResult<T> = Result<T, BranchError>;

/// The branch to commit on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSpec {
    /// Branch name.
    pub name: String,
    /// Reset the branch to the current commit even if it already exists.
    pub recreate: bool,
}

impl Default for BranchSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_BRANCH.to_string(),
            recreate: false,
        }
    }
}

/// What the selector does, decided by whether the branch exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchAction {
    /// Create or force-reset the branch at `HEAD` and switch to it.
    Reset,
    /// Switch to the existing branch, keeping its tip.
    Switch,
    /// Create a new branch at `HEAD` and switch to it.
    Create,
}

impl BranchAction {
    /// Pick the action for a branch that does or does not exist.
    pub const fn select(exists: bool, recreate: bool) -> Self {
        match (exists, recreate) {
            (_, true) => Self::Reset,
            (true, false) => Self::Switch,
            (false, false) => Self::Create,
        }
    }

    /// Command forms for this action, most preferred first.
    pub fn candidates(self, branch: &str) -> Vec<Vec<&str>> {
        match self {
            Self::Reset => vec![
                vec!["switch", "-C", branch],
                vec!["checkout", "-B", branch],
            ],
            Self::Switch => vec![vec!["switch", branch], vec!["checkout", branch]],
            Self::Create => vec![
                vec!["switch", "-c", branch],
                vec!["checkout", "-b", branch],
            ],
        }
    }
}

impl std::fmt::Display for BranchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::Switch => write!(f, "switch"),
            Self::Create => write!(f, "create"),
        }
    }
}

/// Outcome of [`switch_or_create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSwitch {
    /// Branch checked out before the switch (`None` for detached HEAD).
    pub previous: Option<String>,
    /// Branch checked out afterwards. Unchanged from `previous` in a dry run.
    pub current: Option<String>,
    /// The requested branch.
    pub target: String,
    /// Whether the target branch existed beforehand.
    pub existed: bool,
    /// The action taken (or that would be taken).
    pub action: BranchAction,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Switch to `spec.name`, creating or resetting it as needed.
///
/// In a dry run only read-only lookups run and the result describes intent.
#[instrument(fields(branch = %spec.name, recreate = spec.recreate))]
pub fn switch_or_create(
    git: &Git<'_>,
    spec: &BranchSpec,
    dry_run: bool,
) -> BranchResult<BranchSwitch> {
    validate_name(&spec.name)?;

    let existed = git.branch_exists(&spec.name)?;
    let action = BranchAction::select(existed, spec.recreate);
    let previous = git.current_branch()?;
    debug!(existed, %action, ?previous, "selected branch action");

    if dry_run {
        return Ok(BranchSwitch {
            current: previous.clone(),
            previous,
            target: spec.name.clone(),
            existed,
            action,
            dry_run,
        });
    }

    run_first_supported(git, &spec.name, &action.candidates(&spec.name))?;

    let current = git.current_branch()?;
    if current.as_deref() != Some(spec.name.as_str()) {
        return Err(BranchError::SwitchFailed {
            branch: spec.name.clone(),
            reason: format!(
                "still on {}",
                current.as_deref().unwrap_or("a detached HEAD")
            ),
        });
    }

    info!(?previous, branch = %spec.name, %action, "branch ready");
    Ok(BranchSwitch {
        previous,
        current,
        target: spec.name.clone(),
        existed,
        action,
        dry_run,
    })
}

/// Try each command form in order until one exits successfully.
///
/// Returns the index of the form that succeeded.
fn run_first_supported(
    git: &Git<'_>,
    branch: &str,
    candidates: &[Vec<&str>],
) -> BranchResult<usize> {
    let mut last_error = String::from("no command forms to try");
    for (index, args) in candidates.iter().enumerate() {
        let output = git.run(args)?;
        if output.success() {
            debug!(form = index, "branch command succeeded");
            return Ok(index);
        }
        warn!(form = index, stderr = %output.stderr, "branch command failed");
        last_error = output.stderr;
    }
    Err(BranchError::SwitchFailed {
        branch: branch.to_string(),
        reason: last_error,
    })
}

/// Reject names git would misread as options.
fn validate_name(name: &str) -> BranchResult<()> {
    if name.trim().is_empty() || name.starts_with('-') {
        return Err(BranchError::SwitchFailed {
            branch: name.to_string(),
            reason: "invalid branch name".into(),
        });
    }
    Ok(())
}
