//! The bump workflow: guard, branch, rewrite, stage, commit.
//!
//! [`run_workflow`] drives a small state machine and reports progress through
//! [`WorkflowEvent`]s so the CLI can render it however it likes.
//!
//! ```text
//! Init ─► Guarded ─► BranchReady ─► FileMutated ─► Staged ─► Committed
//!   └──────────┴────────────┴─────────────┴───────────┴──► Aborted
//! ```
//!
//! A dry run stops at `FileMutated` having changed nothing. Nothing is rolled
//! back on failure: a branch created or a backup written before the failing
//! stage stays in place.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::branch::{self, BranchError, BranchSpec, BranchSwitch};
use crate::declaration::{self, DEFAULT_KEY, DeclarationPattern, MutateError, MutationResult};
use crate::exec::CommandRunner;
use crate::git::{self, Git, GitError};
use crate::guard::{self, GuardError};
use crate::project::{self, ProjectError};
use crate::version::BumpLevel;

/// Commit message template used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: bump {key} to {version}";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Category of a workflow failure. Decides the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The start directory is not inside a git repository.
    NotAVersionControlRepository,
    /// Uncommitted changes and `--allow-dirty` not given.
    DirtyWorkingTree,
    /// The project path is not a recognized container.
    InvalidProjectKind,
    /// The container has no declaration file.
    ProjectFileNotFound,
    /// The declaration file holds no usable declaration.
    NoVersionDeclarationFound,
    /// The backup copy could not be written.
    BackupFailed,
    /// The branch could not be switched to or created.
    BranchSwitchFailed,
    /// A git command could not be run or failed.
    ExternalCommandFailed,
    /// The declaration file could not be read or written.
    Io,
    /// A configured value is unusable.
    InvalidConfiguration,
}

impl FailureKind {
    /// Process exit code for this failure.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::NoVersionDeclarationFound => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotAVersionControlRepository => "not a version control repository",
            Self::DirtyWorkingTree => "dirty working tree",
            Self::InvalidProjectKind => "invalid project kind",
            Self::ProjectFileNotFound => "project file not found",
            Self::NoVersionDeclarationFound => "no version declaration found",
            Self::BackupFailed => "backup failed",
            Self::BranchSwitchFailed => "branch switch failed",
            Self::ExternalCommandFailed => "external command failed",
            Self::Io => "i/o error",
            Self::InvalidConfiguration => "invalid configuration",
        };
        f.write_str(name)
    }
}

/// Errors from the bump workflow.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Git error.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Repository guard error.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Branch selection error.
    #[error(transparent)]
    Branch(#[from] BranchError),

    /// Project resolution error.
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Declaration rewrite error.
    #[error(transparent)]
    Mutate(#[from] MutateError),
}

impl WorkflowError {
    /// Classify this error.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Git(err)
            | Self::Guard(GuardError::Git(err))
            | Self::Branch(BranchError::Git(err)) => git_kind(err),
            Self::Guard(GuardError::DirtyWorkingTree { .. }) => FailureKind::DirtyWorkingTree,
            Self::Branch(BranchError::SwitchFailed { .. }) => FailureKind::BranchSwitchFailed,
            Self::Project(ProjectError::InvalidKind { .. }) => FailureKind::InvalidProjectKind,
            Self::Project(ProjectError::FileNotFound { .. }) => FailureKind::ProjectFileNotFound,
            Self::Mutate(MutateError::InvalidKey { .. }) => FailureKind::InvalidConfiguration,
            Self::Mutate(MutateError::NoDeclaration { .. } | MutateError::Version(_)) => {
                FailureKind::NoVersionDeclarationFound
            }
            Self::Mutate(MutateError::BackupFailed { .. }) => FailureKind::BackupFailed,
            Self::Mutate(MutateError::Read { .. } | MutateError::Write { .. }) => FailureKind::Io,
        }
    }

    /// Process exit code for this error.
    pub const fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    /// `git status --porcelain` output captured by a failed cleanliness check.
    pub fn dirty_status(&self) -> Option<&str> {
        match self {
            Self::Guard(GuardError::DirtyWorkingTree { status }) => Some(status),
            _ => None,
        }
    }
}

const fn git_kind(err: &GitError) -> FailureKind {
    match err {
        GitError::NotARepo => FailureKind::NotAVersionControlRepository,
        GitError::Exec(_) | GitError::Command { .. } => FailureKind::ExternalCommandFailed,
    }
}

/// Result alias for the workflow.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

// ──────────────────────────────────────────────
// Options, states and events
// ──────────────────────────────────────────────

/// Everything one bump run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Build-project container, absolute or relative to the repository root.
    pub project: Utf8PathBuf,
    /// Which version component to bump.
    pub level: BumpLevel,
    /// Branch to commit on.
    pub branch: BranchSpec,
    /// Skip the cleanliness guard.
    pub allow_dirty: bool,
    /// Report intended actions without changing anything.
    pub dry_run: bool,
    /// Declaration key to rewrite.
    pub key: String,
    /// Commit message template; see [`render_commit_message`].
    pub commit_template: String,
}

impl WorkflowOptions {
    /// Options for bumping `project` with every other setting at its default.
    pub fn new(project: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project: project.into(),
            level: BumpLevel::default(),
            branch: BranchSpec::default(),
            allow_dirty: false,
            dry_run: false,
            key: DEFAULT_KEY.to_string(),
            commit_template: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

/// Where the workflow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Nothing checked yet.
    Init,
    /// Repository located and the working tree accepted.
    Guarded,
    /// The target branch is checked out.
    BranchReady,
    /// The declaration file has been rewritten (or would be, in a dry run).
    FileMutated,
    /// The declaration file is staged.
    Staged,
    /// The bump is committed.
    Committed,
    /// A stage failed.
    Aborted,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Guarded => write!(f, "guarded"),
            Self::BranchReady => write!(f, "branch-ready"),
            Self::FileMutated => write!(f, "file-mutated"),
            Self::Staged => write!(f, "staged"),
            Self::Committed => write!(f, "committed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// The commit that recorded the bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Rendered commit message.
    pub message: String,
    /// Abbreviated commit hash.
    pub hash: String,
}

/// Progress notifications emitted by [`run_workflow`].
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// The repository root was found.
    RepositoryResolved {
        /// Repository top-level directory.
        root: Utf8PathBuf,
        /// Branch checked out at the start (`None` for detached HEAD).
        branch: Option<String>,
    },
    /// The cleanliness guard was skipped (`--allow-dirty`).
    GuardSkipped,
    /// The workflow moved between states.
    Transition {
        /// State left.
        from: WorkflowState,
        /// State entered.
        to: WorkflowState,
    },
    /// The branch selector finished.
    BranchSelected(BranchSwitch),
    /// The declaration file was rewritten, or would be.
    FileMutated(MutationResult),
    /// The bump was committed.
    Committed(CommitInfo),
    /// A stage failed; the error is returned right after.
    Aborted {
        /// State the workflow was in when it failed.
        state: WorkflowState,
        /// Failure category.
        kind: FailureKind,
    },
}

/// What a bump run did (or would do).
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    /// Repository top-level directory.
    pub root: Utf8PathBuf,
    /// Branch selection.
    pub branch: BranchSwitch,
    /// Declaration rewrite.
    pub mutation: MutationResult,
    /// The commit; `None` in a dry run.
    pub commit: Option<CommitInfo>,
    /// Final state.
    pub state: WorkflowState,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Fill in `{key}`, `{version}` and `{previous}` in a commit message template.
pub fn render_commit_message(template: &str, key: &str, previous: &str, version: &str) -> String {
    template
        .replace("{key}", key)
        .replace("{version}", version)
        .replace("{previous}", previous)
}

// ──────────────────────────────────────────────
// Execution
// ──────────────────────────────────────────────

struct Machine<F> {
    state: WorkflowState,
    on_event: F,
}

impl<F: FnMut(WorkflowEvent)> Machine<F> {
    fn emit(&mut self, event: WorkflowEvent) {
        (self.on_event)(event);
    }

    fn advance(&mut self, to: WorkflowState) {
        let from = self.state;
        self.state = to;
        debug!(%from, %to, "workflow transition");
        self.emit(WorkflowEvent::Transition { from, to });
    }

    fn abort(&mut self, err: WorkflowError) -> WorkflowError {
        let state = self.state;
        let kind = err.kind();
        warn!(%state, %kind, error = %err, "workflow aborted");
        self.emit(WorkflowEvent::Aborted { state, kind });
        self.state = WorkflowState::Aborted;
        err
    }
}

/// Bump the declared version in `options.project` and commit it on its own branch.
///
/// `cwd` is only used to find the repository; every git command then runs in
/// the repository root. The process working directory is never changed.
///
/// # Errors
///
/// Returns the first stage failure after emitting [`WorkflowEvent::Aborted`].
#[instrument(skip(runner, options, on_event), fields(%cwd, project = %options.project, level = %options.level, dry_run = options.dry_run))]
pub fn run_workflow(
    runner: &dyn CommandRunner,
    cwd: &Utf8Path,
    options: &WorkflowOptions,
    on_event: impl FnMut(WorkflowEvent),
) -> WorkflowResult<WorkflowOutcome> {
    let mut machine = Machine {
        state: WorkflowState::Init,
        on_event,
    };
    run_stages(&mut machine, runner, cwd, options).map_err(|err| machine.abort(err))
}

fn run_stages<F: FnMut(WorkflowEvent)>(
    machine: &mut Machine<F>,
    runner: &dyn CommandRunner,
    cwd: &Utf8Path,
    options: &WorkflowOptions,
) -> WorkflowResult<WorkflowOutcome> {
    let pattern = DeclarationPattern::new(&options.key)?;

    // Init -> Guarded
    let root = git::toplevel(runner, cwd)?;
    let git = Git::new(runner, &root);
    let start_branch = git.current_branch()?;
    machine.emit(WorkflowEvent::RepositoryResolved {
        root: root.clone(),
        branch: start_branch,
    });
    if options.allow_dirty {
        machine.emit(WorkflowEvent::GuardSkipped);
    }
    guard::ensure_clean(&git, options.allow_dirty)?;
    machine.advance(WorkflowState::Guarded);

    // Guarded -> BranchReady
    let project = project::resolve(&root, &options.project)?;
    let switch = branch::switch_or_create(&git, &options.branch, options.dry_run)?;
    machine.emit(WorkflowEvent::BranchSelected(switch.clone()));
    machine.advance(WorkflowState::BranchReady);

    // BranchReady -> FileMutated
    let mutation =
        declaration::bump_version_in_file(&project.file, &pattern, options.level, options.dry_run)?;
    machine.emit(WorkflowEvent::FileMutated(mutation.clone()));
    machine.advance(WorkflowState::FileMutated);

    if options.dry_run {
        info!(old = %mutation.old, new = %mutation.new, "dry run complete");
        return Ok(WorkflowOutcome {
            root,
            branch: switch,
            mutation,
            commit: None,
            state: machine.state,
            dry_run: true,
        });
    }

    // FileMutated -> Staged
    git.add(&project.file)?;
    machine.advance(WorkflowState::Staged);

    // Staged -> Committed
    let message = render_commit_message(
        &options.commit_template,
        pattern.key(),
        &mutation.old,
        &mutation.new,
    );
    let hash = git.commit_path(&project.file, &message)?;
    let commit = CommitInfo { message, hash };
    machine.emit(WorkflowEvent::Committed(commit.clone()));
    machine.advance(WorkflowState::Committed);

    info!(
        branch = %switch.target,
        old = %mutation.old,
        new = %mutation.new,
        hash = %commit.hash,
        "version bumped"
    );
    Ok(WorkflowOutcome {
        root,
        branch: switch,
        mutation,
        commit: Some(commit),
        state: machine.state,
        dry_run: false,
    })
}
