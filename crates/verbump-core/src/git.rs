//! Git operations for the bump workflow.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, GPG signing, hooks, and other configuration.
//!
//! Every command runs through a [`CommandRunner`] with the repository root as
//! its working directory; nothing here changes the process working directory.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::exec::{CommandOutput, CommandRunner, display_command};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("`{command}` failed: {stderr}")]
    Command {
        /// The full command line that failed.
        command: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Locate the top-level directory of the repository containing `cwd`.
///
/// Any failure of the lookup itself means `cwd` is not inside a repository.
#[instrument(skip(runner), fields(%cwd))]
pub fn toplevel(runner: &dyn CommandRunner, cwd: &Utf8Path) -> GitResult<Utf8PathBuf> {
    let output = runner.run("git", &["rev-parse", "--show-toplevel"], cwd)?;
    if !output.success() {
        debug!(stderr = %output.stderr, "top-level lookup failed");
        return Err(GitError::NotARepo);
    }
    let root = Utf8PathBuf::from(output.stdout.trim());
    debug!(%root, "repository root");
    Ok(root)
}

/// A repository handle: a command runner bound to the repository root.
#[derive(Clone, Copy)]
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    root: &'a Utf8Path,
}

impl std::fmt::Debug for Git<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("root", &self.root).finish()
    }
}

impl<'a> Git<'a> {
    /// Bind `runner` to the repository at `root`.
    pub const fn new(runner: &'a dyn CommandRunner, root: &'a Utf8Path) -> Self {
        Self { runner, root }
    }

    /// The repository root every command runs in.
    pub const fn root(&self) -> &'a Utf8Path {
        self.root
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if in a detached HEAD state. Reads the symbolic ref
    /// rather than `rev-parse --abbrev-ref`, which turns the name into
    /// `heads/<name>` when a tag shadows the branch.
    #[instrument]
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let args = ["symbolic-ref", "-q", "HEAD"];
        let output = self.run(&args)?;
        match output.code {
            Some(0) => {}
            Some(1) => {
                debug!("detached HEAD");
                return Ok(None);
            }
            _ => {
                if output.stderr.contains("not a git repository") {
                    return Err(GitError::NotARepo);
                }
                return Err(command_error(&args, output));
            }
        }
        let reference = output.stdout.trim();
        let branch = reference
            .strip_prefix("refs/heads/")
            .unwrap_or(reference)
            .to_string();
        debug!(%branch, "current branch");
        Ok(Some(branch))
    }

    /// Check whether the working tree is clean.
    ///
    /// Clean means no working-tree changes against the index and no staged
    /// changes against `HEAD`. Untracked files do not count.
    #[instrument]
    pub fn is_clean(&self) -> GitResult<bool> {
        let unstaged = self.has_diff(&["diff", "--quiet"])?;
        let staged = self.has_diff(&["diff", "--quiet", "--cached"])?;
        let clean = !unstaged && !staged;
        debug!(clean, unstaged, staged, "working tree status");
        Ok(clean)
    }

    /// Short per-file status, as printed by `git status --porcelain`.
    #[instrument]
    pub fn status_porcelain(&self) -> GitResult<String> {
        self.git(&["status", "--porcelain"])
    }

    /// Check whether a local branch named `branch` exists.
    #[instrument]
    pub fn branch_exists(&self, branch: &str) -> GitResult<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &reference])?;
        let exists = output.success();
        debug!(branch, exists, "branch lookup");
        Ok(exists)
    }

    /// Stage a single path.
    #[instrument]
    pub fn add(&self, path: &Utf8Path) -> GitResult<()> {
        self.git(&["add", "--", path.as_str()])?;
        Ok(())
    }

    /// Commit exactly `path` with `message` and return the short hash.
    ///
    /// Other staged changes are left staged and out of the commit.
    #[instrument]
    pub fn commit_path(&self, path: &Utf8Path, message: &str) -> GitResult<String> {
        self.git(&["commit", "-m", message, "--", path.as_str()])?;
        let hash = self.git(&["rev-parse", "--short", "HEAD"])?.trim().to_string();
        debug!(%hash, "created commit");
        Ok(hash)
    }

    /// Run a git command and return its raw output regardless of exit status.
    pub fn run(&self, args: &[&str]) -> GitResult<CommandOutput> {
        Ok(self.runner.run("git", args, self.root)?)
    }

    /// Run a git command and return its stdout, failing on non-zero exit.
    pub fn git(&self, args: &[&str]) -> GitResult<String> {
        let output = self.run(args)?;
        if output.success() {
            return Ok(output.stdout);
        }

        // Detect "not a git repo" specifically
        if output.stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        Err(command_error(args, output))
    }

    /// `git diff --quiet` style probe: exit 0 is no diff, exit 1 is a diff.
    fn has_diff(&self, args: &[&str]) -> GitResult<bool> {
        let output = self.run(args)?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(command_error(args, output)),
        }
    }
}

fn command_error(args: &[&str], output: CommandOutput) -> GitError {
    GitError::Command {
        command: display_command("git", args),
        code: output.code,
        stderr: output.stderr,
    }
}
