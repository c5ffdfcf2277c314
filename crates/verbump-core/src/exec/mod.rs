//! External command execution.
//!
//! Every process the workflow spawns goes through [`CommandRunner`]. The real
//! implementation is [`SystemRunner`]; tests substitute a scripted fake so git
//! behavior can be exercised without a repository on disk.

#[cfg(test)]
pub(crate) mod fake;

use std::io;
use std::process::Command;

use camino::Utf8Path;
use tracing::{debug, instrument};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status zero.
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Runs an external program to completion and captures its output.
///
/// A non-zero exit is not an error at this layer; callers decide what an
/// exit status means. `Err` is reserved for failing to spawn the process.
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd` and wait for it to exit.
    fn run(&self, program: &str, args: &[&str], cwd: &Utf8Path) -> io::Result<CommandOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    echo: bool,
}

impl SystemRunner {
    /// Create a runner that executes commands silently.
    pub const fn new() -> Self {
        Self { echo: false }
    }

    /// Echo each command line to stderr before running it.
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip(self), fields(%cwd))]
    fn run(&self, program: &str, args: &[&str], cwd: &Utf8Path) -> io::Result<CommandOutput> {
        if self.echo {
            eprintln!("→ {}", display_command(program, args));
        }

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd.as_std_path())
            .output()?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        debug!(code = ?result.code, "command finished");
        Ok(result)
    }
}

/// Render a command line for display, quoting arguments that contain spaces.
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("'{arg}'")
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check whether a binary is available on `PATH`.
pub fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_joins_plain_args() {
        assert_eq!(
            display_command("git", &["switch", "-c", "chore/bump-version"]),
            "git switch -c chore/bump-version"
        );
    }

    #[test]
    fn display_command_quotes_spaces() {
        assert_eq!(
            display_command("git", &["commit", "-m", "chore: bump to 1.2.4"]),
            "git commit -m 'chore: bump to 1.2.4'"
        );
    }

    #[test]
    fn output_success_requires_zero_exit() {
        let ok = CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        };
        let failed = CommandOutput {
            code: Some(1),
            ..CommandOutput::default()
        };
        let signaled = CommandOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!signaled.success());
    }

    #[test]
    fn system_runner_reports_spawn_failure() {
        let runner = SystemRunner::new();
        let result = runner.run(
            "verbump-definitely-not-a-binary",
            &[],
            Utf8Path::new("."),
        );
        assert!(result.is_err());
    }

    #[test]
    fn system_runner_captures_git_version() {
        if !has_binary("git") {
            return;
        }
        let out = SystemRunner::new()
            .run("git", &["--version"], Utf8Path::new("."))
            .unwrap();
        assert!(out.success());
        assert!(out.stdout.starts_with("git version"));
    }
}
