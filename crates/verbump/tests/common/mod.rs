//! Shared fixtures for integration tests: a throwaway git repository holding
//! an Xcode project.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use tempfile::TempDir;

pub const PROJECT: &str = "ios/App.xcodeproj";

pub const PBXPROJ: &str = "\
// !$*UTF8*$!
{
\tobjects = {
\t\tA1 /* Debug */ = {
\t\t\tbuildSettings = {
\t\t\t\tAPP_SHORT_VERSION = 1.2.3;
\t\t\t\tPRODUCT_NAME = App;
\t\t\t};
\t\t};
\t\tA2 /* Release */ = {
\t\t\tbuildSettings = {
\t\t\t\tAPP_SHORT_VERSION = 1.2.3;
\t\t\t};
\t\t};
\t};
}
";

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
pub fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Whether `git` is available; end-to-end tests are skipped without it.
pub fn has_git() -> bool {
    which::which("git").is_ok()
}

/// A temporary repository on branch `main` with one commit holding
/// [`PROJECT`].
pub struct Repo {
    dir: TempDir,
    logs: TempDir,
}

impl Repo {
    pub fn new() -> Self {
        Self::with_pbxproj(PBXPROJ)
    }

    pub fn with_pbxproj(contents: &str) -> Self {
        let repo = Self {
            dir: TempDir::new().unwrap(),
            logs: TempDir::new().unwrap(),
        };
        repo.git(&["init", "-q"]);
        repo.git(&["checkout", "-q", "-b", "main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);

        fs::create_dir_all(repo.path().join(PROJECT)).unwrap();
        fs::write(repo.pbxproj(), contents).unwrap();
        fs::write(repo.path().join("README.md"), "# App\n").unwrap();
        repo.git(&["add", "-A"]);
        repo.git(&["commit", "-q", "-m", "initial"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn pbxproj(&self) -> PathBuf {
        self.path().join(PROJECT).join("project.pbxproj")
    }

    pub fn backup(&self) -> PathBuf {
        self.path().join(PROJECT).join("project.pbxproj.bak")
    }

    pub fn read_pbxproj(&self) -> String {
        fs::read_to_string(self.pbxproj()).unwrap()
    }

    /// Run git in the repository and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn current_branch(&self) -> String {
        self.git(&["symbolic-ref", "HEAD"])
            .trim_start_matches("refs/heads/")
            .to_string()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// The binary, started in the repository, with logs kept out of it.
    pub fn cmd(&self) -> Command {
        let mut cmd = cmd();
        cmd.current_dir(self.path())
            .env("VERBUMP_LOG_DIR", self.logs.path())
            .env_remove("RUST_LOG");
        cmd
    }
}
